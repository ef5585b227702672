use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub athena_base_url: String,
    pub athena_client_id: String,
    pub athena_client_secret: String,
    pub athena_practice_id: String,
    pub athena_department_id: String,
    pub athena_environment: String,
    pub athena_request_timeout: Duration,
    pub athena_token_timeout: Duration,
    pub athena_token_safety_margin: Duration,
    pub port: u16,
    pub frontend_url: Option<String>,
    pub app_env: String,
}

impl AppConfig {
    /// Loads configuration from the process environment. Credentials are
    /// required up front so a misconfigured deployment never starts serving.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let optional = |key: &'static str, default: &str| -> String {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let seconds = |key: &'static str, default: u64| -> Result<Duration, ConfigError> {
            match lookup(key) {
                Some(raw) if !raw.trim().is_empty() => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| ConfigError::Invalid {
                        var: key,
                        reason: e.to_string(),
                    }),
                _ => Ok(Duration::from_secs(default)),
            }
        };

        let port = match lookup("PORT") {
            Some(raw) if !raw.trim().is_empty() => {
                raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                    var: "PORT",
                    reason: e.to_string(),
                })?
            }
            _ => 3001,
        };

        let frontend_url = lookup("FRONTEND_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        if frontend_url.is_none() {
            warn!("FRONTEND_URL not set, CORS will allow any origin");
        }

        let config = Self {
            athena_base_url: required("ATHENA_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            athena_client_id: required("ATHENA_CLIENT_ID")?,
            athena_client_secret: required("ATHENA_CLIENT_SECRET")?,
            athena_practice_id: required("ATHENA_PRACTICE_ID")?,
            athena_department_id: optional("ATHENA_DEPARTMENT_ID", "1"),
            athena_environment: optional("ATHENA_ENVIRONMENT", "preview1"),
            athena_request_timeout: seconds("ATHENA_REQUEST_TIMEOUT_SECS", 15)?,
            athena_token_timeout: seconds("ATHENA_TOKEN_TIMEOUT_SECS", 10)?,
            athena_token_safety_margin: seconds("ATHENA_TOKEN_SAFETY_MARGIN_SECS", 60)?,
            port,
            frontend_url,
            app_env: optional("APP_ENV", "development"),
        };

        info!(
            practice_id = %config.athena_practice_id,
            environment = %config.athena_environment,
            "Athena configuration loaded"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("ATHENA_BASE_URL", "https://api.preview.platform.athenahealth.com/"),
            ("ATHENA_CLIENT_ID", "client"),
            ("ATHENA_CLIENT_SECRET", "secret"),
            ("ATHENA_PRACTICE_ID", "195900"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&full_env()).unwrap();

        assert_eq!(config.athena_base_url, "https://api.preview.platform.athenahealth.com");
        assert_eq!(config.athena_department_id, "1");
        assert_eq!(config.athena_environment, "preview1");
        assert_eq!(config.athena_request_timeout, Duration::from_secs(15));
        assert_eq!(config.athena_token_timeout, Duration::from_secs(10));
        assert_eq!(config.athena_token_safety_margin, Duration::from_secs(60));
        assert_eq!(config.port, 3001);
        assert!(config.frontend_url.is_none());
    }

    #[test]
    fn test_each_credential_is_required() {
        for key in [
            "ATHENA_BASE_URL",
            "ATHENA_CLIENT_ID",
            "ATHENA_CLIENT_SECRET",
            "ATHENA_PRACTICE_ID",
        ] {
            let mut vars = full_env();
            vars.remove(key);
            assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing(key));
        }
    }

    #[test]
    fn test_blank_credential_counts_as_missing() {
        let mut vars = full_env();
        vars.insert("ATHENA_CLIENT_SECRET", "   ");
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("ATHENA_CLIENT_SECRET")
        );
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let mut vars = full_env();
        vars.insert("ATHENA_REQUEST_TIMEOUT_SECS", "soon");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var: "ATHENA_REQUEST_TIMEOUT_SECS", .. })
        ));
    }
}
