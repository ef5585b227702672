// libs/shared/athena/src/client.rs
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

use crate::error::{upstream_detail, GatewayError};
use crate::token::{AccessToken, TokenManager};

/// Form fields or query parameters for an Athena call.
pub type Params<'a> = [(&'a str, String)];

/// Which responses mean "the token was rejected" and how many times to
/// re-authenticate and resend before giving up with `GatewayError::Auth`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    reauth_statuses: Vec<StatusCode>,
    max_reauth_retries: u32,
}

impl RetryPolicy {
    pub fn new(reauth_statuses: Vec<StatusCode>, max_reauth_retries: u32) -> Self {
        Self {
            reauth_statuses,
            max_reauth_retries,
        }
    }

    fn should_reauthenticate(&self, status: StatusCode) -> bool {
        self.reauth_statuses.contains(&status)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(vec![StatusCode::UNAUTHORIZED], 1)
    }
}

/// Authenticated client for the Athena practice API.
pub struct AthenaClient {
    http: Client,
    base_url: String,
    practice_id: String,
    department_id: String,
    environment: String,
    timeout: Duration,
    tokens: Arc<TokenManager>,
    retry: RetryPolicy,
}

impl AthenaClient {
    pub fn new(config: &AppConfig) -> Self {
        let http = Client::new();
        let tokens = Arc::new(TokenManager::with_client(http.clone(), config));
        Self::from_parts(http, tokens, config)
    }

    fn from_parts(http: Client, tokens: Arc<TokenManager>, config: &AppConfig) -> Self {
        Self {
            http,
            base_url: config.athena_base_url.clone(),
            practice_id: config.athena_practice_id.clone(),
            department_id: config.athena_department_id.clone(),
            environment: config.athena_environment.clone(),
            timeout: config.athena_request_timeout,
            tokens,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn practice_id(&self) -> &str {
        &self.practice_id
    }

    pub fn department_id(&self) -> &str {
        &self.department_id
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// `/v1/{practiceId}/{path}`
    pub fn practice_endpoint(&self, path: &str) -> String {
        format!("/v1/{}/{}", self.practice_id, path.trim_start_matches('/'))
    }

    /// Forces a token acquisition so connectivity checks surface
    /// credential problems directly.
    pub async fn verify_credentials(&self) -> Result<(), GatewayError> {
        self.tokens.get_token().await.map(|_| ())
    }

    pub async fn get(&self, endpoint: &str, query: &Params<'_>) -> Result<Value, GatewayError> {
        self.request(Method::GET, endpoint, None, query).await
    }

    pub async fn post_form(&self, endpoint: &str, fields: &Params<'_>) -> Result<Value, GatewayError> {
        self.request(Method::POST, endpoint, Some(fields), &[]).await
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Params<'_>>,
        query: &Params<'_>,
    ) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut reauth_attempts = 0;

        loop {
            let token = self.tokens.get_token().await?;

            debug!("Making Athena API request: {} {}", method, endpoint);

            let response = self
                .build(&method, &url, &token, body, query)
                .send()
                .await
                .map_err(|e| {
                    error!("Athena API request failed ({} {}): {}", method, endpoint, e);
                    GatewayError::from_transport(endpoint, e)
                })?;

            let status = response.status();

            if self.retry.should_reauthenticate(status) {
                if reauth_attempts < self.retry.max_reauth_retries {
                    reauth_attempts += 1;
                    warn!(
                        "Athena rejected token with {} ({} {}), retrying with new token",
                        status, method, endpoint
                    );
                    self.tokens.invalidate_token(&token).await;
                    continue;
                }

                let text = response.text().await.unwrap_or_default();
                error!(
                    "Athena still rejecting credentials after refresh ({} {}): {}",
                    method, endpoint, status
                );
                return Err(GatewayError::Auth {
                    message: format!(
                        "HTTP {} after token refresh: {}",
                        status.as_u16(),
                        upstream_detail(&text)
                    ),
                });
            }

            let text = response
                .text()
                .await
                .map_err(|e| GatewayError::from_transport(endpoint, e))?;

            if !status.is_success() {
                let detail = upstream_detail(&text);
                error!(
                    "Athena API error ({} {}): {} - {}",
                    method, endpoint, status, detail
                );
                return Err(GatewayError::upstream(Some(status.as_u16()), detail));
            }

            if text.trim().is_empty() {
                return Ok(Value::Null);
            }

            return serde_json::from_str(&text).map_err(|e| {
                error!("Unparseable Athena response ({} {}): {}", method, endpoint, e);
                GatewayError::upstream(
                    Some(status.as_u16()),
                    format!("Failed to parse response: {}", e),
                )
            });
        }
    }

    fn build(
        &self,
        method: &Method,
        url: &str,
        token: &AccessToken,
        body: Option<&Params<'_>>,
        query: &Params<'_>,
    ) -> RequestBuilder {
        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token.secret())
            .timeout(self.timeout);

        if !query.is_empty() {
            request = request.query(query);
        }

        // Athena takes form-encoded bodies on writes.
        if let Some(fields) = body {
            if *method == Method::POST || *method == Method::PUT {
                request = request.form(fields);
            }
        }

        request
    }
}

/// Reads an Athena identifier that may arrive as a JSON string or number.
pub fn id_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_field_accepts_string_and_number() {
        let value = json!({ "patientid": "1234", "appointmentid": 987, "blank": " " });
        assert_eq!(id_field(&value, "patientid").as_deref(), Some("1234"));
        assert_eq!(id_field(&value, "appointmentid").as_deref(), Some("987"));
        assert_eq!(id_field(&value, "blank"), None);
        assert_eq!(id_field(&value, "missing"), None);
    }

    #[test]
    fn test_default_policy_only_reauthenticates_on_401() {
        let policy = RetryPolicy::default();
        assert!(policy.should_reauthenticate(StatusCode::UNAUTHORIZED));
        assert!(!policy.should_reauthenticate(StatusCode::FORBIDDEN));
        assert!(!policy.should_reauthenticate(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
