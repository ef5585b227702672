// libs/shared/athena/src/token.rs
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(not(test))]
use std::time::Instant;
#[cfg(test)]
use mock_instant::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::error::{upstream_detail, GatewayError};

const TOKEN_PATH: &str = "/oauth2/v1/token";
const TOKEN_SCOPE: &str = "athena/service/Athenahealth.MDP.*";

/// Bearer credential for the Athena API. The secret never leaves this crate.
#[derive(Clone)]
pub struct AccessToken {
    value: Arc<str>,
    refresh_at: Instant,
}

impl AccessToken {
    pub(crate) fn secret(&self) -> &str {
        &self.value
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.refresh_at
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for AccessToken {}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("refresh_at", &self.refresh_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(deserialize_with = "seconds_from_number_or_string")]
    expires_in: u64,
}

// Athena has returned `expires_in` both as a number and as a quoted string.
fn seconds_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(seconds) => Ok(seconds),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Everything needed to run one client-credentials exchange, shareable with
/// the `'static` acquisition future.
struct TokenEndpoint {
    http: Client,
    url: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
    safety_margin: Duration,
}

impl TokenEndpoint {
    async fn acquire(&self) -> Result<AccessToken, GatewayError> {
        info!("Requesting new Athena access token");

        let response = self
            .http
            .post(&self.url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", TOKEN_SCOPE),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                error!("Athena token request failed: {}", e);
                GatewayError::Auth {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| GatewayError::Auth {
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let detail = upstream_detail(&body);
            error!("Athena token endpoint returned {}: {}", status, detail);
            return Err(GatewayError::Auth {
                message: format!("HTTP {}: {}", status.as_u16(), detail),
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| GatewayError::Auth {
            message: format!("Failed to parse token response: {}", e),
        })?;

        let lifetime = Duration::from_secs(parsed.expires_in).saturating_sub(self.safety_margin);

        info!(
            "Athena access token obtained, refreshing in {}s",
            lifetime.as_secs()
        );

        Ok(AccessToken {
            value: Arc::from(parsed.access_token),
            refresh_at: Instant::now() + lifetime,
        })
    }
}

type TokenFlight = Shared<BoxFuture<'static, Result<AccessToken, GatewayError>>>;

enum TokenState {
    Empty,
    Valid(AccessToken),
    Acquiring { generation: u64, flight: TokenFlight },
}

struct TokenCache {
    state: TokenState,
    generation: u64,
}

/// Owns the Athena access token.
///
/// Cache states move `Empty -> Acquiring -> Valid -> (stale) -> Acquiring`,
/// or back to `Empty` on invalidation or a failed acquisition. Every
/// check-then-refresh decision happens under one async mutex, and an
/// in-flight acquisition is a shared future, so concurrent callers that find
/// no fresh token all await the same single network exchange.
pub struct TokenManager {
    endpoint: Arc<TokenEndpoint>,
    cache: Mutex<TokenCache>,
}

impl TokenManager {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: &AppConfig) -> Self {
        Self {
            endpoint: Arc::new(TokenEndpoint {
                http,
                url: format!("{}{}", config.athena_base_url, TOKEN_PATH),
                client_id: config.athena_client_id.clone(),
                client_secret: config.athena_client_secret.clone(),
                timeout: config.athena_token_timeout,
                safety_margin: config.athena_token_safety_margin,
            }),
            cache: Mutex::new(TokenCache {
                state: TokenState::Empty,
                generation: 0,
            }),
        }
    }

    pub async fn get_token(&self) -> Result<AccessToken, GatewayError> {
        let (generation, flight) = {
            let mut cache = self.cache.lock().await;

            // A finished flight whose awaiters all went away was never settled.
            let unsettled = match &cache.state {
                TokenState::Acquiring { flight, .. } => match flight.peek() {
                    Some(Ok(token)) => Some(TokenState::Valid(token.clone())),
                    Some(Err(_)) => Some(TokenState::Empty),
                    None => None,
                },
                _ => None,
            };
            if let Some(state) = unsettled {
                cache.state = state;
            }

            if let TokenState::Valid(token) = &cache.state {
                if token.is_fresh(Instant::now()) {
                    return Ok(token.clone());
                }
                debug!("Cached Athena token reached its refresh point");
            }

            if let TokenState::Acquiring { generation, flight } = &cache.state {
                debug!("Joining in-flight Athena token acquisition");
                (*generation, flight.clone())
            } else {
                cache.generation += 1;
                let generation = cache.generation;
                let endpoint = Arc::clone(&self.endpoint);
                let flight = async move { endpoint.acquire().await }.boxed().shared();
                cache.state = TokenState::Acquiring {
                    generation,
                    flight: flight.clone(),
                };
                (generation, flight)
            }
        };

        let result = flight.await;

        let mut cache = self.cache.lock().await;
        let settles_this_flight = matches!(
            &cache.state,
            TokenState::Acquiring { generation: current, .. } if *current == generation
        );
        if settles_this_flight {
            cache.state = match &result {
                Ok(token) => TokenState::Valid(token.clone()),
                Err(_) => TokenState::Empty,
            };
        }

        result
    }

    /// Drops the cached token so the next `get_token` acquires a new one.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        if let TokenState::Valid(_) = cache.state {
            debug!("Invalidating cached Athena token");
            cache.state = TokenState::Empty;
        }
    }

    /// Like `invalidate`, but only if `rejected` is still the cached token.
    pub async fn invalidate_token(&self, rejected: &AccessToken) {
        let mut cache = self.cache.lock().await;
        if let TokenState::Valid(current) = &cache.state {
            if current == rejected {
                debug!("Invalidating rejected Athena token");
                cache.state = TokenState::Empty;
            }
        }
    }
}
