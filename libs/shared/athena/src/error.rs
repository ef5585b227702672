use thiserror::Error;

/// Failures raised at the Athena boundary. Cloneable so a single token
/// acquisition can hand the same failure to every waiting caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Athena authentication failed: {message}")]
    Auth { message: String },

    #[error("Athena API error ({}): {detail}", status_label(.status))]
    Upstream { status: Option<u16>, detail: String },

    /// The request may or may not have been applied upstream.
    #[error("Athena request to {endpoint} timed out; completion state unknown")]
    UpstreamTimeout { endpoint: String },
}

impl GatewayError {
    pub fn upstream(status: Option<u16>, detail: impl Into<String>) -> Self {
        GatewayError::Upstream {
            status,
            detail: detail.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, GatewayError::Auth { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::UpstreamTimeout { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    pub(crate) fn from_transport(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::UpstreamTimeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            GatewayError::Upstream {
                status: err.status().map(|s| s.as_u16()),
                detail: err.to_string(),
            }
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "transport".to_string(),
    }
}

/// Pulls the most useful message out of an Athena error body, which is
/// usually JSON with `error` or `error_description`, sometimes plain text.
pub(crate) fn upstream_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("error_description")
            .or_else(|| value.get("error"))
            .or_else(|| value.get("detailedmessage"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_prefers_error_description() {
        let body = r#"{"error":"invalid_client","error_description":"Client authentication failed"}"#;
        assert_eq!(upstream_detail(body), "Client authentication failed");
    }

    #[test]
    fn test_detail_falls_back_to_raw_text() {
        assert_eq!(upstream_detail("Service Unavailable\n"), "Service Unavailable");
    }

    #[test]
    fn test_upstream_display_without_status() {
        let err = GatewayError::upstream(None, "connection refused");
        assert_eq!(err.to_string(), "Athena API error (transport): connection refused");
    }
}
