// ── Core error types ──
//
// Errors a run can end with. Callers map these to exit codes; the
// `From<gridlet_api::Error>` impl folds transport detail into a handful of
// domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Run cancelled")]
    Cancelled,

    // ── Remote errors ────────────────────────────────────────────────
    #[error("Battery mode change rejected: {message}")]
    Rejected { message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Unexpected data from remote: {message}")]
    UnexpectedData { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<gridlet_api::Error> for CoreError {
    fn from(err: gridlet_api::Error) -> Self {
        match err {
            // Deadlines are enforced by `CallScope` and arrive as `Error::Timeout`.
            gridlet_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            gridlet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            gridlet_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            gridlet_api::Error::Cancelled => CoreError::Cancelled,
            gridlet_api::Error::ClientSetup(message) => CoreError::Config { message },
            gridlet_api::Error::Http {
                endpoint,
                status,
                body,
            } => CoreError::Api {
                message: format!("{endpoint}: {body}"),
                status: Some(status),
            },
            gridlet_api::Error::Rejected { message } => CoreError::Rejected { message },
            gridlet_api::Error::MissingCookie { name } => CoreError::AuthenticationFailed {
                message: format!("session has no '{name}' cookie"),
            },
            gridlet_api::Error::Deserialization { message, body: _ } => {
                CoreError::UnexpectedData { message }
            }
            e @ (gridlet_api::Error::UnexpectedUsage { .. }
            | gridlet_api::Error::UnknownWeatherCode { .. }) => CoreError::UnexpectedData {
                message: e.to_string(),
            },
            e @ gridlet_api::Error::Validation { .. } => CoreError::Config {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_http_status() {
        let err = CoreError::from(gridlet_api::Error::Http {
            endpoint: "battery_config".into(),
            status: 503,
            body: "down".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(503), .. }));
    }

    #[test]
    fn maps_unknown_weather_code() {
        let err = CoreError::from(gridlet_api::Error::UnknownWeatherCode { value: 42 });
        assert!(matches!(err, CoreError::UnexpectedData { ref message } if message.contains("42")));
    }

    #[test]
    fn maps_cancellation() {
        assert!(matches!(
            CoreError::from(gridlet_api::Error::Cancelled),
            CoreError::Cancelled
        ));
    }
}
