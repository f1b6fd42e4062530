use serde::de::DeserializeOwned;
use thiserror::Error;

/// Top-level error type for the `gridlet-api` crate.
///
/// Covers transport and protocol failures against both the Enlighten portal
/// and the forecast provider. A rejected login is *not* an error: the
/// authenticator reports it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request did not complete within its call scope.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Request was aborted through its cancellation token.
    #[error("Request cancelled")]
    Cancelled,

    /// Failed to build the HTTP client.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    // ── Protocol ────────────────────────────────────────────────────
    /// Unexpected HTTP status from an endpoint, with the raw body.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The portal accepted the request but did not confirm the update.
    #[error("Battery config update rejected: {message}")]
    Rejected { message: String },

    /// A cookie required by an endpoint is not in the session.
    #[error("Session is missing the '{name}' cookie")]
    MissingCookie { name: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Battery usage string outside the known set.
    #[error("Unexpected battery usage '{value}'")]
    UnexpectedUsage { value: String },

    /// Weather code outside the provider's published set.
    #[error("Unexpected weather code value {value}")]
    UnknownWeatherCode { value: i64 },

    /// Value rejected before being sent.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },
}

/// Decode a JSON body, keeping the raw text on failure.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}
