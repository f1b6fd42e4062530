//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use gridlet_config::ConfigError;
use gridlet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(gridlet::connection_failed),
        help("Check network access. Reason: {reason}")
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(gridlet::timeout),
        help("Increase the timeout with --timeout or GRIDLET_TIMEOUT_SECS.")
    )]
    Timeout { seconds: u64 },

    #[error("Interrupted before the run completed")]
    #[diagnostic(code(gridlet::cancelled))]
    Cancelled,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Enlighten login failed: {message}")]
    #[diagnostic(
        code(gridlet::auth_failed),
        help(
            "Verify the Enphase credentials passed with --enphase-user / \
             --enphase-password or GRIDLET_ENPHASE_USER / GRIDLET_ENPHASE_PASSWORD."
        )
    )]
    AuthFailed { message: String },

    // ── Remote ───────────────────────────────────────────────────────
    #[error("Battery mode change was not confirmed: {message}")]
    #[diagnostic(code(gridlet::rejected))]
    Rejected { message: String },

    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(gridlet::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(gridlet::unexpected_data),
        help("The remote API may have changed. Re-run with -vvvv for request details.")
    )]
    UnexpectedData { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Missing required setting '{field}'")]
    #[diagnostic(code(gridlet::missing_setting), help("Pass {flag} or set {env}."))]
    MissingSetting {
        field: String,
        flag: String,
        env: String,
    },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gridlet::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(gridlet::no_config), help("Check the path given to --config."))]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(gridlet::config))]
    Config(Box<figment::Error>),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::MissingSetting { .. }
            | Self::Validation { .. }
            | Self::NoConfig { .. }
            | Self::Config(_) => exit_code::USAGE,
            Self::Cancelled
            | Self::Rejected { .. }
            | Self::ApiError { .. }
            | Self::UnexpectedData { .. } => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingField { field } => CliError::MissingSetting {
                field: field.into(),
                flag: format!("--{}", field.replace('_', "-")),
                env: format!("{}{}", gridlet_config::ENV_PREFIX, field.to_uppercase()),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Figment(err) => CliError::Config(err),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Cancelled => CliError::Cancelled,
            CoreError::Rejected { message } => CliError::Rejected { message },
            CoreError::Api { message, status } => CliError::ApiError { message, status },
            CoreError::UnexpectedData { message } => CliError::UnexpectedData { message },
            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },
        }
    }
}
