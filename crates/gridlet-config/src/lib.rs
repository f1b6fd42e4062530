//! Layered configuration for gridlet.
//!
//! Every option is optional in a [`PartialConfig`]. Layers are stacked
//! defaults → TOML file → `GRIDLET_*` environment → command line, and a layer
//! that leaves an option unset never erases what an earlier layer provided.
//! [`PartialConfig::into_engine_config`] validates the result and produces the
//! `gridlet_core::EngineConfig` a run consumes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Value},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use gridlet_core::{EngineConfig, EnlightenConfig, ForecastConfig, Location};

/// Prefix of every environment variable read by [`load`].
pub const ENV_PREFIX: &str = "GRIDLET_";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{field}'")]
    MissingField { field: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Partial config ──────────────────────────────────────────────────

/// One configuration layer. `None` means "not specified here".
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PartialConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,

    /// Silence all logging regardless of verbosity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enphase_user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enphase_password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enphase_url_base: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tomorrow_api_key: Option<String>,

    /// `lat,lng`, e.g. `29.935,-90.109`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tomorrow_location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tomorrow_url_base: Option<String>,

    /// IANA zone name, e.g. `America/Chicago`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for PartialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: Option<&String>) -> Option<&'static str> {
            value.map(|_| "[REDACTED]")
        }

        f.debug_struct("PartialConfig")
            .field("dry_run", &self.dry_run)
            .field("quiet", &self.quiet)
            .field("verbosity", &self.verbosity)
            .field("enphase_user", &self.enphase_user)
            .field("enphase_password", &redact(self.enphase_password.as_ref()))
            .field("enphase_url_base", &self.enphase_url_base)
            .field("tomorrow_api_key", &redact(self.tomorrow_api_key.as_ref()))
            .field("tomorrow_location", &self.tomorrow_location)
            .field("tomorrow_url_base", &self.tomorrow_url_base)
            .field("timezone", &self.timezone)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl PartialConfig {
    /// Built-in defaults, the bottom layer.
    pub fn defaults() -> Self {
        Self {
            dry_run: Some(false),
            quiet: Some(false),
            verbosity: Some(0),
            enphase_url_base: Some(EnlightenConfig::default_url().to_string()),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            ..Self::default()
        }
    }

    /// Stack `upper` on top of `self`: set fields in `upper` win, unset
    /// fields fall through.
    #[must_use]
    pub fn overlay(self, upper: Self) -> Self {
        Self {
            dry_run: upper.dry_run.or(self.dry_run),
            quiet: upper.quiet.or(self.quiet),
            verbosity: upper.verbosity.or(self.verbosity),
            enphase_user: upper.enphase_user.or(self.enphase_user),
            enphase_password: upper.enphase_password.or(self.enphase_password),
            enphase_url_base: upper.enphase_url_base.or(self.enphase_url_base),
            tomorrow_api_key: upper.tomorrow_api_key.or(self.tomorrow_api_key),
            tomorrow_location: upper.tomorrow_location.or(self.tomorrow_location),
            tomorrow_url_base: upper.tomorrow_url_base.or(self.tomorrow_url_base),
            timezone: upper.timezone.or(self.timezone),
            timeout_secs: upper.timeout_secs.or(self.timeout_secs),
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet.unwrap_or(false)
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity.unwrap_or(0)
    }

    /// Validate and translate into the engine's runtime configuration.
    pub fn into_engine_config(self) -> Result<EngineConfig, ConfigError> {
        let username = self
            .enphase_user
            .ok_or(ConfigError::MissingField { field: "enphase_user" })?;
        let password = self
            .enphase_password
            .ok_or(ConfigError::MissingField { field: "enphase_password" })?;

        let mut config = EngineConfig::new(username, SecretString::from(password));
        config.dry_run = self.dry_run.unwrap_or(false);

        if let Some(raw) = self.enphase_url_base {
            config.enlighten.url = parse_url("enphase_url_base", &raw)?;
        }

        if let Some(secs) = self.timeout_secs {
            if secs == 0 {
                return Err(ConfigError::Validation {
                    field: "timeout_secs".into(),
                    reason: "must be greater than zero".into(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }

        config.timezone = self
            .timezone
            .map(|raw| {
                raw.parse::<chrono_tz::Tz>()
                    .map_err(|e| ConfigError::Validation {
                        field: "timezone".into(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        // Forecasting needs both a key and a location; either alone is ignored.
        if let (Some(api_key), Some(location)) = (self.tomorrow_api_key, self.tomorrow_location) {
            let location = location
                .parse::<Location>()
                .map_err(|e| ConfigError::Validation {
                    field: "tomorrow_location".into(),
                    reason: e.to_string(),
                })?;
            let url = match self.tomorrow_url_base {
                Some(raw) => parse_url("tomorrow_url_base", &raw)?,
                None => ForecastConfig::default_url(),
            };
            config.forecast = Some(ForecastConfig {
                url,
                api_key: SecretString::from(api_key),
                location,
            });
        }

        Ok(config)
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse::<Url>().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Fold layers left to right with [`PartialConfig::overlay`].
///
/// `merge([])` is the empty config.
pub fn merge<I>(configs: I) -> PartialConfig
where
    I: IntoIterator<Item = PartialConfig>,
{
    configs
        .into_iter()
        .fold(PartialConfig::default(), PartialConfig::overlay)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "gridlet", "gridlet").map_or_else(
        || PathBuf::from(".gridlet.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Free-text settings. Figment types env values, so `0123` would arrive as
/// the number 123; these keys are read verbatim instead.
const TEXT_KEYS: [&str; 7] = [
    "enphase_user",
    "enphase_password",
    "enphase_url_base",
    "tomorrow_api_key",
    "tomorrow_location",
    "tomorrow_url_base",
    "timezone",
];

/// Environment provider for the typed `GRIDLET_*` settings.
///
/// `GRIDLET_LOG_LEVEL` and `GRIDLET_LOG_QUIET` are accepted as aliases for
/// `GRIDLET_VERBOSITY` and `GRIDLET_QUIET`.
pub fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).ignore(&TEXT_KEYS).map(|key| {
        if key == "log_level" {
            "verbosity".into()
        } else if key == "log_quiet" {
            "quiet".into()
        } else {
            key.into()
        }
    })
}

/// The free-text `GRIDLET_*` settings, exactly as they appear in the
/// environment.
pub fn env_text_provider() -> Serialized<Dict> {
    let text: Dict = Env::prefixed(ENV_PREFIX)
        .only(&TEXT_KEYS)
        .iter()
        .map(|(key, value)| (key.as_str().to_owned(), Value::from(value)))
        .collect();
    Serialized::defaults(text)
}

/// Resolve the effective configuration.
///
/// `path` overrides the default file location and must exist; the default
/// file is optional.
pub fn load(cli: PartialConfig, path: Option<&Path>) -> Result<PartialConfig, ConfigError> {
    let path = match path {
        Some(path) if !path.exists() => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Some(path) => path.to_path_buf(),
        None => config_path(),
    };

    let figment = Figment::new()
        .merge(Serialized::defaults(PartialConfig::defaults()))
        .merge(Toml::file(&path))
        .merge(env_provider())
        .merge(env_text_provider());

    let sourced: PartialConfig = figment.extract()?;
    Ok(merge([sourced, cli]))
}
