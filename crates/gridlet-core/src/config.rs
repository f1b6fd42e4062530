// ── Runtime engine configuration ──
//
// Everything one run needs: endpoints, credentials, and tuning. Never touches
// disk. The binary builds an `EngineConfig` from its layered settings and
// hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use gridlet_api::{DEFAULT_TIMEOUT, EnlightenClient, Location, TomorrowClient};

/// Enlighten portal endpoint and login.
#[derive(Debug, Clone)]
pub struct EnlightenConfig {
    /// Portal base URL (e.g., `https://enlighten.enphaseenergy.com`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
}

impl EnlightenConfig {
    /// Default portal URL.
    pub fn default_url() -> Url {
        default_url(EnlightenClient::DEFAULT_BASE_URL)
    }
}

/// Forecast provider endpoint, key, and location.
///
/// Absent from [`EngineConfig`] when no API key is configured, in which case
/// the policy runs on time of day alone.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub url: Url,
    pub api_key: SecretString,
    pub location: Location,
}

impl ForecastConfig {
    /// Default forecast provider URL.
    pub fn default_url() -> Url {
        default_url(TomorrowClient::DEFAULT_BASE_URL)
    }
}

/// Configuration for a single engine run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Decide and log, but never write the battery mode.
    pub dry_run: bool,
    pub enlighten: EnlightenConfig,
    pub forecast: Option<ForecastConfig>,
    /// Zone whose wall clock drives the policy. `None` uses the host's local zone.
    pub timezone: Option<chrono_tz::Tz>,
    /// Upper bound on each remote call.
    pub timeout: Duration,
}

impl EngineConfig {
    /// Config with defaults for everything but the Enlighten login.
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            dry_run: false,
            enlighten: EnlightenConfig {
                url: EnlightenConfig::default_url(),
                username: username.into(),
                password,
            },
            forecast: None,
            timezone: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn default_url(raw: &str) -> Url {
    Url::parse(raw).expect("built-in base URL is valid")
}
