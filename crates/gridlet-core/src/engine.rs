// ── Run orchestration ──
//
// One pass of: log in, read the battery mode, fetch the forecast (when
// configured), decide, and write the new mode if it differs. Every remote
// call runs inside a `CallScope` carrying the configured timeout and the
// engine's cancellation token.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gridlet_api::{CallScope, EnlightenClient, ForecastInterval, TomorrowClient, TransportConfig};

use crate::config::{EngineConfig, ForecastConfig};
use crate::error::CoreError;
use crate::state::{State, next_state, state_from_battery_config};

/// Fields requested from the forecast provider.
const FORECAST_FIELDS: [&str; 3] = ["temperature", "weatherCode", "windGust"];

/// Hourly forecast covering the next four hours, in metric units.
const FORECAST_PARAMS: [(&str, &str); 4] = [
    ("timesteps", "1h"),
    ("startTime", "now"),
    ("endTime", "nowPlus4h"),
    ("units", "metric"),
];

/// What a run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The battery was already in the target state.
    Unchanged(State),
    /// The battery mode was written.
    Applied { from: State, to: State },
    /// A change was due but the run was a dry run.
    DryRun { from: State, to: State },
}

impl Outcome {
    /// State the battery should be in after this run.
    pub fn target(&self) -> State {
        match *self {
            Self::Unchanged(state) => state,
            Self::Applied { to, .. } | Self::DryRun { to, .. } => to,
        }
    }
}

/// Executes a single decision-and-act run.
pub struct Engine {
    config: EngineConfig,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight calls when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run against the current time in the configured zone, or the host's
    /// local zone when none is set.
    pub async fn run(&self) -> Result<Outcome, CoreError> {
        match self.config.timezone {
            Some(tz) => self.run_at(&Utc::now().with_timezone(&tz)).await,
            None => self.run_at(&Local::now()).await,
        }
    }

    /// Run as if the local time were `now`.
    pub async fn run_at<Tz>(&self, now: &DateTime<Tz>) -> Result<Outcome, CoreError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let transport = TransportConfig {
            timeout: self.config.timeout,
            ..TransportConfig::default()
        };
        let scope = transport.scope().with_cancellation(self.cancel.clone());

        let enlighten = &self.config.enlighten;
        let portal = EnlightenClient::new(enlighten.url.clone(), &transport)?;

        debug!(url = %enlighten.url, username = %enlighten.username, "logging in");
        let session = portal
            .login(&enlighten.username, &enlighten.password, &scope)
            .await?
            .ok_or_else(|| CoreError::AuthenticationFailed {
                message: format!("Enlighten rejected the login for {}", enlighten.username),
            })?;
        info!(site_id = %session.site_id(), "logged in");

        let battery = portal.get_battery_config(&session, &scope).await?;
        let current = state_from_battery_config(&battery);
        debug!(
            usage = %battery.usage,
            backup_percentage = ?battery.backup_percentage,
            %current,
            "read battery config"
        );

        let forecast = match &self.config.forecast {
            Some(forecast) => Some(fetch_forecast(forecast, &transport, &scope).await?),
            None => {
                debug!("no forecast API key configured; deciding on time of day alone");
                None
            }
        };

        let target = next_state(now, forecast.as_deref());
        info!(%now, %current, %target, "computed next state");

        if current == target {
            info!("battery already in target state; nothing to do");
            return Ok(Outcome::Unchanged(current));
        }

        let mode = target.target_mode()?;
        if self.config.dry_run {
            warn!(%mode, "dry run; not changing battery mode");
            return Ok(Outcome::DryRun {
                from: current,
                to: target,
            });
        }

        info!(%mode, "setting battery mode");
        portal.set_battery_mode(&session, &mode, &scope).await?;

        Ok(Outcome::Applied {
            from: current,
            to: target,
        })
    }
}

async fn fetch_forecast(
    config: &ForecastConfig,
    transport: &TransportConfig,
    scope: &CallScope,
) -> Result<Vec<ForecastInterval>, CoreError> {
    let client = TomorrowClient::new(config.url.clone(), config.api_key.clone(), transport)?;
    let forecast = client
        .get_forecast(&config.location, &FORECAST_FIELDS, &FORECAST_PARAMS, scope)
        .await?;
    debug!(intervals = forecast.len(), location = %config.location, "fetched forecast");
    Ok(forecast)
}
