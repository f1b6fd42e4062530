//! Decision logic and run orchestration for gridlet.
//!
//! - **[`next_state`]**: pure policy mapping the local time and an optional
//!   weather forecast to the [`State`] the battery should be in.
//! - **[`state_from_battery_config`]**: inverse mapping from what the portal
//!   reports back to a [`State`].
//! - **[`Engine`]**: one decision-and-act run. Logs in, reads the current
//!   battery mode, fetches the forecast when configured, and writes the new
//!   mode only if the state changes.
//!
//! The engine never reads configuration on its own: callers build an
//! [`EngineConfig`] and hand it in.

pub mod config;
pub mod engine;
pub mod error;
pub mod state;

pub use config::{EnlightenConfig, EngineConfig, ForecastConfig};
pub use engine::{Engine, Outcome};
pub use error::CoreError;
pub use state::{State, is_severe, next_state, state_from_battery_config};

// Re-export the API types that appear in this crate's public surface.
pub use gridlet_api::{BatteryConfig, BatteryMode, BatteryUsage, ForecastInterval, Location, WeatherCode};
