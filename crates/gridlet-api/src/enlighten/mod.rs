// Enphase Enlighten portal client
//
// The portal has no token API. `auth` scrapes and resubmits the login form
// to obtain a cookie session; `battery` reads and writes the battery
// operating mode through that session.

pub mod auth;
pub mod battery;
pub mod client;
pub mod models;

pub use client::EnlightenClient;
pub use models::{BatteryConfig, BatteryMode, BatteryUsage, SESSION_COOKIE, Session};
