// gridlet-api: Async clients for the Enphase Enlighten portal and Tomorrow.io

pub mod cookies;
pub mod enlighten;
pub mod error;
pub mod form;
pub mod tomorrow;
pub mod transport;

pub use cookies::{CookieJar, split_set_cookie_header};
pub use enlighten::{
    BatteryConfig, BatteryMode, BatteryUsage, EnlightenClient, SESSION_COOKIE, Session,
};
pub use error::Error;
pub use form::scrape_form_fields;
pub use tomorrow::{ForecastInterval, Location, TomorrowClient, WeatherCode};
pub use transport::{CallScope, DEFAULT_TIMEOUT, TransportConfig};
