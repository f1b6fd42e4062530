// Tomorrow.io forecast client
//
// Only the timelines endpoint is used: a handful of hourly intervals with
// weather code and wind gust, enough to veto self-powering in bad weather.

pub mod client;
pub mod models;

pub use client::TomorrowClient;
pub use models::{ForecastInterval, Location, WeatherCode};
