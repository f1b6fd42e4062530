// Tomorrow.io domain and wire types

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use strum::{Display, EnumIter};

use crate::error::Error;

// ── Weather codes ───────────────────────────────────────────────────

/// Weather codes published at
/// <https://docs.tomorrow.io/reference/data-layers-weather-codes>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherCode {
    Unknown,
    ClearSunny,
    MostlyClear,
    PartlyCloudy,
    MostlyCloudy,
    Cloudy,
    Fog,
    LightFog,
    Drizzle,
    Rain,
    LightRain,
    HeavyRain,
    Snow,
    Flurries,
    LightSnow,
    HeavySnow,
    FreezingDrizzle,
    FreezingRain,
    LightFreezingRain,
    HeavyFreezingRain,
    IcePellets,
    HeavyIcePellets,
    LightIcePellets,
    Thunderstorm,
}

const WEATHER_CODES: [(WeatherCode, i64); 24] = [
    (WeatherCode::Unknown, 0),
    (WeatherCode::ClearSunny, 1000),
    (WeatherCode::MostlyClear, 1100),
    (WeatherCode::PartlyCloudy, 1101),
    (WeatherCode::MostlyCloudy, 1102),
    (WeatherCode::Cloudy, 1001),
    (WeatherCode::Fog, 2000),
    (WeatherCode::LightFog, 2100),
    (WeatherCode::Drizzle, 4000),
    (WeatherCode::Rain, 4001),
    (WeatherCode::LightRain, 4200),
    (WeatherCode::HeavyRain, 4201),
    (WeatherCode::Snow, 5000),
    (WeatherCode::Flurries, 5001),
    (WeatherCode::LightSnow, 5100),
    (WeatherCode::HeavySnow, 5101),
    (WeatherCode::FreezingDrizzle, 6000),
    (WeatherCode::FreezingRain, 6001),
    (WeatherCode::LightFreezingRain, 6200),
    (WeatherCode::HeavyFreezingRain, 6201),
    (WeatherCode::IcePellets, 7000),
    (WeatherCode::HeavyIcePellets, 7101),
    (WeatherCode::LightIcePellets, 7102),
    (WeatherCode::Thunderstorm, 8000),
];

impl WeatherCode {
    /// The provider's numeric value for this code.
    pub fn value(self) -> i64 {
        WEATHER_CODES
            .iter()
            .find(|(code, _)| *code == self)
            .map_or(0, |(_, value)| *value)
    }
}

impl TryFrom<i64> for WeatherCode {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        WEATHER_CODES
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(code, _)| *code)
            .ok_or(Error::UnknownWeatherCode { value })
    }
}

// ── Location ────────────────────────────────────────────────────────

/// Latitude/longitude pair, written `lat,lng`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::Validation {
            field: "location".into(),
            reason: format!("{reason} in '{s}', expected 'lat,lng'"),
        };

        let (lat, lng) = s.split_once(',').ok_or_else(|| invalid("missing comma"))?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid("bad latitude"))?;
        let lng: f64 = lng.trim().parse().map_err(|_| invalid("bad longitude"))?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(invalid("latitude out of range"));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(invalid("longitude out of range"));
        }
        Ok(Self { lat, lng })
    }
}

// ── Forecast ────────────────────────────────────────────────────────

/// One forecast interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastInterval {
    pub start_time: DateTime<Utc>,
    pub weather_code: WeatherCode,
    /// Metres per second (metric units).
    pub wind_gust: f64,
    /// Degrees Celsius, when requested.
    pub temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimelinesResponse {
    pub data: TimelinesData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimelinesData {
    #[serde(default)]
    pub timelines: Vec<RawTimeline>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTimeline {
    pub timestep: String,
    #[serde(default)]
    pub intervals: Vec<RawInterval>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawInterval {
    pub start_time: DateTime<Utc>,
    pub values: RawValues,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawValues {
    pub weather_code: i64,
    pub wind_gust: f64,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl TryFrom<RawInterval> for ForecastInterval {
    type Error = Error;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Ok(Self {
            start_time: raw.start_time,
            weather_code: WeatherCode::try_from(raw.values.weather_code)?,
            wind_gust: raw.values.wind_gust,
            temperature: raw.values.temperature,
        })
    }
}

/// Length of a timeline step such as `1m`, `1h`, `1d`; `current` is zero.
pub(crate) fn timestep_duration(timestep: &str) -> Option<Duration> {
    if timestep == "current" {
        return Some(Duration::ZERO);
    }

    let unit_at = timestep.find(|c: char| !c.is_ascii_digit())?;
    let (count, unit) = timestep.split_at(unit_at);
    let count: u64 = count.parse().ok()?;
    let secs = match unit {
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        _ => return None,
    };
    count.checked_mul(secs).map(Duration::from_secs)
}
