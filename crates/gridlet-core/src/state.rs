// ── Battery policy ──
//
// Self-power during the day, charge from the grid at night. Inside the day
// window, any severe weather or strong gusts in the forecast also force grid
// charging so the battery is full if the power goes out.

use chrono::{DateTime, TimeZone, Timelike};
use strum::Display;
use tracing::debug;

use gridlet_api::{BatteryConfig, BatteryMode, BatteryUsage, ForecastInterval, WeatherCode};

/// Start of the self-power window, seconds after local midnight (06:00).
pub const SELF_POWER_BEGIN_SECS: u32 = 6 * 3_600;

/// End of the self-power window, seconds after local midnight (20:00).
pub const SELF_POWER_END_SECS: u32 = 20 * 3_600;

/// Tolerance applied on both sides of the window so a scheduler firing a
/// few minutes early or late still lands inside it.
pub const SLOP_SECS: u32 = 10 * 60;

/// Gusts above this (m/s) force grid charging.
pub const MAX_WIND_GUST: f64 = 20.0;

/// Backup reserve written with each state.
const GRID_BACKUP_PERCENTAGE: u8 = 100;
const SELF_POWER_BACKUP_PERCENTAGE: u8 = 30;

/// Operating state of the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    ChargeFromGrid,
    SelfPower,
}

impl State {
    /// Battery mode to write to the portal for this state.
    pub fn target_mode(self) -> Result<BatteryMode, gridlet_api::Error> {
        match self {
            Self::ChargeFromGrid => BatteryMode::new(BatteryUsage::BackupOnly, GRID_BACKUP_PERCENTAGE),
            Self::SelfPower => {
                BatteryMode::new(BatteryUsage::SelfConsumption, SELF_POWER_BACKUP_PERCENTAGE)
            }
        }
    }
}

impl From<BatteryUsage> for State {
    fn from(usage: BatteryUsage) -> Self {
        match usage {
            BatteryUsage::BackupOnly => Self::ChargeFromGrid,
            BatteryUsage::SelfConsumption => Self::SelfPower,
        }
    }
}

/// Current state derived from the portal's battery configuration.
pub fn state_from_battery_config(config: &BatteryConfig) -> State {
    State::from(config.usage)
}

/// Compute the state the battery should be in at `now`.
///
/// Outside the self-power window the forecast is not consulted.
pub fn next_state<Tz: TimeZone>(now: &DateTime<Tz>, forecast: Option<&[ForecastInterval]>) -> State {
    let secs = now.num_seconds_from_midnight();
    let begin = SELF_POWER_BEGIN_SECS - SLOP_SECS;
    let end = SELF_POWER_END_SECS + SLOP_SECS;

    if secs < begin || secs >= end {
        return State::ChargeFromGrid;
    }

    let bad_weather = forecast
        .unwrap_or_default()
        .iter()
        .find(|interval| is_severe(interval.weather_code) || interval.wind_gust > MAX_WIND_GUST);

    if let Some(interval) = bad_weather {
        debug!(
            start = %interval.start_time,
            code = %interval.weather_code,
            wind_gust = interval.wind_gust,
            "bad weather in forecast"
        );
        return State::ChargeFromGrid;
    }

    State::SelfPower
}

/// Weather codes that force grid charging.
pub fn is_severe(code: WeatherCode) -> bool {
    match code {
        WeatherCode::Thunderstorm
        | WeatherCode::HeavySnow
        | WeatherCode::FreezingDrizzle
        | WeatherCode::FreezingRain
        | WeatherCode::LightFreezingRain
        | WeatherCode::HeavyFreezingRain
        | WeatherCode::IcePellets
        | WeatherCode::HeavyIcePellets
        | WeatherCode::LightIcePellets => true,
        WeatherCode::Unknown
        | WeatherCode::ClearSunny
        | WeatherCode::MostlyClear
        | WeatherCode::PartlyCloudy
        | WeatherCode::MostlyCloudy
        | WeatherCode::Cloudy
        | WeatherCode::Fog
        | WeatherCode::LightFog
        | WeatherCode::Drizzle
        | WeatherCode::Rain
        | WeatherCode::LightRain
        | WeatherCode::HeavyRain
        | WeatherCode::Snow
        | WeatherCode::Flurries
        | WeatherCode::LightSnow => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use chrono_tz::America::Chicago;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2022, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
            .and_utc()
    }

    fn interval(code: WeatherCode, wind_gust: f64) -> ForecastInterval {
        ForecastInterval {
            start_time: at(12, 0),
            weather_code: code,
            wind_gust,
            temperature: None,
        }
    }

    #[test]
    fn self_powers_during_the_day() {
        assert_eq!(next_state(&at(12, 0), None), State::SelfPower);
        assert_eq!(next_state(&at(6, 0), None), State::SelfPower);
    }

    #[test]
    fn charges_from_grid_at_night() {
        assert_eq!(next_state(&at(2, 0), None), State::ChargeFromGrid);
        assert_eq!(next_state(&at(22, 0), None), State::ChargeFromGrid);
    }

    #[test]
    fn applies_slop_at_both_boundaries() {
        assert_eq!(next_state(&at(5, 45), None), State::ChargeFromGrid);
        assert_eq!(next_state(&at(5, 50), None), State::SelfPower);
        assert_eq!(next_state(&at(5, 55), None), State::SelfPower);
        assert_eq!(next_state(&at(20, 5), None), State::SelfPower);
        assert_eq!(next_state(&at(20, 10), None), State::ChargeFromGrid);
        assert_eq!(next_state(&at(20, 15), None), State::ChargeFromGrid);
    }

    #[test]
    fn uses_the_wall_clock_of_the_given_zone() {
        // 18:00 UTC is noon in Chicago in January.
        let noon_chicago = at(18, 0).with_timezone(&Chicago);
        assert_eq!(next_state(&noon_chicago, None), State::SelfPower);

        // 12:00 UTC is 06:00 in Chicago: still inside the window.
        let early = at(12, 0).with_timezone(&Chicago);
        assert_eq!(next_state(&early, None), State::SelfPower);

        // 03:00 UTC is 21:00 the previous evening in Chicago.
        let evening = at(3, 0).with_timezone(&Chicago);
        assert_eq!(next_state(&evening, None), State::ChargeFromGrid);
    }

    #[test]
    fn strong_gusts_force_grid_charging() {
        let forecast = [
            interval(WeatherCode::ClearSunny, 5.0),
            interval(WeatherCode::ClearSunny, 25.0),
        ];
        assert_eq!(next_state(&at(12, 0), Some(&forecast)), State::ChargeFromGrid);
    }

    #[test]
    fn severe_codes_force_grid_charging() {
        for code in [
            WeatherCode::Thunderstorm,
            WeatherCode::HeavySnow,
            WeatherCode::FreezingRain,
            WeatherCode::LightIcePellets,
        ] {
            let forecast = [interval(WeatherCode::Cloudy, 1.0), interval(code, 1.0)];
            assert_eq!(
                next_state(&at(12, 0), Some(&forecast)),
                State::ChargeFromGrid,
                "{code} should force grid charging"
            );
        }
    }

    #[test]
    fn benign_forecast_keeps_self_power() {
        let forecast = [
            interval(WeatherCode::Rain, 20.0),
            interval(WeatherCode::Snow, 10.0),
            interval(WeatherCode::Fog, 0.0),
        ];
        assert_eq!(next_state(&at(12, 0), Some(&forecast)), State::SelfPower);
        assert_eq!(next_state(&at(12, 0), Some(&[])), State::SelfPower);
    }

    #[test]
    fn forecast_ignored_outside_window() {
        let forecast = [interval(WeatherCode::ClearSunny, 1.0)];
        assert_eq!(next_state(&at(23, 0), Some(&forecast)), State::ChargeFromGrid);
    }

    #[test]
    fn state_from_reported_usage() {
        let config = |usage| BatteryConfig {
            usage,
            backup_percentage: None,
        };
        assert_eq!(
            state_from_battery_config(&config(BatteryUsage::BackupOnly)),
            State::ChargeFromGrid
        );
        assert_eq!(
            state_from_battery_config(&config(BatteryUsage::SelfConsumption)),
            State::SelfPower
        );
    }

    #[test]
    fn target_modes_round_trip_to_the_same_state() {
        for state in [State::ChargeFromGrid, State::SelfPower] {
            let mode = state.target_mode().unwrap();
            assert_eq!(State::from(mode.usage()), state);
        }
        assert_eq!(State::ChargeFromGrid.target_mode().unwrap().backup_percentage(), 100);
        assert_eq!(State::SelfPower.target_mode().unwrap().backup_percentage(), 30);
    }

    #[test]
    fn display_names() {
        assert_eq!(State::ChargeFromGrid.to_string(), "CHARGE_FROM_GRID");
        assert_eq!(State::SelfPower.to_string(), "SELF_POWER");
    }
}
