// Enlighten domain and wire types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::cookies::CookieJar;
use crate::error::Error;

/// Session cookie whose value doubles as the `e-auth-token` header.
pub const SESSION_COOKIE: &str = "_enlighten_4_session";

// ── Session ─────────────────────────────────────────────────────────

/// Authenticated handle produced by a successful login.
///
/// Read-only once built; logging in again yields a fresh `Session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    cookies: CookieJar,
    site_id: String,
}

impl Session {
    pub fn new(cookies: CookieJar, site_id: impl Into<String>) -> Self {
        Self {
            cookies,
            site_id: site_id.into(),
        }
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Numeric site identifier taken from the login redirect.
    pub fn site_id(&self) -> &str {
        &self.site_id
    }
}

// ── Battery usage ───────────────────────────────────────────────────

/// The portal's two battery operating usages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatteryUsage {
    /// Charge from the grid and hold the charge for backup.
    #[serde(rename = "backup_only")]
    BackupOnly,
    /// Power the home from the battery.
    #[serde(rename = "self-consumption")]
    SelfConsumption,
}

impl BatteryUsage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BackupOnly => "backup_only",
            Self::SelfConsumption => "self-consumption",
        }
    }
}

impl fmt::Display for BatteryUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatteryUsage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backup_only" => Ok(Self::BackupOnly),
            "self-consumption" => Ok(Self::SelfConsumption),
            other => Err(Error::UnexpectedUsage {
                value: other.to_owned(),
            }),
        }
    }
}

// ── Battery mode (write side) ───────────────────────────────────────

/// Usage plus backup-reserve percentage, as written to the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryMode {
    usage: BatteryUsage,
    backup_percentage: u8,
}

impl BatteryMode {
    /// Fails if `backup_percentage` is above 100.
    pub fn new(usage: BatteryUsage, backup_percentage: u8) -> Result<Self, Error> {
        if backup_percentage > 100 {
            return Err(Error::Validation {
                field: "battery_backup_percentage".into(),
                reason: format!("{backup_percentage} is not within 0-100"),
            });
        }
        Ok(Self {
            usage,
            backup_percentage,
        })
    }

    pub fn usage(&self) -> BatteryUsage {
        self.usage
    }

    pub fn backup_percentage(&self) -> u8 {
        self.backup_percentage
    }
}

impl fmt::Display for BatteryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}% reserve)", self.usage, self.backup_percentage)
    }
}

// ── Battery config (read side) ──────────────────────────────────────

/// Battery settings as reported by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryConfig {
    pub usage: BatteryUsage,
    pub backup_percentage: Option<u8>,
}

/// `{ "battery_config": { ... } }`
#[derive(Debug, Deserialize)]
pub(crate) struct BatteryConfigEnvelope {
    pub battery_config: RawBatteryConfig,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBatteryConfig {
    pub usage: String,
    #[serde(default, deserialize_with = "lenient_percentage")]
    pub battery_backup_percentage: Option<u8>,
}

impl TryFrom<RawBatteryConfig> for BatteryConfig {
    type Error = Error;

    fn try_from(raw: RawBatteryConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            usage: raw.usage.parse()?,
            backup_percentage: raw.battery_backup_percentage,
        })
    }
}

/// Form body of the battery config PUT.
#[derive(Debug, Serialize)]
pub(crate) struct BatteryConfigUpdate {
    pub usage: BatteryUsage,
    pub battery_backup_percentage: u8,
}

impl From<&BatteryMode> for BatteryConfigUpdate {
    fn from(mode: &BatteryMode) -> Self {
        Self {
            usage: mode.usage,
            battery_backup_percentage: mode.backup_percentage,
        }
    }
}

/// Reply body of the battery config PUT.
#[derive(Debug, Deserialize)]
pub(crate) struct UpdateReply {
    pub message: Option<String>,
}

/// The percentage shows up as a number or a numeric string depending on
/// the portal version; anything unreadable is treated as absent.
fn lenient_percentage<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
