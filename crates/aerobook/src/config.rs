//! Configuration management for aerobook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use chrono::{Duration, FixedOffset, Offset, Utc};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Fleet, DEFAULT_FLEET};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "aerobook";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "bookings.db";

/// Email of the seeded system guest account.
pub const DEFAULT_GUEST_EMAIL: &str = "vieras@savonlinnanlentokerho.fi";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `AEROBOOK_`, sections split on `__`,
///    e.g. `AEROBOOK_BOOKING__ALLOW_OVERLAPPING=false`)
/// 2. TOML config file at `~/.config/aerobook/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Bookable aircraft.
    pub fleet: FleetConfig,
    /// Guest booking configuration.
    pub guest: GuestConfig,
    /// Booking rules.
    pub booking: BookingConfig,
    /// Calendar presentation.
    pub calendar: CalendarConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/aerobook/bookings.db`
    pub database_path: Option<PathBuf>,
}

/// Fleet configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Registrations that may be booked.
    pub aircraft: Vec<String>,
}

/// Guest booking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestConfig {
    /// Email of the system account that owns guest bookings.
    pub account_email: String,
}

/// Rules applied to every booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Accept bookings that overlap an existing booking on the same aircraft.
    pub allow_overlapping: bool,
    /// Shortest accepted booking.
    pub min_duration_minutes: u32,
    /// Require start and end on a full local hour.
    pub whole_hours_only: bool,
    /// Longest accepted title, in characters.
    pub max_title_len: usize,
    /// Longest accepted description, in characters.
    pub max_description_len: usize,
    /// Longest accepted repeat series, in days.
    pub max_repeat_days: u32,
}

/// Calendar presentation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Club local time as minutes east of UTC; days are bucketed in this offset.
    pub utc_offset_minutes: i32,
    /// First hour row shown in the day view.
    pub first_hour: u32,
    /// Last hour row shown in the day view.
    pub last_hour: u32,
    /// Calendar name used in exports.
    pub name: String,
    /// Domain used to build export UIDs.
    pub uid_domain: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            aircraft: DEFAULT_FLEET.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            account_email: DEFAULT_GUEST_EMAIL.to_string(),
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            allow_overlapping: true,
            min_duration_minutes: 60,
            whole_hours_only: true,
            max_title_len: 100,
            max_description_len: 500,
            max_repeat_days: 366,
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 120,
            first_hour: 7,
            last_hour: 22,
            name: "Savonlinnan Lentokerho - Varaukset".to_string(),
            uid_domain: "savonlinnanlentokerho.fi".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("AEROBOOK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.fleet.aircraft.is_empty() {
            return Err(Error::ConfigValidation {
                message: "fleet.aircraft must list at least one registration".to_string(),
            });
        }

        for reg in &self.fleet.aircraft {
            if !is_registration(reg) {
                return Err(Error::ConfigValidation {
                    message: format!("invalid aircraft registration: {reg:?}"),
                });
            }
        }

        if self.guest.account_email.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "guest.account_email must not be empty".to_string(),
            });
        }

        if self.booking.max_repeat_days == 0 {
            return Err(Error::ConfigValidation {
                message: "booking.max_repeat_days must be greater than 0".to_string(),
            });
        }

        // Real-world offsets stay within +-14h.
        if self.calendar.utc_offset_minutes.abs() > 14 * 60 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "calendar.utc_offset_minutes ({}) is out of range",
                    self.calendar.utc_offset_minutes
                ),
            });
        }

        if self.calendar.first_hour > self.calendar.last_hour || self.calendar.last_hour > 23 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "calendar hours {}..={} are not a valid window",
                    self.calendar.first_hour, self.calendar.last_hour
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// The configured fleet.
    #[must_use]
    pub fn fleet(&self) -> Fleet {
        Fleet::new(self.fleet.aircraft.iter().cloned())
    }

    /// Club local time offset.
    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.calendar.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Shortest accepted booking as a Duration.
    #[must_use]
    pub fn min_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.booking.min_duration_minutes))
    }
}

/// Registrations look like `OH-CON` or `OH-816`.
fn is_registration(reg: &str) -> bool {
    let mut parts = reg.splitn(2, '-');
    match (parts.next(), parts.next()) {
        (Some(prefix), Some(mark)) => {
            !prefix.is_empty()
                && !mark.is_empty()
                && prefix.chars().all(|c| c.is_ascii_uppercase())
                && mark
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        }
        _ => false,
    }
}
