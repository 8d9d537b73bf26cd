//! Configuration file support for MedLedger.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/medledger/config.toml`.

use crate::{Calendar, Error, Result};
use chrono::{FixedOffset, Weekday};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Calendar used for goal periods and day counts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_week_start")]
    pub week_start: String,

    /// Fixed UTC offset; the machine's local offset when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            week_start: default_week_start(),
            utc_offset_minutes: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("medledger")
}

fn default_week_start() -> String {
    "sunday".into()
}

fn default_log_level() -> String {
    "warn".into()
}

impl CalendarConfig {
    pub fn week_start(&self) -> Result<Weekday> {
        self.week_start
            .trim()
            .parse::<Weekday>()
            .map_err(|_| Error::Config(format!("Unknown week_start: {}", self.week_start)))
    }

    /// Build the calendar this configuration describes
    pub fn to_calendar(&self) -> Result<Calendar> {
        let week_start = self.week_start()?;
        match self.utc_offset_minutes {
            Some(minutes) => {
                let offset = minutes
                    .checked_mul(60)
                    .and_then(FixedOffset::east_opt)
                    .ok_or_else(|| {
                        Error::Config(format!("utc_offset_minutes out of range: {}", minutes))
                    })?;
                Ok(Calendar::new(offset, week_start))
            }
            None => Ok(Calendar::local(week_start)),
        }
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("medledger").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data.data_dir.ends_with("medledger"));
        assert_eq!(config.calendar.week_start().unwrap(), Weekday::Sun);
        assert_eq!(config.calendar.utc_offset_minutes, None);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.calendar.week_start = "monday".into();
        config.calendar.utc_offset_minutes = Some(-300);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.calendar.week_start, "monday");
        assert_eq!(loaded.calendar.utc_offset_minutes, Some(-300));
        assert_eq!(loaded.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[calendar]
week_start = "Mon"
utc_offset_minutes = 60
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let calendar = config.calendar.to_calendar().unwrap();
        assert_eq!(calendar.week_start(), Weekday::Mon);
        assert_eq!(calendar.offset().local_minus_utc(), 3600);
        assert_eq!(config.logging.level, "warn"); // default
    }

    #[test]
    fn test_bad_calendar_values() {
        let config: Config = toml::from_str("[calendar]\nweek_start = \"someday\"\n").unwrap();
        assert!(matches!(config.calendar.to_calendar(), Err(Error::Config(_))));

        let config: Config = toml::from_str("[calendar]\nutc_offset_minutes = 100000\n").unwrap();
        assert!(matches!(config.calendar.to_calendar(), Err(Error::Config(_))));
    }
}
