use anyhow::{Context, Result};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Longest expansion horizon padding accepted, in days.
pub const MAX_LOOKAHEAD_DAYS: u32 = 3650;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Calendar view and expansion settings
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// UI preferences
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// First day of the week shown in week views
    #[serde(default = "default_week_start")]
    pub week_start: Weekday,

    /// Days added on both sides of a visible range before expanding recurrences,
    /// so multi-day instances that started earlier still show up clipped.
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: u32,

    /// Maximum number of memoized expansions kept (0 disables memoization)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_week_start() -> Weekday {
    Weekday::Sun
}

fn default_lookahead_days() -> u32 {
    42
}

fn default_cache_capacity() -> usize {
    256
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            week_start: default_week_start(),
            lookahead_days: default_lookahead_days(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Dark mode enabled
    #[serde(default)]
    pub dark_mode: bool,

    /// Height of one stacking slot in the week grid, in pixels
    #[serde(default = "default_slot_height")]
    pub slot_height_px: u32,
}

fn default_slot_height() -> u32 {
    24
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dark_mode: false,
            slot_height_px: default_slot_height(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dayplan");

        Self {
            config_dir,
            calendar: CalendarConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults there if missing
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] when the file can't be read or the defaults
    /// can't be written, [`ConfigError::ParseError`] when it isn't valid TOML.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            tracing::info!("No config at {}, writing defaults", config_path.display());
            let config = Self::default();
            config.save_to(config_path).map_err(|e| {
                ConfigError::NotFound(format!(
                    "{} (writing defaults failed: {:#})",
                    config_path.display(),
                    e
                ))
            })?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| ConfigError::NotFound(format!("{}: {}", config_path.display(), e)))?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", config_path.display(), e)))
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        let config_path = Self::config_path()?;
        Self::load_validated_from(&config_path)
    }

    /// [`Config::load_validated`] for an explicit path
    pub fn load_validated_from(
        config_path: &Path,
    ) -> Result<(Self, ValidationResult), ConfigError> {
        let config = Self::load_from(config_path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.calendar.lookahead_days > MAX_LOOKAHEAD_DAYS {
            result.add_error(
                "calendar.lookahead_days",
                format!("Lookahead must be at most {} days", MAX_LOOKAHEAD_DAYS),
            );
        } else if self.calendar.lookahead_days > 366 {
            result.add_warning(
                "calendar.lookahead_days",
                "Lookahead is more than a year; expansion may be slow",
            );
        }

        if self.calendar.cache_capacity == 0 {
            result.add_warning(
                "calendar.cache_capacity",
                "Expansion memoization disabled (capacity 0)",
            );
        }

        if !matches!(self.calendar.week_start, Weekday::Sun | Weekday::Mon) {
            result.add_warning(
                "calendar.week_start",
                format!("Unusual first day of week: {}", self.calendar.week_start),
            );
        }

        if self.ui.slot_height_px == 0 {
            result.add_error("ui.slot_height_px", "Slot height must be greater than 0");
        }

        result
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("no user config directory".to_string()))?
            .join("dayplan");

        Ok(config_dir.join("config.toml"))
    }
}
