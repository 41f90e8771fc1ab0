//! Configuration handling
//!
//! Configuration is stored in `~/.config/wbs/config.toml` (global). Every
//! section is optional; missing keys fall back to defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::{DEFAULT_CAPACITY, DEFAULT_DEBOUNCE};
use crate::schedule::ScheduleContext;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Undo/redo settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo steps
    pub capacity: usize,

    /// Quiet period in milliseconds before an edit burst becomes an undo step
    pub debounce_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl HistoryConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Scheduler/rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Pixels per day in timeline views
    pub day_width: f32,

    /// Length in days for tasks with neither dates nor duration
    pub default_duration: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let ctx = ScheduleContext::default();
        Self {
            day_width: ctx.day_width,
            default_duration: ctx.default_duration,
        }
    }
}

impl ScheduleConfig {
    /// Builds a scheduler context (without a date window)
    pub fn context(&self) -> ScheduleContext {
        ScheduleContext {
            range: None,
            day_width: self.day_width,
            default_duration: self.default_duration,
        }
    }
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Document used when `--file` is not given
    pub default_file: Option<PathBuf>,

    pub history: HistoryConfig,

    pub schedule: ScheduleConfig,
}

impl Config {
    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "wbs", "wbs").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        match Self::global_config_dir() {
            Some(dir) => Self::load_from(&dir.join("config.toml")),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from a specific file, or defaults if absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config = Self::parse(&content).context("Failed to parse config")?;
        Ok(config)
    }

    /// Parses and validates a TOML configuration
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.history.capacity == 0 {
            return Err(ConfigError::Invalid(
                "history.capacity must be at least 1".into(),
            ));
        }
        if !(self.schedule.day_width > 0.0) {
            return Err(ConfigError::Invalid(
                "schedule.day_width must be positive".into(),
            ));
        }
        if self.schedule.default_duration == 0 {
            return Err(ConfigError::Invalid(
                "schedule.default_duration must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Saves the configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }
}
