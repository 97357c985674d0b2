use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};
use thiserror::Error;

use crate::clock::face::DEFAULT_CLOCK_SIZE;
use crate::pomodoro::pomodoro::{
    IntervalConfig, POMODORO_CYCLE_LENGTH, POMODORO_LONG_BREAK_SECONDS,
    POMODORO_SHORT_BREAK_SECONDS, POMODORO_WORK_SECONDS, TICK_INTERVAL_MS,
};

const MIN_CLOCK_SIZE: u32 = 40;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub work_seconds: u64,
    pub short_break_seconds: u64,
    pub long_break_seconds: u64,
    pub cycle_length: u32,
    pub tick_interval_ms: u64,
    pub clock_size: u32,
    pub desktop_notifications: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            work_seconds: POMODORO_WORK_SECONDS,
            short_break_seconds: POMODORO_SHORT_BREAK_SECONDS,
            long_break_seconds: POMODORO_LONG_BREAK_SECONDS,
            cycle_length: POMODORO_CYCLE_LENGTH,
            tick_interval_ms: TICK_INTERVAL_MS,
            clock_size: DEFAULT_CLOCK_SIZE,
            desktop_notifications: true,
        }
    }
}

impl AppConfig {
    /// Loads `explicit` if given, otherwise the per-user file when it
    /// exists, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config/pomo_clock/config.json"))
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.work_seconds == 0 || self.short_break_seconds == 0 || self.long_break_seconds == 0
        {
            return Err(ConfigError::Invalid(
                "phase lengths must be positive".to_string(),
            ));
        }
        if self.cycle_length < 2 || self.cycle_length % 2 != 0 {
            return Err(ConfigError::Invalid(format!(
                "cycle_length must be even and at least 2, got {}",
                self.cycle_length
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.clock_size < MIN_CLOCK_SIZE {
            return Err(ConfigError::Invalid(format!(
                "clock_size must be at least {}, got {}",
                MIN_CLOCK_SIZE, self.clock_size
            )));
        }
        Ok(())
    }

    pub fn interval(&self) -> IntervalConfig {
        IntervalConfig {
            work_seconds: self.work_seconds,
            short_break_seconds: self.short_break_seconds,
            long_break_seconds: self.long_break_seconds,
            cycle_length: self.cycle_length,
            tick_interval: Duration::from_millis(self.tick_interval_ms),
        }
    }
}
