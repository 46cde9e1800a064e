use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_CALENDAR_PATH, DEFAULT_CONFIG_PATH, DEFAULT_FUZZY_THRESHOLD, DEFAULT_LOG_DIR,
    DEFAULT_LOG_LEVEL, DEFAULT_MAX_ROWS, LOG_FILE_PREFIX, PLAZA_BASE, PLAZA_RESULTS,
    REFRESH_INTERVAL_SECS,
};
use crate::error::{FinalsError, Result};
use crate::logging;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub plaza: PlazaConfig,
    pub matcher: MatcherConfig,
    pub calendar: CalendarConfig,
    pub refresh: RefreshConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlazaConfig {
    pub base_url: String,
    pub results_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for PlazaConfig {
    fn default() -> Self {
        Self {
            base_url: PLAZA_BASE.to_string(),
            results_url: PLAZA_RESULTS.to_string(),
            timeout_seconds: 30,
            user_agent: format!("champ_finals/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum similarity ratio for the fuzzy tier
    pub fuzzy_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub path: String,
    /// Shift of the reference date from today, in days
    pub days_ahead: i64,
    pub num_shows: usize,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_CALENDAR_PATH.to_string(),
            days_ahead: 0,
            num_shows: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_seconds: u64,
    pub max_rows: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: REFRESH_INTERVAL_SECS,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub level: String,
    /// Directory for the rotated JSON log; unset or empty disables it
    pub dir: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            dir: Some(DEFAULT_LOG_DIR.to_string()),
            file_prefix: LOG_FILE_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file at the default path yields the defaults; a missing file
    /// anywhere else is an error.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
        if path.is_none() && !Path::new(config_path).exists() {
            debug!("No {} found, using default configuration", config_path);
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path).map_err(|e| {
            FinalsError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path, e
            ))
        })?;

        let config = Self::from_toml(&config_content)?;
        info!("Loaded configuration from {}", config_path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.matcher.fuzzy_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(FinalsError::Config(format!(
                "matcher.fuzzy_threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        if self.calendar.num_shows == 0 {
            return Err(FinalsError::Config(
                "calendar.num_shows must be at least 1".to_string(),
            ));
        }
        if self.refresh.interval_seconds == 0 {
            return Err(FinalsError::Config(
                "refresh.interval_seconds must be positive".to_string(),
            ));
        }
        if self.plaza.base_url.trim().is_empty() || self.plaza.results_url.trim().is_empty() {
            return Err(FinalsError::Config("plaza URLs must not be empty".to_string()));
        }
        logging::build_filter(None, &self.logging.level)?;
        if self.logging.file_prefix.trim().is_empty() {
            return Err(FinalsError::Config(
                "logging.file_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
