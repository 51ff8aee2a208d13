use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use fitcal_core::{LedgerOptions, HISTORY_CAPACITY};

/// Body weight used for workout calorie estimates when none is configured.
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the ledger files
    pub data_dir: ConfigValue<PathBuf>,
    /// Number of archived days kept
    pub history_days: ConfigValue<usize>,
    /// Seconds between rollover checks in watch mode
    pub check_interval_secs: ConfigValue<u64>,
    /// Body weight for workout calorie estimates
    pub weight_kg: ConfigValue<f64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    history_days: Option<usize>,
    check_interval_secs: Option<u64>,
    weight_kg: Option<f64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut history_days = ConfigValue::new(HISTORY_CAPACITY, ConfigSource::Default);
        let mut check_interval_secs =
            ConfigValue::new(DEFAULT_CHECK_INTERVAL_SECS, ConfigSource::Default);
        let mut weight_kg = ConfigValue::new(DEFAULT_WEIGHT_KG, ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(days) = file_config.history_days {
                history_days = ConfigValue::new(days, ConfigSource::File);
            }
            if let Some(secs) = file_config.check_interval_secs {
                check_interval_secs = ConfigValue::new(secs, ConfigSource::File);
            }
            if let Some(weight) = file_config.weight_kg {
                weight_kg = ConfigValue::new(weight, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(dir) = std::env::var("FITCAL_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Some(days) = env_override("FITCAL_HISTORY_DAYS")? {
            history_days = ConfigValue::new(days, ConfigSource::Environment);
        }
        if let Some(secs) = env_override("FITCAL_CHECK_INTERVAL_SECS")? {
            check_interval_secs = ConfigValue::new(secs, ConfigSource::Environment);
        }
        if let Some(weight) = env_override("FITCAL_WEIGHT_KG")? {
            weight_kg = ConfigValue::new(weight, ConfigSource::Environment);
        }

        let config = Self {
            data_dir,
            history_days,
            check_interval_secs,
            weight_kg,
            config_file,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=HISTORY_CAPACITY).contains(&self.history_days.value) {
            return Err(ConfigError::Invalid(format!(
                "history_days must be between 1 and {}, got {}",
                HISTORY_CAPACITY, self.history_days.value
            )));
        }
        if self.check_interval_secs.value == 0 {
            return Err(ConfigError::Invalid(
                "check_interval_secs must be at least 1".to_string(),
            ));
        }
        if !(self.weight_kg.value.is_finite() && self.weight_kg.value > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "weight_kg must be a positive number, got {}",
                self.weight_kg.value
            )));
        }
        Ok(())
    }

    pub fn ledger_options(&self) -> LedgerOptions {
        LedgerOptions {
            history_capacity: self.history_days.value,
            check_interval: Duration::from_secs(self.check_interval_secs.value),
        }
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/fitcal/
    /// - macOS: ~/Library/Application Support/fitcal/
    /// - Windows: %APPDATA%/fitcal/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitcal")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/fitcal/
    /// - macOS: ~/Library/Application Support/fitcal/
    /// - Windows: %APPDATA%/fitcal/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitcal")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn env_override<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{} has an invalid value '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
