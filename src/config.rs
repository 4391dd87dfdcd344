use mealplan_core::{EngineOptions, PlanLayout, DEFAULT_DEBOUNCE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

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
    /// Directory holding plan files and recipe snapshots
    pub data_dir: ConfigValue<PathBuf>,
    /// Meal slots of each day, in display order
    pub meals: ConfigValue<Vec<String>>,
    /// Quiet period before edits are written, in milliseconds
    pub debounce_ms: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    meals: Option<Vec<String>>,
    debounce_ms: Option<u64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut meals = ConfigValue::new(
            PlanLayout::default().meals().to_vec(),
            ConfigSource::Default,
        );
        let mut debounce_ms = ConfigValue::new(
            DEFAULT_DEBOUNCE.as_millis() as u64,
            ConfigSource::Default,
        );
        let mut config_file = None;

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
            if let Some(list) = file_config.meals {
                if list.iter().all(|m| m.trim().is_empty()) {
                    return Err(ConfigError::Invalid(
                        path.clone(),
                        "meals must name at least one meal".to_string(),
                    ));
                }
                meals = ConfigValue::new(list, ConfigSource::File);
            }
            if let Some(ms) = file_config.debounce_ms {
                debounce_ms = ConfigValue::new(ms, ConfigSource::File);
            }
        }

        if let Ok(dir) = std::env::var("MEALPLAN_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(ms) = std::env::var("MEALPLAN_DEBOUNCE_MS") {
            let ms = ms
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv("MEALPLAN_DEBOUNCE_MS", ms.clone()))?;
            debounce_ms = ConfigValue::new(ms, ConfigSource::Environment);
        }

        Ok(Self {
            data_dir,
            meals,
            debounce_ms,
            config_file,
        })
    }

    pub fn layout(&self) -> PlanLayout {
        PlanLayout::new(self.meals.value.iter().cloned())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            layout: self.layout(),
            debounce: Duration::from_millis(self.debounce_ms.value),
        }
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/mealplan/
    /// - macOS: ~/Library/Application Support/mealplan/
    /// - Windows: %APPDATA%/mealplan/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mealplan")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/mealplan/
    /// - macOS: ~/Library/Application Support/mealplan/
    /// - Windows: %APPDATA%/mealplan/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mealplan")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    Invalid(PathBuf, String),
    InvalidEnv(&'static str, String),
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
            ConfigError::Invalid(path, reason) => {
                write!(f, "Invalid config file '{}': {}", path.display(), reason)
            }
            ConfigError::InvalidEnv(var, value) => {
                write!(f, "Invalid value '{}' for {}", value, var)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
