//! Key derivation configuration (`bcache.toml`)
//!
//! Layers, lowest precedence first:
//! built-in defaults → TOML file → environment → CLI flags.
//!
//! ```toml
//! temp_dir = "/var/tmp/bcache"
//! log_level = "debug"
//! log_format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "BCACHE_CONFIG";

/// Environment variable overriding `temp_dir`.
pub const TEMP_DIR_ENV: &str = "BCACHE_TEMP_DIR";

/// Environment variable overriding `log_level`.
pub const LOG_ENV: &str = "BCACHE_LOG";

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Configuration for key derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyConfig {
    /// Directory for temporary preprocessor output (default: system temp dir)
    pub temp_dir: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug or trace
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            log_level: "warn".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl KeyConfig {
    /// Load and parse config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse config from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: KeyConfig = toml::from_str(s)?;
        Ok(config)
    }

    /// Build the effective config from all layers below the CLI.
    ///
    /// `path` wins over `BCACHE_CONFIG`. Without either, only defaults and
    /// environment apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    /// [`KeyConfig::load`] with an injectable environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_ENV).map(PathBuf::from));

        let mut config = match file {
            Some(file) => Self::from_file(&file)?,
            None => Self::default(),
        };
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides.
    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = env(TEMP_DIR_ENV).filter(|d| !d.is_empty()) {
            self.temp_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = env(LOG_ENV).filter(|l| !l.is_empty()) {
            self.log_level = level;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_level '{}': must be one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        if let Some(ref dir) = self.temp_dir {
            if !dir.is_dir() {
                return Err(ConfigError::ValidationError(format!(
                    "temp_dir '{}' is not a directory",
                    dir.display()
                )));
            }
        }

        Ok(())
    }

    /// Directory for temporary files.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
