//! Environment-driven store configuration.
//!
//! Values are read from process environment variables; a `.env` file in the
//! working directory is loaded first outside of tests.

use crate::logging::{default_log_level, LoggingConfig};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "./flashcards.sqlite3";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Configuration for opening the store and its logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub log_to_stderr: bool,
}

impl StoreConfig {
    /// Loads configuration from `FLASHCARDS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = lookup("FLASHCARDS_DB_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let log_level = lookup("FLASHCARDS_LOG_LEVEL")
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default_log_level().to_string());

        let log_dir = lookup("FLASHCARDS_LOG_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let log_to_stderr = match lookup("FLASHCARDS_LOG_STDERR") {
            None => false,
            Some(value) => parse_bool("FLASHCARDS_LOG_STDERR", &value)?,
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
            log_to_stderr,
        })
    }

    /// Logging settings, when a log directory is configured.
    pub fn logging(&self) -> Option<LoggingConfig> {
        self.log_dir.as_ref().map(|dir| LoggingConfig {
            level: self.log_level.clone(),
            log_dir: dir.clone(),
            duplicate_to_stderr: self.log_to_stderr,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{other}' is not a boolean"),
        )),
    }
}
