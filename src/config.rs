//! Runtime configuration
//!
//! Values come from the environment (optionally a `.env` file), a JSON file,
//! or are built in code with [`Config::new`].

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{AttpError, Result};
use crate::{DATABASE_FILENAME, SITE_CONFIG_CACHE_FILENAME, EXPIRING_WINDOW_DAYS, MAX_EXPIRING_WINDOW_DAYS};

/// Environment variable holding the data directory
pub const ENV_DATA_DIR: &str = "ATTP_DATA_DIR";
/// Environment variable overriding the database filename
pub const ENV_DATABASE_FILENAME: &str = "ATTP_DATABASE_FILENAME";
/// Environment variable overriding the site config cache filename
pub const ENV_SITE_CONFIG_CACHE: &str = "ATTP_SITE_CONFIG_CACHE";
/// Environment variable overriding the expiring-soon window
pub const ENV_EXPIRING_WINDOW_DAYS: &str = "ATTP_EXPIRING_WINDOW_DAYS";
/// Environment variable with the default log filter
pub const ENV_LOG: &str = "ATTP_LOG";

fn default_database_filename() -> String {
    DATABASE_FILENAME.to_string()
}

fn default_cache_filename() -> String {
    SITE_CONFIG_CACHE_FILENAME.to_string()
}

fn default_expiring_window_days() -> i64 {
    EXPIRING_WINDOW_DAYS
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Folder holding the database and the local cache
    pub data_dir: PathBuf,
    #[serde(default = "default_database_filename")]
    pub database_filename: String,
    #[serde(default = "default_cache_filename")]
    pub site_config_cache_filename: String,
    /// Days before expiry at which a certificate is "expiring soon"
    #[serde(default = "default_expiring_window_days")]
    pub expiring_window_days: i64,
    /// Default `tracing` filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Config {
    /// Configuration with defaults for everything but the data folder
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            database_filename: default_database_filename(),
            site_config_cache_filename: default_cache_filename(),
            expiring_window_days: default_expiring_window_days(),
            log_filter: default_log_filter(),
        }
    }

    /// Load from process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup(ENV_DATA_DIR)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AttpError::ConfigError(
                format!("Missing required environment variable: {}", ENV_DATA_DIR)
            ))?;

        let mut config = Self::new(Path::new(&data_dir));

        if let Some(name) = lookup(ENV_DATABASE_FILENAME) {
            config.database_filename = name;
        }
        if let Some(name) = lookup(ENV_SITE_CONFIG_CACHE) {
            config.site_config_cache_filename = name;
        }
        if let Some(raw) = lookup(ENV_EXPIRING_WINDOW_DAYS) {
            config.expiring_window_days = raw.trim().parse().map_err(|_| {
                AttpError::ConfigError(format!(
                    "Invalid value for environment variable {}: {}", ENV_EXPIRING_WINDOW_DAYS, raw
                ))
            })?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            config.log_filter = filter;
        }

        config.check()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| AttpError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if !(0..=MAX_EXPIRING_WINDOW_DAYS).contains(&self.expiring_window_days) {
            return Err(AttpError::ConfigError(format!(
                "expiring_window_days must be between 0 and {}", MAX_EXPIRING_WINDOW_DAYS
            )));
        }
        if self.database_filename.trim().is_empty() {
            return Err(AttpError::ConfigError("database_filename is empty".to_string()));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    pub fn site_config_cache_path(&self) -> PathBuf {
        self.data_dir.join(&self.site_config_cache_filename)
    }
}
