//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/starlog/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/starlog/` (~/.config/starlog/)
//! - Data: `$XDG_DATA_HOME/starlog/` (~/.local/share/starlog/)
//! - State/Logs: `$XDG_STATE_HOME/starlog/` (~/.local/state/starlog/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Reward catalog and purchase rules
    #[serde(default)]
    pub rewards: RewardsConfig,

    /// Storage location overrides
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Reward rules
#[derive(Debug, Deserialize, Clone)]
pub struct RewardsConfig {
    /// Hours a reward stays locked after being bought
    #[serde(default = "default_cooldown_hours")]
    pub cooldown_hours: u32,

    /// Case-insensitive phrase that, when present in a reward description,
    /// allows a zero or negative star cost
    #[serde(default = "default_override_phrase")]
    pub override_phrase: String,

    /// Seed the predefined rewards into an empty catalog
    #[serde(default = "default_seed_defaults")]
    pub seed_defaults: bool,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            cooldown_hours: default_cooldown_hours(),
            override_phrase: default_override_phrase(),
            seed_defaults: default_seed_defaults(),
        }
    }
}

impl RewardsConfig {
    /// Cooldown window as a chrono duration
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.cooldown_hours))
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.cooldown_hours == 0 {
            return Err(Error::Config(
                "rewards.cooldown_hours must be at least 1".to_string(),
            ));
        }
        if self.override_phrase.trim().is_empty() {
            return Err(Error::Config(
                "rewards.override_phrase must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_cooldown_hours() -> u32 {
    24
}

fn default_override_phrase() -> String {
    "ryan is cool".to_string()
}

fn default_seed_defaults() -> bool {
    true
}

/// Storage path overrides
#[derive(Debug, Deserialize, Default)]
pub struct StorageConfig {
    /// Override path for the SQLite key-value store
    pub database_path: Option<PathBuf>,
    /// Override path for the evaluation template document
    pub templates_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.rewards.validate()?;

        Ok(config)
    }

    /// Effective database path, honouring `[storage] database_path`
    pub fn resolved_database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(Self::database_path)
    }

    /// Effective template document path, honouring `[storage] templates_path`
    pub fn resolved_templates_path(&self) -> PathBuf {
        self.storage
            .templates_path
            .clone()
            .unwrap_or_else(Self::templates_path)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/starlog/config.toml` (~/.config/starlog/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("starlog").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database and templates)
    ///
    /// `$XDG_DATA_HOME/starlog/` (~/.local/share/starlog/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("starlog")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/starlog/` (~/.local/state/starlog/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("starlog")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/starlog/data.db` (~/.local/share/starlog/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the template document path
    ///
    /// `$XDG_DATA_HOME/starlog/templates.json`
    pub fn templates_path() -> PathBuf {
        Self::data_dir().join("templates.json")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/starlog/starlog.log` (~/.local/state/starlog/starlog.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("starlog.log")
    }
}
