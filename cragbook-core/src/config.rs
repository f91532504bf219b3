//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/cragbook/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/cragbook/` (~/.config/cragbook/)
//! - Data: `$XDG_DATA_HOME/cragbook/` (~/.local/share/cragbook/)
//! - State/Logs: `$XDG_STATE_HOME/cragbook/` (~/.local/state/cragbook/)

use crate::error::{Error, Result};
use crate::types::Discipline;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding `backend.base_url`
pub const API_URL_ENV: &str = "CRAGBOOK_API_URL";

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
    /// Climbing backend connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Extra grade scales
    #[serde(default)]
    pub grades: GradesConfig,
}

/// Backend API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the climbing API (e.g., `http://127.0.0.1:5001`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl BackendConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("backend.base_url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "backend.base_url must start with http:// or https://, got {:?}",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "backend.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Grade scale configuration
#[derive(Debug, Deserialize, Default)]
pub struct GradesConfig {
    /// Scales added to (or replacing) the built-in ones
    #[serde(default)]
    pub scales: Vec<ScaleConfig>,
}

/// One configured grade scale
///
/// ```toml
/// [[grades.scales]]
/// discipline = "bouldering"
/// gym = "The Arch"
/// grades = ["White", "Green", "Blue", "Black"]
/// ```
#[derive(Debug, Deserialize, Clone)]
pub struct ScaleConfig {
    pub discipline: Discipline,
    /// Required for bouldering
    #[serde(default)]
    pub gym: Option<String>,
    /// Labels, easiest first
    pub grades: Vec<String>,
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };
        config.apply_env();
        config.backend.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!(base_url = %url, "Using backend URL from environment");
                self.backend.base_url = url;
            }
        }
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/cragbook/config.toml` (~/.config/cragbook/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("cragbook").join("config.toml")
    }

    /// Returns the data directory path (for the pending session draft)
    ///
    /// `$XDG_DATA_HOME/cragbook/` (~/.local/share/cragbook/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("cragbook")
    }

    /// Returns the state directory path (for logs and the cached profile)
    ///
    /// `$XDG_STATE_HOME/cragbook/` (~/.local/state/cragbook/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("cragbook")
    }

    /// Returns the pending session draft path
    pub fn draft_path() -> PathBuf {
        Self::data_dir().join("active_session.json")
    }

    /// Returns the cached profile path (last used display name)
    pub fn profile_path() -> PathBuf {
        Self::state_dir().join("profile.json")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/cragbook/cragbook.log` (~/.local/state/cragbook/cragbook.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("cragbook.log")
    }
}
