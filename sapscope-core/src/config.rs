//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/sapscope/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/sapscope/` (~/.config/sapscope/)
//! - Data (result cache): `$XDG_DATA_HOME/sapscope/` (~/.local/share/sapscope/)
//! - State/Logs: `$XDG_STATE_HOME/sapscope/` (~/.local/state/sapscope/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

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
    /// Batch scan configuration
    #[serde(default)]
    pub scan: ScanConfig,

    /// Oracle module configuration
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Remote log sink configuration
    #[serde(default)]
    pub sink: SinkConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Batch scan configuration
#[derive(Debug, Deserialize)]
pub struct ScanConfig {
    /// Default minimum date gate as a `YYYYMMDD` number. Files without a
    /// cached result whose date token is below this are skipped. 0 means
    /// no gate.
    #[serde(default)]
    pub min_date: i64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { min_date: 0 }
    }
}

/// Oracle module configuration
#[derive(Debug, Deserialize)]
pub struct OracleConfig {
    /// Linear memory pages instantiated at module load
    #[serde(default = "default_initial_pages")]
    pub initial_pages: u32,

    /// Ceiling the arena is grown to once at startup, in pages
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            initial_pages: default_initial_pages(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_initial_pages() -> u32 {
    10
}

fn default_max_pages() -> u32 {
    200
}

/// Remote log sink configuration
///
/// When enabled, structured run events are POSTed to the endpoint,
/// fire-and-forget.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SinkConfig {
    /// Enable/disable the remote sink
    #[serde(default)]
    pub enabled: bool,

    /// Endpoint URL accepting JSON events
    pub endpoint: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_sink_timeout")]
    pub timeout_secs: u64,
}

fn default_sink_timeout() -> u64 {
    5
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
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/sapscope/config.toml` (~/.config/sapscope/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("sapscope").join("config.toml")
    }

    /// Returns the data directory path (for the result cache)
    ///
    /// `$XDG_DATA_HOME/sapscope/` (~/.local/share/sapscope/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("sapscope")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/sapscope/` (~/.local/state/sapscope/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("sapscope")
    }

    /// Returns the result cache file path
    ///
    /// `$XDG_DATA_HOME/sapscope/results.json`
    pub fn cache_path() -> PathBuf {
        Self::data_dir().join("results.json")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/sapscope/sapscope.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("sapscope.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path
    /// behavior before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
