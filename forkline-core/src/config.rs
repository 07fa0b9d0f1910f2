//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/forkline/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/forkline/` (~/.config/forkline/)
//! - State/Logs: `$XDG_STATE_HOME/forkline/` (~/.local/state/forkline/)

use crate::branch::BranchLabels;
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

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Branch naming and auto-switch behaviour
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// CLI display settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Branch navigation configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NavigationConfig {
    /// Switch to a newly created branch when it appears
    #[serde(default = "default_auto_switch")]
    pub auto_switch: bool,

    /// Display label of the main branch
    #[serde(default = "default_main_label")]
    pub main_label: String,

    /// Display label prefix of other branches ("Retry 1", "Retry 2", ...)
    #[serde(default = "default_retry_label")]
    pub retry_label: String,

    /// First component of generated branch ids
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            auto_switch: default_auto_switch(),
            main_label: default_main_label(),
            retry_label: default_retry_label(),
            branch_prefix: default_branch_prefix(),
        }
    }
}

impl NavigationConfig {
    /// Branch labels for the tree builder
    pub fn labels(&self) -> BranchLabels {
        BranchLabels {
            main: self.main_label.clone(),
            retry: self.retry_label.clone(),
        }
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.main_label.trim().is_empty() {
            return Err(Error::Config(
                "navigation.main_label must not be empty".to_string(),
            ));
        }
        if self.retry_label.trim().is_empty() {
            return Err(Error::Config(
                "navigation.retry_label must not be empty".to_string(),
            ));
        }
        // The creation time must stay the third `_`-separated component.
        if self.branch_prefix.is_empty() || self.branch_prefix.contains('_') {
            return Err(Error::Config(
                "navigation.branch_prefix must be non-empty and contain no '_'".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_auto_switch() -> bool {
    true
}

fn default_main_label() -> String {
    "Original".to_string()
}

fn default_retry_label() -> String {
    "Retry".to_string()
}

fn default_branch_prefix() -> String {
    "branch".to_string()
}

/// CLI display configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Maximum characters of message content shown per row
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_preview_chars() -> usize {
    72
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

        config.validate()?;
        Ok(config)
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        self.navigation.validate()?;
        if self.display.preview_chars == 0 {
            return Err(Error::Config(
                "display.preview_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/forkline/config.toml` (~/.config/forkline/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("forkline").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/forkline/` (~/.local/state/forkline/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("forkline")
    }
}
