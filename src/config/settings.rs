//! Plugin settings and configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::paths;

/// Plugin configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log filter used when `APT_PLUGIN_LOG` is not set (e.g. "warn", "debug")
    pub log_level: String,

    /// Accept `update-list` batches (when false the verb reports unsupported)
    pub batch_updates: bool,

    /// apt/dpkg backend configuration
    pub apt: AptSettings,
}

/// apt/dpkg backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AptSettings {
    /// apt-get executable (name looked up in PATH, or absolute path)
    pub apt_get: String,
    /// dpkg status database
    pub dpkg_status: PathBuf,
    /// apt's auto-installed markers
    pub extended_states: PathBuf,
    /// Extra arguments passed to every mutating apt-get call
    pub extra_options: Vec<String>,
    /// Only report manually installed packages from `list`
    pub list_manual_only: bool,
    /// Wrap apt-get in `sudo --` when not running as root
    pub use_sudo: bool,
    /// Kill apt-get after this many seconds (no limit when unset)
    pub command_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            batch_updates: true,
            apt: AptSettings::default(),
        }
    }
}

impl Default for AptSettings {
    fn default() -> Self {
        Self {
            apt_get: "apt-get".to_string(),
            dpkg_status: PathBuf::from("/var/lib/dpkg/status"),
            extended_states: PathBuf::from("/var/lib/apt/extended_states"),
            extra_options: Vec::new(),
            list_manual_only: true,
            use_sudo: false,
            command_timeout_secs: None,
        }
    }
}

impl AptSettings {
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Settings {
    /// Load settings from the config file, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from an explicit file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", config_path.display()))
    }

    /// Get the config file path
    #[must_use]
    pub fn config_path() -> PathBuf {
        paths::config_file()
    }
}
