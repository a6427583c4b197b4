//! Shared filesystem paths with test-friendly overrides.

use std::path::PathBuf;

const APP_DIR: &str = "apt-plugin";

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn fallback_home_dir() -> PathBuf {
    home::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Config directory (default: /etc/apt-plugin).
#[must_use]
pub fn config_dir() -> PathBuf {
    env_path("APT_PLUGIN_CONFIG_DIR").unwrap_or_else(|| PathBuf::from("/etc").join(APP_DIR))
}

/// Config file inside [`config_dir`].
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Data directory (default: XDG data dir or ~/.local/share/apt-plugin).
#[must_use]
pub fn data_dir() -> PathBuf {
    env_path("APT_PLUGIN_DATA_DIR").unwrap_or_else(|| {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| fallback_home_dir().join(".local/share").join(APP_DIR))
    })
}

/// Whether the mock backend replaces apt (`APT_PLUGIN_TEST_MODE=1`).
#[must_use]
pub fn test_mode() -> bool {
    std::env::var("APT_PLUGIN_TEST_MODE")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
