//! apt-plugin test infrastructure
//!
//! Runs the real binary in test mode against a mock package database kept in
//! a per-test temporary data directory.

#![allow(dead_code)] // Test utilities may not all be used in every test file

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use apt_plugin_lib::core::testing::DebFixture;
use apt_plugin_lib::package_managers::MockState;
use assert_cmd::Command;
use tempfile::TempDir;

// Re-export serial_test for use in test files
#[allow(unused_imports)]
pub use serial_test::serial;

/// Test configuration flags
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub run_system_tests: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            run_system_tests: env::var("APT_PLUGIN_RUN_SYSTEM_TESTS")
                .map(|v| v == "1")
                .unwrap_or(false),
        }
    }
}

impl TestConfig {
    pub fn skip_if_no_system(&self, test_name: &str) -> bool {
        if self.run_system_tests {
            false
        } else {
            eprintln!("Skipping {test_name} (set APT_PLUGIN_RUN_SYSTEM_TESTS=1)");
            true
        }
    }

    pub fn is_debian_like(&self) -> bool {
        Path::new("/etc/debian_version").exists()
    }
}

/// A repository with a couple of well-known packages
pub fn repository() -> MockState {
    let mut state = MockState::default();
    state
        .available
        .insert("rolldice".to_string(), "1.16-1+b3".to_string());
    state.available.insert("vim".to_string(), "2:9.1.0016-1".to_string());
    state.available.insert("nano".to_string(), "7.2-1".to_string());
    state
}

/// Isolated data, config and working directories for one test
pub struct Sandbox {
    data: TempDir,
    config: TempDir,
    work: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            data: TempDir::new().unwrap(),
            config: TempDir::new().unwrap(),
            work: TempDir::new().unwrap(),
        }
    }

    /// Sandbox whose mock database starts as `state`
    pub fn with_state(state: &MockState) -> Self {
        let sandbox = Self::new();
        sandbox.set_state(state);
        sandbox
    }

    pub fn state_path(&self) -> PathBuf {
        self.data.path().join("mock_state.json")
    }

    pub fn set_state(&self, state: &MockState) {
        state.write_to(&self.state_path()).unwrap();
    }

    pub fn state(&self) -> MockState {
        MockState::read_from(&self.state_path()).unwrap()
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.state().installed.contains_key(name)
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.config.path().join("config.toml"), content).unwrap();
    }

    pub fn work_dir(&self) -> &Path {
        self.work.path()
    }

    /// Build a `.deb` in the working directory and return its absolute path
    pub fn deb(&self, name: &str, version: &str) -> PathBuf {
        let path = self.work.path().join(format!("{name}_{version}_amd64.deb"));
        DebFixture::new(name, version).write_to(&path).unwrap();
        path
    }

    /// The plugin binary, in test mode, inside this sandbox
    pub fn plugin(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_apt-plugin"));
        cmd.env("APT_PLUGIN_TEST_MODE", "1")
            .env("APT_PLUGIN_DATA_DIR", self.data.path())
            .env("APT_PLUGIN_CONFIG_DIR", self.config.path())
            .env_remove("APT_PLUGIN_LOG")
            .current_dir(self.work.path());
        cmd
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}
