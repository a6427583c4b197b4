//! Mock package backend for isolated testing and CLI verification
//!
//! Selected by the binary only when `APT_PLUGIN_TEST_MODE=1` is set.
//! Persists state to a JSON file in `APT_PLUGIN_DATA_DIR` so stateful tests
//! can span several plugin processes, exactly like a real package database.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::{BackendError, PackageRef, UpdateAction, UpdateKind, paths};
use crate::package_managers::traits::PackageBackend;

/// The fake package database
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct MockState {
    /// Installed packages: name -> version
    pub installed: BTreeMap<String, String>,
    /// Repository contents: name -> candidate version
    pub available: BTreeMap<String, String>,
    /// Installed packages apt would consider automatic
    pub auto_installed: BTreeSet<String>,
    /// Every mutator fails as if another process held the dpkg lock
    pub lock_busy: bool,
    /// Mutators report success without changing anything
    pub phantom_success: bool,
    /// Number of mutating calls that reached the backend
    pub mutations: u32,
}

impl MockState {
    /// Read a state file; a missing file is an empty database
    pub fn read_from(path: &Path) -> Result<Self, BackendError> {
        match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).map_err(|err| BackendError::state(path, err)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(BackendError::state(path, err)),
        }
    }

    /// Write a state file, creating its directory
    pub fn write_to(&self, path: &Path) -> Result<(), BackendError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| BackendError::state(parent, err))?;
        }
        let data = serde_json::to_string_pretty(self).map_err(|err| BackendError::state(path, err))?;
        fs::write(path, data).map_err(|err| BackendError::state(path, err))
    }

    fn check_lock(&self) -> Result<(), BackendError> {
        if self.lock_busy {
            return Err(BackendError::LockBusy {
                detail: "Could not get lock /var/lib/dpkg/lock-frontend (mock)".to_string(),
            });
        }
        Ok(())
    }

    fn candidate(&self, name: &str, version: Option<&str>) -> Result<String, BackendError> {
        let available = self
            .available
            .get(name)
            .ok_or_else(|| BackendError::PackageNotFound(name.to_string()))?;
        match version {
            Some(version) if version != available => {
                Err(BackendError::PackageNotFound(format!("{name}={version}")))
            }
            _ => Ok(available.clone()),
        }
    }
}

enum Storage {
    Memory(Mutex<MockState>),
    File(PathBuf),
}

/// Package backend over a [`MockState`]
pub struct MockBackend {
    storage: Storage,
}

impl MockBackend {
    /// Backend over a state held in memory (unit tests)
    pub fn in_memory(state: MockState) -> Self {
        Self {
            storage: Storage::Memory(Mutex::new(state)),
        }
    }

    /// Backend over a state file, re-read on every call
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: Storage::File(path.into()),
        }
    }

    /// Backend over `<data_dir>/mock_state.json`
    pub fn from_data_dir() -> Self {
        Self::persistent(Self::state_path())
    }

    #[must_use]
    pub fn state_path() -> PathBuf {
        paths::data_dir().join("mock_state.json")
    }

    /// Current state of the fake database
    pub fn snapshot(&self) -> Result<MockState, BackendError> {
        self.load()
    }

    fn load(&self) -> Result<MockState, BackendError> {
        match &self.storage {
            Storage::Memory(state) => Ok(state
                .lock()
                .map_err(|_| BackendError::state("<memory>", "mock state poisoned"))?
                .clone()),
            Storage::File(path) => MockState::read_from(path),
        }
    }

    fn store(&self, new_state: &MockState) -> Result<(), BackendError> {
        match &self.storage {
            Storage::Memory(state) => {
                *state
                    .lock()
                    .map_err(|_| BackendError::state("<memory>", "mock state poisoned"))? =
                    new_state.clone();
                Ok(())
            }
            Storage::File(path) => {
                tracing::debug!("Mock saving state to {}", path.display());
                new_state.write_to(path)
            }
        }
    }

    /// Run one mutator: counts the call, honours the lock and phantom knobs
    fn mutate<F>(&self, apply: F) -> Result<(), BackendError>
    where
        F: FnOnce(&mut MockState) -> Result<(), BackendError>,
    {
        let mut state = self.load()?;
        state.mutations += 1;
        let result = state.check_lock().and_then(|()| {
            let mut next = state.clone();
            apply(&mut next)?;
            if !state.phantom_success {
                state = next;
            }
            Ok(())
        });
        self.store(&state)?;
        result
    }
}

#[async_trait]
impl PackageBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn installed_version(&self, name: &str) -> Result<Option<String>, BackendError> {
        Ok(self.load()?.installed.get(name).cloned())
    }

    async fn list_installed(&self) -> Result<Vec<PackageRef>, BackendError> {
        let state = self.load()?;
        Ok(state
            .installed
            .iter()
            .filter(|(name, _)| !state.auto_installed.contains(*name))
            .map(|(name, version)| PackageRef::repository(name.clone(), Some(version.clone())))
            .collect())
    }

    async fn install_from_repository(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<(), BackendError> {
        self.mutate(|state| {
            let version = state.candidate(name, version)?;
            state.installed.insert(name.to_string(), version);
            state.auto_installed.remove(name);
            Ok(())
        })
    }

    async fn install_from_file(&self, path: &Path) -> Result<(), BackendError> {
        let artifact = self.inspect_artifact(path).await?;
        self.mutate(|state| {
            state.installed.insert(artifact.name.clone(), artifact.version.clone());
            state.auto_installed.remove(&artifact.name);
            Ok(())
        })
    }

    async fn remove(&self, name: &str, version: Option<&str>) -> Result<(), BackendError> {
        self.mutate(|state| {
            match (state.installed.get(name), version) {
                (None, _) => return Err(BackendError::PackageNotFound(name.to_string())),
                (Some(installed), Some(version)) if installed != version => {
                    return Err(BackendError::PackageNotFound(format!("{name}={version}")));
                }
                _ => {}
            }
            state.installed.remove(name);
            state.auto_installed.remove(name);
            Ok(())
        })
    }

    async fn refresh_index(&self) -> Result<(), BackendError> {
        self.load()?.check_lock()
    }

    async fn autoremove(&self) -> Result<(), BackendError> {
        self.mutate(|state| {
            let automatic: Vec<String> = state.auto_installed.iter().cloned().collect();
            for name in automatic {
                state.installed.remove(&name);
            }
            state.auto_installed.clear();
            Ok(())
        })
    }

    async fn apply_batch(&self, actions: &[UpdateAction]) -> Result<(), BackendError> {
        let mut artifacts = BTreeMap::new();
        for action in actions {
            if let Some(file) = &action.file {
                artifacts.insert(file.clone(), self.inspect_artifact(file).await?);
            }
        }

        self.mutate(|state| {
            for action in actions {
                match (action.kind, &action.file) {
                    (UpdateKind::Install, Some(file)) => {
                        if let Some(artifact) = artifacts.get(file) {
                            state
                                .installed
                                .insert(artifact.name.clone(), artifact.version.clone());
                        }
                    }
                    (UpdateKind::Install, None) => {
                        let version = state.candidate(&action.name, action.version.as_deref())?;
                        state.installed.insert(action.name.clone(), version);
                    }
                    (UpdateKind::Remove, _) => {
                        state.installed.remove(&action.name);
                        state.auto_installed.remove(&action.name);
                    }
                }
            }
            Ok(())
        })
    }
}
