//! Installed-state verification around mutating operations
//!
//! All answers come straight from the backend. The verifier keeps nothing
//! between calls, so a post-check always observes the database as it is
//! after the mutation, not a snapshot taken before it.

use crate::core::error::{PluginError, Result};
use crate::core::InstalledState;
use crate::package_managers::PackageBackend;

pub struct StateVerifier<'a> {
    backend: &'a dyn PackageBackend,
}

impl<'a> StateVerifier<'a> {
    pub fn new(backend: &'a dyn PackageBackend) -> Self {
        Self { backend }
    }

    pub async fn installed_state(&self, name: &str) -> Result<InstalledState> {
        let version = self.backend.installed_version(name).await?;
        tracing::debug!(package = name, version = ?version, "queried installed state");
        Ok(InstalledState::from_version(name, version))
    }

    pub async fn installed_version(&self, name: &str) -> Result<Option<String>> {
        Ok(self.installed_state(name).await?.version)
    }

    pub async fn is_installed(&self, name: &str) -> Result<bool> {
        Ok(self.installed_state(name).await?.present)
    }

    /// Post-check for installs: the package must now be present, at the
    /// desired version when one is known.
    pub async fn confirm_installed(
        &self,
        name: &str,
        desired: Option<&str>,
    ) -> Result<InstalledState> {
        let state = self.installed_state(name).await?;
        if state.satisfies(desired) {
            return Ok(state);
        }

        let backend = self.backend.name();
        let detail = match (&state.version, desired) {
            (Some(actual), Some(desired)) => format!(
                "{name} is installed at {actual} instead of {desired} after the {backend} backend reported success"
            ),
            _ => format!("{name} is not installed after the {backend} backend reported success"),
        };
        tracing::warn!("{detail}");
        Err(PluginError::Backend(detail))
    }

    /// Post-check for removals: the package must now be absent
    pub async fn confirm_absent(&self, name: &str) -> Result<()> {
        let state = self.installed_state(name).await?;
        if !state.present {
            return Ok(());
        }

        let detail = format!(
            "{name} is still installed ({}) after the {} backend reported success",
            state.version.unwrap_or_default(),
            self.backend.name()
        );
        tracing::warn!("{detail}");
        Err(PluginError::Backend(detail))
    }
}
