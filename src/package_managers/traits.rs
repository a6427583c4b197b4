//! Package backend trait definition

use async_trait::async_trait;
use std::path::Path;

use crate::core::{ArtifactInfo, BackendError, PackageRef, UpdateAction};
use crate::package_managers::deb_archive;

/// Trait for package manager backends.
///
/// A thin translation layer over the native package manager: no policy, no
/// retries, no caching. Every query reads the live package database and every
/// mutator runs exactly once per call.
#[async_trait]
pub trait PackageBackend: Send + Sync {
    /// Get the name of this backend
    fn name(&self) -> &'static str;

    /// Installed version of a package, `None` when it is not installed
    async fn installed_version(&self, name: &str) -> Result<Option<String>, BackendError>;

    /// List installed packages
    async fn list_installed(&self) -> Result<Vec<PackageRef>, BackendError>;

    /// Read the control metadata of a local `.deb` artifact
    async fn inspect_artifact(&self, path: &Path) -> Result<ArtifactInfo, BackendError> {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || deb_archive::inspect(&owned))
            .await
            .map_err(|err| BackendError::invalid_artifact(path, err))?
    }

    /// Install a package from the configured repositories
    async fn install_from_repository(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<(), BackendError>;

    /// Install a package from a local artifact (absolute path)
    async fn install_from_file(&self, path: &Path) -> Result<(), BackendError>;

    /// Remove a package
    async fn remove(&self, name: &str, version: Option<&str>) -> Result<(), BackendError>;

    /// Refresh the package index (`prepare`)
    async fn refresh_index(&self) -> Result<(), BackendError>;

    /// Remove packages that are no longer needed (`finalize`)
    async fn autoremove(&self) -> Result<(), BackendError>;

    /// Apply a list of installs and removals in one transaction (`update-list`)
    async fn apply_batch(&self, _actions: &[UpdateAction]) -> Result<(), BackendError> {
        Err(BackendError::Unsupported {
            backend: self.name(),
            operation: "update-list",
        })
    }
}
