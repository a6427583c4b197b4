//! Common types used throughout the plugin

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where the bits of a package come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSource {
    /// The repositories configured for apt
    Repository,
    /// A `.deb` artifact on the local filesystem (always an absolute path)
    LocalFile(PathBuf),
}

/// A package as named by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub name: String,
    pub version: Option<String>,
    pub source: PackageSource,
}

impl PackageRef {
    #[must_use]
    pub fn repository(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
            source: PackageSource::Repository,
        }
    }

    #[must_use]
    pub fn local_file(name: impl Into<String>, version: Option<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            version,
            source: PackageSource::LocalFile(path),
        }
    }

    /// The artifact path, for local-file installs
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        match &self.source {
            PackageSource::LocalFile(path) => Some(path),
            PackageSource::Repository => None,
        }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}={version}", self.name)?,
            None => write!(f, "{}", self.name)?,
        }
        if let PackageSource::LocalFile(path) = &self.source {
            write!(f, " (from {})", path.display())?;
        }
        Ok(())
    }
}

/// Observed installation state of one package.
///
/// A read projection of the package database: it is recomputed on every
/// query and never stored between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledState {
    pub name: String,
    pub version: Option<String>,
    pub present: bool,
}

impl InstalledState {
    #[must_use]
    pub fn from_version(name: &str, version: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            present: version.is_some(),
            version,
        }
    }

    /// Whether this state already fulfils an install request for `desired`
    /// (any installed version satisfies a request without a version)
    #[must_use]
    pub fn satisfies(&self, desired: Option<&str>) -> bool {
        match (self.present, desired) {
            (false, _) => false,
            (true, None) => true,
            (true, Some(desired)) => self.version.as_deref() == Some(desired),
        }
    }
}

/// Control metadata read from a `.deb` artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub name: String,
    pub version: String,
    pub architecture: Option<String>,
}

/// Kind of one `update-list` action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    Install,
    Remove,
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// One line of `update-list` input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAction {
    pub kind: UpdateKind,
    pub name: String,
    pub version: Option<String>,
    pub file: Option<PathBuf>,
}

/// One line of `list` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedModule {
    pub name: String,
    pub version: String,
}

impl From<&PackageRef> for ListedModule {
    fn from(pkg: &PackageRef) -> Self {
        Self {
            name: pkg.name.clone(),
            version: pkg.version.clone().unwrap_or_default(),
        }
    }
}
