//! dpkg status database reader
//!
//! Parses `/var/lib/dpkg/status` and apt's `extended_states` directly
//! instead of spawning dpkg-query. Both files are re-read on every call: the
//! database belongs to dpkg and may change underneath the plugin at any time.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::core::{BackendError, PackageRef};

/// One paragraph of the dpkg status file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub name: String,
    pub version: String,
    pub status: String,
    pub architecture: String,
}

impl StatusEntry {
    /// `Status: <want> <flag> <state>`; only the `installed` state counts
    /// (`config-files`, `half-installed`, `unpacked`, ... do not).
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.status.split_whitespace().nth(2) == Some("installed")
    }
}

/// Top-level `Key: value` fields of a deb822 paragraph
pub(crate) fn fields(paragraph: &str) -> impl Iterator<Item = (&str, &str)> {
    paragraph
        .lines()
        .filter(|line| !line.starts_with(' ') && !line.starts_with('\t'))
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
}

/// Parse every paragraph of a status file that names a package
pub fn parse_status(content: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::with_capacity(content.len() / 300);

    for paragraph in content.split("\n\n") {
        if paragraph.trim().is_empty() {
            continue;
        }

        let mut name = "";
        let mut version = "";
        let mut status = "";
        let mut architecture = "";

        for (key, value) in fields(paragraph) {
            match key {
                "Package" => name = value,
                "Version" => version = value,
                "Status" => status = value,
                "Architecture" => architecture = value,
                _ => {}
            }
        }

        if name.is_empty() {
            continue;
        }

        entries.push(StatusEntry {
            name: name.to_string(),
            version: version.to_string(),
            status: status.to_string(),
            architecture: architecture.to_string(),
        });
    }

    entries
}

/// Names marked `Auto-Installed: 1` in apt's extended_states
pub fn parse_auto_installed(content: &str) -> HashSet<String> {
    let mut auto = HashSet::new();
    for paragraph in content.split("\n\n") {
        let mut name = "";
        let mut auto_installed = false;
        for (key, value) in fields(paragraph) {
            match key {
                "Package" => name = value,
                "Auto-Installed" => auto_installed = value == "1",
                _ => {}
            }
        }
        if auto_installed && !name.is_empty() {
            auto.insert(name.to_string());
        }
    }
    auto
}

/// Read and parse the status file
pub fn read_status(path: &Path) -> Result<Vec<StatusEntry>, BackendError> {
    let content = fs::read_to_string(path).map_err(|err| BackendError::state(path, err))?;
    Ok(parse_status(&content))
}

/// Installed version of `name`, `None` when not installed
pub fn installed_version(path: &Path, name: &str) -> Result<Option<String>, BackendError> {
    Ok(read_status(path)?
        .into_iter()
        .find(|entry| entry.name == name && entry.is_installed())
        .map(|entry| entry.version))
}

/// Installed packages sorted by name.
///
/// With `manual_only`, packages apt marked as automatically installed are
/// left out. A missing extended_states file means nothing is automatic.
pub fn list_installed(
    status_path: &Path,
    extended_states_path: &Path,
    manual_only: bool,
) -> Result<Vec<PackageRef>, BackendError> {
    let entries = read_status(status_path)?;

    let auto_installed = if manual_only {
        match fs::read_to_string(extended_states_path) {
            Ok(content) => parse_auto_installed(&content),
            Err(err) if err.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(err) => return Err(BackendError::state(extended_states_path, err)),
        }
    } else {
        HashSet::new()
    };

    // Multi-arch packages appear once per architecture; report the name once
    let mut installed = BTreeMap::new();
    for entry in entries {
        if !entry.is_installed() || auto_installed.contains(&entry.name) {
            continue;
        }
        installed.entry(entry.name).or_insert(entry.version);
    }

    Ok(installed
        .into_iter()
        .map(|(name, version)| PackageRef::repository(name, Some(version)))
        .collect())
}
