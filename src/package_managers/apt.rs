//! Debian/Ubuntu package backend (apt-get for mutations, dpkg status for queries)

use async_trait::async_trait;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::config::AptSettings;
use crate::core::privilege::elevated_argv;
use crate::core::{BackendError, PackageRef, UpdateAction, UpdateKind};
use crate::package_managers::dpkg_status;
use crate::package_managers::traits::PackageBackend;

/// stderr fragments apt-get prints when another process holds the dpkg lock
const LOCK_MARKERS: &[&str] = &[
    "Could not get lock",
    "Unable to acquire the dpkg frontend lock",
    "Unable to lock the administration directory",
    "Unable to lock directory",
];

/// stderr fragments apt-get prints for an unknown package or version
const NOT_FOUND_MARKERS: &[&str] = &[
    "Unable to locate package",
    "has no installation candidate",
    "Couldn't find any package by",
];

#[derive(Debug, Clone)]
pub struct AptBackend {
    settings: AptSettings,
}

impl AptBackend {
    #[must_use]
    pub fn new(settings: AptSettings) -> Self {
        Self { settings }
    }

    /// Full argument list for a mutating apt-get verb
    fn mutating_args(&self, verb: &str, targets: &[String]) -> Vec<String> {
        let mut args = vec![verb.to_string(), "--quiet".to_string(), "--yes".to_string()];
        args.extend(self.settings.extra_options.iter().cloned());
        args.extend(targets.iter().cloned());
        args
    }

    fn resolve_apt_get(&self) -> Result<PathBuf, BackendError> {
        which::which(&self.settings.apt_get).map_err(|err| {
            BackendError::exec(
                &self.settings.apt_get,
                std::io::Error::new(std::io::ErrorKind::NotFound, err.to_string()),
            )
        })
    }

    /// Run apt-get once and classify its exit status
    async fn run_apt_get(&self, args: Vec<String>) -> Result<(), BackendError> {
        let apt_get = self.resolve_apt_get()?;
        let (program, mut argv) =
            elevated_argv(&apt_get.to_string_lossy(), self.settings.use_sudo);
        argv.extend(args);
        let cmd = format!("{program} {}", argv.join(" "));
        tracing::info!("Running {cmd}");

        let child = tokio::process::Command::new(&program)
            .args(&argv)
            .env("DEBIAN_FRONTEND", "noninteractive")
            // classify_failure matches apt-get's untranslated messages
            .env("LC_ALL", "C")
            .env("LANGUAGE", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| BackendError::exec(&program, err))?;

        let output = match self.settings.command_timeout() {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| BackendError::TimedOut {
                    cmd: cmd.clone(),
                    secs: limit.as_secs(),
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|err| BackendError::exec(&program, err))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!("{cmd} stdout:\n{stdout}");
        if !stderr.trim().is_empty() {
            tracing::debug!("{cmd} stderr:\n{stderr}");
        }

        if output.status.success() {
            return Ok(());
        }
        if let Some(signal) = output.status.signal() {
            tracing::warn!("{cmd} terminated by signal {signal}");
        }
        Err(classify_failure(&cmd, output.status.code(), &stderr))
    }
}

/// Map a failed apt-get run onto a [`BackendError`].
///
/// `code` is `None` when the process was terminated by a signal.
pub fn classify_failure(cmd: &str, code: Option<i32>, stderr: &str) -> BackendError {
    let Some(code) = code else {
        return BackendError::Interrupted {
            cmd: cmd.to_string(),
        };
    };

    let lines = || stderr.lines().map(str::trim).filter(|line| !line.is_empty());

    if let Some(line) = lines().find(|line| LOCK_MARKERS.iter().any(|m| line.contains(m))) {
        return BackendError::LockBusy {
            detail: line.to_string(),
        };
    }

    let missing_version = |line: &str| line.starts_with("E: Version '") && line.ends_with("was not found");
    if let Some(line) = lines()
        .find(|line| NOT_FOUND_MARKERS.iter().any(|m| line.contains(m)) || missing_version(*line))
    {
        return BackendError::PackageNotFound(line.trim_start_matches("E: ").to_string());
    }

    let detail = lines()
        .filter(|line| line.starts_with("E:"))
        .last()
        .or_else(|| lines().last())
        .unwrap_or("no error output")
        .to_string();
    BackendError::CommandFailed {
        cmd: cmd.to_string(),
        code,
        detail,
    }
}

/// `name` or `name=version`
fn package_spec(name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{name}={version}"),
        None => name.to_string(),
    }
}

/// apt-get install targets for a batch: `name-` marks a removal
fn batch_targets(actions: &[UpdateAction]) -> Vec<String> {
    actions
        .iter()
        .map(|action| match (action.kind, &action.file) {
            (UpdateKind::Install, Some(file)) => file.to_string_lossy().into_owned(),
            (UpdateKind::Install, None) => package_spec(&action.name, action.version.as_deref()),
            (UpdateKind::Remove, _) => format!("{}-", action.name),
        })
        .collect()
}

#[async_trait]
impl PackageBackend for AptBackend {
    fn name(&self) -> &'static str {
        "apt"
    }

    async fn installed_version(&self, name: &str) -> Result<Option<String>, BackendError> {
        let status = self.settings.dpkg_status.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || dpkg_status::installed_version(&status, &name))
            .await
            .map_err(|err| BackendError::state(&self.settings.dpkg_status, err))?
    }

    async fn list_installed(&self) -> Result<Vec<PackageRef>, BackendError> {
        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || {
            dpkg_status::list_installed(
                &settings.dpkg_status,
                &settings.extended_states,
                settings.list_manual_only,
            )
        })
        .await
        .map_err(|err| BackendError::state(&self.settings.dpkg_status, err))?
    }

    async fn install_from_repository(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<(), BackendError> {
        let args = self.mutating_args("install", &[package_spec(name, version)]);
        self.run_apt_get(args).await
    }

    async fn install_from_file(&self, path: &Path) -> Result<(), BackendError> {
        // apt-get only treats an argument as a file when it contains a slash
        let args = self.mutating_args("install", &[path.to_string_lossy().into_owned()]);
        self.run_apt_get(args).await
    }

    async fn remove(&self, name: &str, version: Option<&str>) -> Result<(), BackendError> {
        let args = self.mutating_args("remove", &[package_spec(name, version)]);
        self.run_apt_get(args).await
    }

    async fn refresh_index(&self) -> Result<(), BackendError> {
        self.run_apt_get(self.mutating_args("update", &[])).await
    }

    async fn autoremove(&self) -> Result<(), BackendError> {
        self.run_apt_get(self.mutating_args("auto-remove", &[])).await
    }

    async fn apply_batch(&self, actions: &[UpdateAction]) -> Result<(), BackendError> {
        if actions.is_empty() {
            return Ok(());
        }
        let args = self.mutating_args("install", &batch_targets(actions));
        self.run_apt_get(args).await
    }
}
