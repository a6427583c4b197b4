//! Request execution: pre-check, backend call, post-check
//!
//! Every path through [`Adapter::run`] ends in exactly one [`Outcome`].

use std::fmt;
use std::io::Write;

use crate::cli::dispatch::Request;
use crate::core::{
    ListedModule, Outcome, PackageRef, PluginError, Result, StateVerifier, UpdateAction,
    UpdateKind,
};
use crate::package_managers::PackageBackend;

/// Stages of one invocation, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Dispatching,
    Validating,
    PreChecking,
    Invoking,
    PostChecking,
    Translating,
    Exiting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dispatching => "dispatching",
            Self::Validating => "validating",
            Self::PreChecking => "pre-checking",
            Self::Invoking => "invoking",
            Self::PostChecking => "post-checking",
            Self::Translating => "translating",
            Self::Exiting => "exiting",
        };
        f.write_str(name)
    }
}

/// Trace a phase transition
pub fn enter(phase: Phase, verb: &str) {
    tracing::debug!(verb, %phase, "phase");
}

/// An update-list action with the version it must end up at
struct PlannedAction {
    action: UpdateAction,
    desired: Option<String>,
    satisfied: bool,
}

pub struct Adapter<'a> {
    backend: &'a dyn PackageBackend,
    verifier: StateVerifier<'a>,
    batch_updates: bool,
}

impl<'a> Adapter<'a> {
    pub fn new(backend: &'a dyn PackageBackend, batch_updates: bool) -> Self {
        Self {
            backend,
            verifier: StateVerifier::new(backend),
            batch_updates,
        }
    }

    /// Execute a request; `out` receives `list` output
    pub async fn run<W: Write>(&self, request: Request, out: &mut W) -> Outcome {
        let verb = request.verb();
        enter(Phase::Validating, verb);

        let result = match request.validate() {
            Ok(()) => self.execute(request, out).await,
            Err(err) => Err(err),
        };

        enter(Phase::Translating, verb);
        let outcome = result.unwrap_or_else(Outcome::from);
        tracing::info!(verb, outcome = ?outcome, exit_code = %outcome.exit_code(), "done");
        outcome
    }

    async fn execute<W: Write>(&self, request: Request, out: &mut W) -> Result<Outcome> {
        match request {
            Request::Install(package) => self.install(&package).await,
            Request::Remove { name, version } => self.remove(&name, version.as_deref()).await,
            Request::List => self.list(out).await,
            Request::Prepare => {
                enter(Phase::Invoking, "prepare");
                self.backend.refresh_index().await?;
                Ok(Outcome::Success)
            }
            Request::Finalize => {
                enter(Phase::Invoking, "finalize");
                self.backend.autoremove().await?;
                Ok(Outcome::Success)
            }
            Request::UpdateList(actions) => self.update_list(actions).await,
        }
    }

    /// Version the install must end up at, checking a local artifact against
    /// the request first
    async fn desired_version(&self, package: &PackageRef) -> Result<Option<String>> {
        let Some(file) = package.file() else {
            return Ok(package.version.clone());
        };

        let artifact = self.backend.inspect_artifact(file).await?;
        tracing::debug!(
            file = %file.display(),
            name = %artifact.name,
            version = %artifact.version,
            "inspected artifact"
        );
        if artifact.name != package.name {
            return Err(PluginError::InvalidInput(format!(
                "{} contains package '{}', not '{}'",
                file.display(),
                artifact.name,
                package.name
            )));
        }
        if let Some(requested) = &package.version
            && *requested != artifact.version
        {
            return Err(PluginError::InvalidInput(format!(
                "{} contains version {}, not {requested}",
                file.display(),
                artifact.version
            )));
        }
        Ok(Some(artifact.version))
    }

    async fn install(&self, package: &PackageRef) -> Result<Outcome> {
        enter(Phase::PreChecking, "install");
        let desired = self.desired_version(package).await?;
        let state = self.verifier.installed_state(&package.name).await?;
        if state.satisfies(desired.as_deref()) {
            tracing::info!("{} is already installed, nothing to do", package.name);
            return Ok(Outcome::AlreadySatisfied);
        }

        enter(Phase::Invoking, "install");
        match package.file() {
            Some(file) => self.backend.install_from_file(file).await?,
            None => {
                self.backend
                    .install_from_repository(&package.name, package.version.as_deref())
                    .await?;
            }
        }

        enter(Phase::PostChecking, "install");
        self.verifier
            .confirm_installed(&package.name, desired.as_deref())
            .await?;
        Ok(Outcome::Success)
    }

    async fn remove(&self, name: &str, version: Option<&str>) -> Result<Outcome> {
        enter(Phase::PreChecking, "remove");
        let state = self.verifier.installed_state(name).await?;
        if !state.present {
            return Err(PluginError::NotFound(format!("{name} is not installed")));
        }
        if let (Some(wanted), Some(installed)) = (version, state.version.as_deref())
            && wanted != installed
        {
            return Err(PluginError::NotFound(format!(
                "{name} {wanted} is not installed (installed: {installed})"
            )));
        }

        enter(Phase::Invoking, "remove");
        self.backend.remove(name, version).await?;

        enter(Phase::PostChecking, "remove");
        self.verifier.confirm_absent(name).await?;
        Ok(Outcome::Success)
    }

    async fn list<W: Write>(&self, out: &mut W) -> Result<Outcome> {
        enter(Phase::Invoking, "list");
        let packages = self.backend.list_installed().await?;
        tracing::debug!("{} packages installed", packages.len());

        let write_err = |err: std::io::Error| PluginError::Internal(format!("failed to write list: {err}"));
        for package in &packages {
            let line = serde_json::to_string(&ListedModule::from(package))
                .map_err(|err| PluginError::Internal(err.to_string()))?;
            writeln!(out, "{line}").map_err(write_err)?;
        }
        out.flush().map_err(write_err)?;
        Ok(Outcome::Success)
    }

    async fn update_list(&self, actions: Vec<UpdateAction>) -> Result<Outcome> {
        if !self.batch_updates {
            return Err(PluginError::Unsupported(
                "update-list is disabled by configuration (batch_updates = false)".to_string(),
            ));
        }

        enter(Phase::PreChecking, "update-list");
        let mut plan = Vec::new();
        for action in actions {
            let state = self.verifier.installed_state(&action.name).await?;
            let (desired, satisfied) = match action.kind {
                UpdateKind::Install => {
                    let package = match &action.file {
                        Some(file) => PackageRef::local_file(
                            action.name.clone(),
                            action.version.clone(),
                            file.clone(),
                        ),
                        None => PackageRef::repository(action.name.clone(), action.version.clone()),
                    };
                    let desired = self.desired_version(&package).await?;
                    let satisfied = state.satisfies(desired.as_deref());
                    if satisfied {
                        tracing::info!("{} is already installed, skipping", action.name);
                    }
                    (desired, satisfied)
                }
                UpdateKind::Remove => {
                    if let (Some(wanted), Some(installed)) =
                        (action.version.as_deref(), state.version.as_deref())
                        && state.present
                        && wanted != installed
                    {
                        return Err(PluginError::NotFound(format!(
                            "{} {wanted} is not installed (installed: {installed})",
                            action.name
                        )));
                    }
                    if !state.present {
                        tracing::info!("{} is not installed, skipping", action.name);
                    }
                    (None, !state.present)
                }
            };
            plan.push(PlannedAction {
                action,
                desired,
                satisfied,
            });
        }

        let batch: Vec<UpdateAction> = plan
            .iter()
            .filter(|planned| !planned.satisfied)
            .map(|planned| planned.action.clone())
            .collect();
        if batch.is_empty() {
            return Ok(Outcome::AlreadySatisfied);
        }

        enter(Phase::Invoking, "update-list");
        self.backend.apply_batch(&batch).await?;

        // Skipped actions are checked too; the batch may have undone them
        enter(Phase::PostChecking, "update-list");
        for PlannedAction { action, desired, .. } in &plan {
            match action.kind {
                UpdateKind::Install => {
                    self.verifier
                        .confirm_installed(&action.name, desired.as_deref())
                        .await?;
                }
                UpdateKind::Remove => self.verifier.confirm_absent(&action.name).await?,
            }
        }
        Ok(Outcome::Success)
    }
}
