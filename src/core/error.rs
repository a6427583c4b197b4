//! Error types for the plugin with helpful suggestions

use std::path::PathBuf;

use thiserror::Error;

/// Convenience Result type for adapter operations
pub type Result<T> = std::result::Result<T, PluginError>;

/// Everything a package backend can report.
///
/// Raised at the backend boundary and never shown to the caller as-is:
/// the adapter reclassifies each variant into a [`PluginError`].
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to run `{cmd}`: {source}")]
    Exec {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{cmd}` did not finish within {secs}s and was killed")]
    TimedOut { cmd: String, secs: u64 },

    #[error("`{cmd}` was interrupted by a signal")]
    Interrupted { cmd: String },

    #[error("The package database is locked by another process: {detail}")]
    LockBusy { detail: String },

    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("`{cmd}` failed with exit code {code}: {detail}")]
    CommandFailed {
        cmd: String,
        code: i32,
        detail: String,
    },

    #[error("Not a valid package artifact: {}: {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("Cannot read package state from {}: {reason}", path.display())]
    State { path: PathBuf, reason: String },

    #[error("Operation not supported by the {backend} backend: {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },
}

impl BackendError {
    pub fn exec(cmd: impl Into<String>, source: std::io::Error) -> Self {
        Self::Exec {
            cmd: cmd.into(),
            source,
        }
    }

    pub fn invalid_artifact(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidArtifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn state(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::State {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Classified failure of one plugin invocation.
///
/// Each variant maps to exactly one exit code through
/// [`Outcome`](crate::core::Outcome).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BackendError> for PluginError {
    fn from(err: BackendError) -> Self {
        let detail = err.to_string();
        match err {
            BackendError::PackageNotFound(_) => Self::NotFound(detail),
            BackendError::Unsupported { .. } => Self::Unsupported(detail),
            BackendError::LockBusy { .. }
            | BackendError::CommandFailed { .. }
            | BackendError::Interrupted { .. } => Self::Backend(detail),
            // A local artifact that cannot be opened or parsed is an internal
            // error: callers branch on exit code 5 for exactly this case.
            BackendError::InvalidArtifact { .. }
            | BackendError::Exec { .. }
            | BackendError::TimedOut { .. }
            | BackendError::State { .. } => Self::Internal(detail),
        }
    }
}

impl PluginError {
    /// Get a helpful suggestion for how to fix this error
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        let msg = self.to_string().to_lowercase();
        match self {
            Self::InvalidInput(_) => Some(
                "Usage: install <name> [--file <path>] [--version <v>] | remove <name> | list | prepare | finalize | update-list",
            ),
            Self::NotFound(_) => Some("Run `prepare` to refresh the package index, then retry"),
            Self::Backend(_) if msg.contains("locked") => {
                Some("Another package operation is running; retry once it has finished")
            }
            Self::Unsupported(_) => Some(
                "Set `batch_updates = true` in the plugin configuration or send install/remove one by one",
            ),
            Self::Internal(_) if msg.contains("artifact") => {
                Some("Check that the file path is correct and points to a readable .deb file")
            }
            Self::Backend(_) | Self::Internal(_) => None,
        }
    }
}

/// Format an error with its suggestion for display
pub fn format_error_with_suggestion(err: &PluginError) -> String {
    let mut msg = format!("ERROR: {err}");
    if let Some(suggestion) = err.suggestion() {
        msg.push_str("\nhint: ");
        msg.push_str(suggestion);
    }
    msg
}
