//! Invocation outcomes and their process exit codes
//!
//! The exit codes are a compatibility surface: callers branch on them
//! without parsing any output, so the mapping below must never change.

use std::fmt;

use crate::core::error::PluginError;

/// Result of one plugin invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    AlreadySatisfied,
    NotFound(String),
    InvalidInput(String),
    Unsupported(String),
    BackendFailure(String),
    InternalError(String),
}

impl Outcome {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self)
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::AlreadySatisfied)
    }

    /// The failure behind this outcome, if any
    #[must_use]
    pub fn error(&self) -> Option<PluginError> {
        match self {
            Self::Success | Self::AlreadySatisfied => None,
            Self::NotFound(msg) => Some(PluginError::NotFound(msg.clone())),
            Self::InvalidInput(msg) => Some(PluginError::InvalidInput(msg.clone())),
            Self::Unsupported(msg) => Some(PluginError::Unsupported(msg.clone())),
            Self::BackendFailure(msg) => Some(PluginError::Backend(msg.clone())),
            Self::InternalError(msg) => Some(PluginError::Internal(msg.clone())),
        }
    }
}

impl From<PluginError> for Outcome {
    fn from(err: PluginError) -> Self {
        match err {
            PluginError::InvalidInput(msg) => Self::InvalidInput(msg),
            PluginError::NotFound(msg) => Self::NotFound(msg),
            PluginError::Unsupported(msg) => Self::Unsupported(msg),
            PluginError::Backend(msg) => Self::BackendFailure(msg),
            PluginError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

/// Process exit codes of the plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExitCode {
    /// Success, or the system was already in the requested state
    Success = 0,
    /// Remove of an absent package, or unknown package name
    NotFound = 1,
    /// Unknown verb or invalid arguments
    InvalidInput = 2,
    /// Operation not supported by this backend
    Unsupported = 3,
    /// The package manager ran and reported a recoverable problem
    BackendFailure = 4,
    /// Anything unexpected, including an unusable local artifact
    InternalError = 5,
}

impl ExitCode {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Success,
            Self::NotFound,
            Self::InvalidInput,
            Self::Unsupported,
            Self::BackendFailure,
            Self::InternalError,
        ]
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<&Outcome> for ExitCode {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success | Outcome::AlreadySatisfied => Self::Success,
            Outcome::NotFound(_) => Self::NotFound,
            Outcome::InvalidInput(_) => Self::InvalidInput,
            Outcome::Unsupported(_) => Self::Unsupported,
            Outcome::BackendFailure(_) => Self::BackendFailure,
            Outcome::InternalError(_) => Self::InternalError,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code.code())
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
