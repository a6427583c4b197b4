//! Core module - shared types, outcomes, errors and utilities

mod error;
mod outcome;
pub mod paths;
pub mod privilege;
pub mod testing;
mod types;
pub mod validation;
mod verifier;

pub use error::{BackendError, PluginError, Result, format_error_with_suggestion};
pub use outcome::{ExitCode, Outcome};
pub use privilege::is_root;
pub use types::*;
pub use verifier::StateVerifier;
