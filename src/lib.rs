//! apt-plugin library - shared code for the plugin binary and its tests
//!
//! The plugin translates the software-management verbs (`install`, `remove`,
//! `list`, `prepare`, `finalize`, `update-list`) into apt/dpkg operations and
//! reports every outcome through a fixed set of exit codes.

// Production-ready clippy configuration
#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::suspicious)]
// Allow documentation lints - internal code, not public API
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod cli;
pub mod config;
pub mod core;
pub mod package_managers;
