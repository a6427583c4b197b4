//! Test infrastructure shared by unit and integration tests
//!
//! This module provides:
//! - `.deb` artifact builders
//! - dpkg status database builders

pub mod fixtures;

pub use fixtures::*;
