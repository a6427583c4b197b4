//! Plugin configuration

mod settings;

pub use settings::{AptSettings, Settings};
