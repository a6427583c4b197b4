//! Input validation for package names and versions
//!
//! Names and versions end up as separate apt-get arguments. Rejecting
//! anything outside the Debian character sets keeps a caller-supplied value
//! from ever being parsed as an apt-get option or a `name=version` pair.

use crate::core::error::{PluginError, Result};

/// Validate a Debian package name.
///
/// Debian policy: at least two characters, lowercase alphanumerics plus
/// `+`, `-` and `.`, starting with an alphanumeric.
pub fn validate_package_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PluginError::InvalidInput("missing package name".to_string()));
    }

    const MAX_LENGTH: usize = 200;
    if name.len() > MAX_LENGTH {
        return Err(PluginError::InvalidInput(format!(
            "package name too long (max {MAX_LENGTH} characters)"
        )));
    }

    if name.len() < 2 {
        return Err(PluginError::InvalidInput(format!(
            "package name '{name}' is too short"
        )));
    }

    if !name.starts_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return Err(PluginError::InvalidInput(format!(
            "package name '{name}' must start with a lowercase letter or digit"
        )));
    }

    if let Some(c) = name
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '+' | '-' | '.'))
    {
        return Err(PluginError::InvalidInput(format!(
            "invalid character '{c}' in package name '{name}'"
        )));
    }

    Ok(())
}

/// Validate a Debian version string (`[epoch:]upstream[-revision]`).
pub fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(PluginError::InvalidInput("empty version".to_string()));
    }

    if !version.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(PluginError::InvalidInput(format!(
            "version '{version}' must start with a digit"
        )));
    }

    if let Some(c) = version
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '~' | ':' | '-')))
    {
        return Err(PluginError::InvalidInput(format!(
            "invalid character '{c}' in version '{version}'"
        )));
    }

    Ok(())
}
