//! Privilege helpers
//!
//! apt-get needs root to mutate the package database. When the agent runs
//! the plugin unprivileged and `use_sudo` is set, commands are wrapped in
//! `sudo --`.

/// Check if we're running as root
#[must_use]
pub fn is_root() -> bool {
    rustix::process::geteuid().is_root()
}

/// Program and leading arguments for a command that needs root
#[must_use]
pub fn elevated_argv(program: &str, use_sudo: bool) -> (String, Vec<String>) {
    if use_sudo && !is_root() {
        ("sudo".to_string(), vec!["--".to_string(), program.to_string()])
    } else {
        (program.to_string(), Vec::new())
    }
}
