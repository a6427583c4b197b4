//! CLI module for apt-plugin
//!
//! Argument parsing, request dispatch and the adapter that drives a request
//! through the backend.

pub mod adapter;
mod args;
pub mod dispatch;

use std::io::{self, BufRead, Write};

use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::core::{Outcome, format_error_with_suggestion};
use crate::package_managers::select_backend;

pub use adapter::{Adapter, Phase};
pub use args::{Cli, Commands};
pub use dispatch::Request;

/// Environment variable holding an explicit log filter
pub const LOG_ENV: &str = "APT_PLUGIN_LOG";

/// Log filter for this invocation: `APT_PLUGIN_LOG`, else `--verbose` count, else
/// the configured level
#[must_use]
pub fn log_filter(verbose: u8, configured: &str) -> EnvFilter {
    if let Ok(filter) = std::env::var(LOG_ENV)
        && !filter.trim().is_empty()
        && let Ok(filter) = EnvFilter::try_new(&filter)
    {
        return filter;
    }

    let level = match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Initialize tracing on stderr; stdout is reserved for `list` output
pub fn init_tracing(verbose: u8, configured: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, configured))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Run one parsed invocation against the selected backend
pub async fn run<R: BufRead, W: Write>(
    cli: Cli,
    settings: &Settings,
    stdin: R,
    stdout: &mut W,
) -> Outcome {
    let verb = cli.command.verb();
    adapter::enter(Phase::Dispatching, verb);

    let request = match dispatch::build_request(cli.command, stdin) {
        Ok(request) => request,
        Err(err) => return Outcome::from(err),
    };

    let backend = select_backend(settings);
    tracing::debug!(backend = backend.name(), "selected backend");
    Adapter::new(backend.as_ref(), settings.batch_updates)
        .run(request, stdout)
        .await
}

/// Write the error of a failed outcome to `err_out`.
///
/// Write failures are dropped: a closed stderr must not change the exit code.
pub fn report<W: Write>(outcome: &Outcome, err_out: &mut W) {
    if let Some(err) = outcome.error() {
        let _ = writeln!(err_out, "{}", format_error_with_suggestion(&err));
        let _ = err_out.flush();
    }
}
