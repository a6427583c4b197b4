//! apt-plugin binary
//!
//! Software-management plugin CLI: one verb per process, result in the exit code.

use std::io;
use std::panic::AssertUnwindSafe;
use std::process::ExitCode;

use clap::Parser;
use futures::FutureExt;

use apt_plugin_lib::cli::{self, Cli, Phase, dispatch};
use apt_plugin_lib::config::Settings;
use apt_plugin_lib::core::Outcome;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            return match dispatch::parse_error_outcome(&err) {
                None => {
                    let _ = err.print();
                    ExitCode::SUCCESS
                }
                Some(outcome) => finish(&outcome),
            };
        }
    };

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            cli::init_tracing(cli.verbose, &Settings::default().log_level);
            return finish(&Outcome::InternalError(format!("{err:#}")));
        }
    };
    cli::init_tracing(cli.verbose, &settings.log_level);

    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let outcome = AssertUnwindSafe(cli::run(cli, &settings, stdin, &mut stdout))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|msg| (*msg).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Outcome::InternalError(format!("panicked: {detail}"))
        });

    finish(&outcome)
}

/// Report a failed outcome on stderr and convert it to the process exit code
fn finish(outcome: &Outcome) -> ExitCode {
    cli::report(outcome, &mut io::stderr());
    tracing::debug!(phase = %Phase::Exiting, exit_code = %outcome.exit_code(), "phase");
    outcome.exit_code().into()
}
