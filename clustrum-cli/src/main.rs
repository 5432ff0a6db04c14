//! `clustrum` binary.
//!
//! Scores a delimited cluster/class assignment file and prints the purity and
//! NMI report on stdout. Failures are logged on stderr with the stable error
//! code and, for malformed input, the offending line.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use clustrum_cli::{
    cli::{Cli, CliError, ScoreSummary, render_summary, run_cli},
    logging,
};
use tracing::{error, field};

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_without_subscriber(&format!("cannot set up logging: {err}"));
        return ExitCode::FAILURE;
    }

    let outcome = run_cli(Cli::parse())
        .context("scoring failed")
        .and_then(|summary| print_report(&summary));
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_failure(&err);
            ExitCode::FAILURE
        }
    }
}

fn print_report(summary: &ScoreSummary) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    render_summary(summary, &mut stdout).context("failed to write report")?;
    stdout.flush().context("failed to flush report")
}

fn log_failure(err: &anyhow::Error) {
    let cli_error = err.downcast_ref::<CliError>();
    error!(
        error = %err,
        cause = %err.root_cause(),
        code = cli_error.and_then(CliError::core_code).map(field::display),
        dataset_code = cli_error.and_then(CliError::dataset_code).map(field::display),
        line = cli_error.and_then(CliError::line),
        "clustrum score failed"
    );
}

#[expect(
    clippy::print_stderr,
    reason = "no subscriber exists yet to carry the message"
)]
fn report_without_subscriber(message: &str) {
    eprintln!("clustrum: {message}");
}
