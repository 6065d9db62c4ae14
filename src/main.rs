//! androidtool entry point
//!
//! Parses the command line, sets up logging and runs one command.

use std::process::ExitCode;

use androidtool::cli::Cli;
use androidtool::commands;
use androidtool_core::{AndroidToolError, APP_NAME, VERSION};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    debug!("{} v{}", APP_NAME, VERSION);

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; RUST_LOG overrides the verbosity flag
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn describe(e: &anyhow::Error) -> String {
    match e.downcast_ref::<AndroidToolError>() {
        Some(err) => err.user_message(),
        None => format!("{:#}", e),
    }
}
