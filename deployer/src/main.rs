//! kdeploy - Entry Point
//!
//! Installs KonText releases and keeps every installed release as an archive
//! that can be redeployed later.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use kdeploy::app::run::failure_message;
use kdeploy::app::{run, Cli};
use kdeploy::logs::{init_logging, LogOptions};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(LogOptions {
        log_level: cli.log_level,
        json_format: cli.json_logs,
    }) {
        eprintln!("{}", e);
    }

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("{:?}", e);
            eprintln!("{}", failure_message(&e));
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
