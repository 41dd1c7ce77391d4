//! availcal entry point.

use std::process::ExitCode;

use availcal_core::init_tracing;
use clap::Parser;

use availcal_server::cli::{Cli, Command, ConfigAction};
use availcal_server::commands;
use availcal_server::config::AppConfig;
use availcal_server::error::ServerResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.tracing_config()) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "availcal failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let config = match cli.config {
        Some(ref path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        None => commands::serve::run(&config, None).await,
        Some(Command::Serve { bind }) => commands::serve::run(&config, bind).await,
        Some(Command::Check { json }) => commands::check::run(&config, json).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
