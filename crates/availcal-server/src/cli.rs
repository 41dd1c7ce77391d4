//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use availcal_core::TracingConfig;
use clap::{Parser, Subcommand};
use tracing::Level;

/// availcal - Merged booking availability for a holiday rental
#[derive(Debug, Parser)]
#[command(name = "availcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "AVAILCAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Returns the logging setup for the selected command.
    pub fn tracing_config(&self) -> TracingConfig {
        if self.debug {
            return TracingConfig::cli_debug();
        }
        match self.command {
            None | Some(Command::Serve { .. }) => TracingConfig::server(),
            Some(_) => TracingConfig::cli_debug().with_level(Level::WARN),
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Address to listen on, overrides `server.bind`
        #[arg(long, env = "AVAILCAL_BIND")]
        bind: Option<SocketAddr>,
    },

    /// Aggregate all sources once and print the booked days
    Check {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration, with feed tokens redacted
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
