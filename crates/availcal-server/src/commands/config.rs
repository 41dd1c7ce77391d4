//! Configuration commands.

use crate::config::AppConfig;
use crate::error::{ServerError, ServerResult};

use super::build_aggregator;

/// Dump the current configuration to stdout.
pub fn dump(config: &AppConfig) -> ServerResult<()> {
    let toml_str = toml::to_string_pretty(&config.redacted())
        .map_err(|e| ServerError::config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", AppConfig::default_path().display());
    println!("{}", toml_str);
    Ok(())
}

/// Validate the configuration: sources resolve and the fetcher builds.
pub fn validate(config: &AppConfig) -> ServerResult<()> {
    let aggregator = build_aggregator(config)?;
    println!(
        "Configuration is valid ({} sources).",
        aggregator.registry().len()
    );
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> ServerResult<()> {
    println!("config: {}", AppConfig::default_path().display());
    Ok(())
}
