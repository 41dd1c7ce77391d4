//! Subcommand implementations.

pub mod check;
pub mod config;
pub mod serve;

use std::sync::Arc;

use availcal_feeds::HttpFeedFetcher;
use tracing::warn;

use crate::aggregator::Aggregator;
use crate::config::AppConfig;
use crate::error::ServerResult;

/// Wires the configured sources to an HTTP fetcher.
pub fn build_aggregator(config: &AppConfig) -> ServerResult<Aggregator> {
    let registry = config.registry()?;
    if registry.is_empty() {
        warn!("No calendar sources configured, every day will be reported as free");
    }
    let fetcher = HttpFeedFetcher::new(config.fetch_config()?)?;
    Ok(Aggregator::new(registry, Arc::new(fetcher)))
}
