//! Availability server: aggregation, HTTP API, CLI.
//!
//! This crate wires the pieces together:
//! - [`Aggregator`] fans out over all calendar sources concurrently and
//!   merges their booked days, tolerating partial failure
//! - [`api::router`] exposes the result as `GET /availability`
//! - [`AppConfig`] loads sources and settings from `config.toml`
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use availcal_feeds::{FetchConfig, HttpFeedFetcher};
//! use availcal_server::{AppConfig, Aggregator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let fetcher = HttpFeedFetcher::new(FetchConfig::default())?;
//!     let aggregator = Aggregator::new(config.registry()?, Arc::new(fetcher));
//!
//!     let snapshot = aggregator.aggregate().await?;
//!     println!("{:?}", snapshot.to_strings());
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod observer;
pub mod signals;

#[cfg(test)]
mod testing;

pub use aggregator::{Aggregator, SourceOutcome, SourceReport};
pub use api::{ApiError, AppState, AvailabilityResponse, ErrorResponse, router};
pub use config::{AppConfig, FetchSettings, ServerSettings, SourceSettings};
pub use error::{AggregationFailure, ServerError, ServerResult};
pub use observer::{AggregationObserver, TracingObserver};
pub use signals::ShutdownHandle;
