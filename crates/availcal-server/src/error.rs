//! Server error types.

use std::io;

use availcal_core::{SourceError, TracingError};
use availcal_feeds::FeedError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (config file, listener, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A configured calendar source is invalid.
    #[error("Invalid calendar source: {0}")]
    Source(#[from] SourceError),

    /// The feed fetcher could not be created.
    #[error("Feed fetcher error: {0}")]
    Fetcher(#[from] FeedError),

    /// Every calendar source failed.
    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] AggregationFailure),

    /// Logging could not be initialized.
    #[error("Tracing error: {0}")]
    Tracing(#[from] TracingError),
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Returned when no calendar source produced usable data.
///
/// Individual source failures are absorbed by the aggregator; this is the
/// only failure that reaches the API boundary.
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct AggregationFailure {
    cause: String,
    failures: Vec<FeedError>,
}

impl AggregationFailure {
    pub const NO_SOURCES_REACHABLE: &'static str = "no sources reachable";

    /// Creates a failure for the case where every source failed.
    pub fn no_sources_reachable(failures: Vec<FeedError>) -> Self {
        Self {
            cause: Self::NO_SOURCES_REACHABLE.to_string(),
            failures,
        }
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }

    /// The per-source errors, in registry order.
    pub fn failures(&self) -> &[FeedError] {
        &self.failures
    }

    /// One line per failed source, for diagnostics.
    pub fn details(&self) -> String {
        if self.failures.is_empty() {
            return self.cause.clone();
        }
        let lines: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
        format!("{}: {}", self.cause, lines.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_details_list_sources() {
        let failure = AggregationFailure::no_sources_reachable(vec![
            FeedError::http_status(503, "HTTP 503").with_source_name("Booking.com"),
            FeedError::timeout("timed out").with_source_name("Airbnb"),
        ]);

        assert_eq!(failure.to_string(), "no sources reachable");
        assert_eq!(failure.cause(), AggregationFailure::NO_SOURCES_REACHABLE);
        assert_eq!(failure.failures().len(), 2);

        let details = failure.details();
        assert!(details.starts_with("no sources reachable: "));
        assert!(details.contains("[Booking.com] http_status"));
        assert!(details.contains("[Airbnb] timeout"));
    }

    #[test]
    fn config_error_display() {
        let err = ServerError::config("bind address missing");
        assert_eq!(err.to_string(), "Configuration error: bind address missing");
    }
}
