//! Error types for feed operations.
//!
//! Every error is scoped to a single calendar source. A failing source is
//! excluded from the aggregation; it never aborts the other sources.

use std::fmt;
use thiserror::Error;

/// The pipeline stage at which a source failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// The feed could not be retrieved.
    Fetch,
    /// The feed was retrieved but could not be decoded.
    Parse,
}

/// The category of a feed error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedErrorCode {
    /// Connection failed, DNS resolution, TLS, reset, etc.
    NetworkError,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The server answered with a non-2xx status.
    HttpStatus,
    /// The response body could not be read or decoded.
    InvalidResponse,
    /// The body is not a usable iCalendar document.
    ParseError,
    /// The fetcher itself is misconfigured.
    ConfigurationError,
    /// Unexpected state, e.g. the task processing the source panicked.
    InternalError,
}

impl FeedErrorCode {
    /// Returns the stage this kind of error belongs to.
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::ParseError => FailureStage::Parse,
            Self::NetworkError
            | Self::Timeout
            | Self::HttpStatus
            | Self::InvalidResponse
            | Self::ConfigurationError
            | Self::InternalError => FailureStage::Fetch,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::HttpStatus => "http_status",
            Self::InvalidResponse => "invalid_response",
            Self::ParseError => "parse_error",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for FeedErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error that occurred while fetching or parsing one source's feed.
#[derive(Debug, Error)]
pub struct FeedError {
    code: FeedErrorCode,
    message: String,
    /// Name of the calendar source, once known.
    source_name: Option<String>,
    /// HTTP status, for [`FeedErrorCode::HttpStatus`].
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl FeedError {
    pub fn new(code: FeedErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source_name: None,
            status: None,
            source: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FeedErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FeedErrorCode::Timeout, message)
    }

    /// Creates an error for a non-2xx response.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        let mut err = Self::new(FeedErrorCode::HttpStatus, message);
        err.status = Some(status);
        err
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(FeedErrorCode::InvalidResponse, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(FeedErrorCode::ParseError, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FeedErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FeedErrorCode::InternalError, message)
    }

    /// Sets the calendar source this error belongs to.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> FeedErrorCode {
        self.code
    }

    pub fn stage(&self) -> FailureStage {
        self.code.stage()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref name) = self.source_name {
            write!(f, "[{}] ", name)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
