//! Feed fetching and iCalendar parsing.
//!
//! - [`FeedFetcher`] - Retrieves the raw calendar text of one source
//! - [`HttpFeedFetcher`] - The HTTP implementation used in production
//! - [`parse_feed`] - Decodes a [`RawFeed`] into booking events
//! - [`FeedError`] - Source-scoped fetch and parse failures
//!
//! # Pipeline
//!
//! ```text
//! CalendarSource ──fetch──▶ RawFeed ──parse_feed──▶ ParsedFeed { events }
//!                  │                     │
//!                  ▼                     ▼
//!             FetchError            ParseError
//! ```
//!
//! Errors are scoped to one source; callers decide whether a failure is
//! fatal. Normalization of events into days lives in `availcal-core`.

pub mod error;
pub mod feed;
pub mod fetcher;
pub mod ics;

pub use error::{FailureStage, FeedError, FeedErrorCode, FeedResult};
pub use feed::{ParsedFeed, RawFeed};
pub use fetcher::{BoxFuture, FeedFetcher, FetchConfig, HttpFeedFetcher};
pub use ics::parse_feed;
