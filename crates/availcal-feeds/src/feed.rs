//! Feed payloads as they move through the pipeline.

use availcal_core::{BookingEvent, CalendarSource};

/// Raw calendar text of one source, as returned by the fetcher.
#[derive(Debug, Clone)]
pub struct RawFeed {
    source: CalendarSource,
    body: String,
}

impl RawFeed {
    pub fn new(source: CalendarSource, body: impl Into<String>) -> Self {
        Self {
            source,
            body: body.into(),
        }
    }

    pub fn source(&self) -> &CalendarSource {
        &self.source
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Booking events decoded from one feed.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Usable bookings, in feed order.
    pub events: Vec<BookingEvent>,
    /// `VEVENT` entries dropped because their dates could not be trusted.
    pub skipped: usize,
    /// `VEVENT` entries ignored because they are cancelled.
    pub cancelled: usize,
}
