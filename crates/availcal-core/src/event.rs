//! Booking events as published by a calendar source.

use serde::Serialize;
use thiserror::Error;

use crate::time::EventDate;

/// Error returned when a booking ends before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("booking ends ({end:?}) before it starts ({start:?})")]
pub struct InvalidEventRange {
    /// The rejected start.
    pub start: EventDate,
    /// The rejected end.
    pub end: EventDate,
}

/// One reservation or block published by a source.
///
/// The start never comes after the end; [`BookingEvent::new`] enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingEvent {
    /// Free-text summary, if the source provided one.
    pub summary: Option<String>,
    start: EventDate,
    end: EventDate,
}

impl BookingEvent {
    /// Creates a booking spanning `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEventRange`] if `end` is earlier than `start`.
    pub fn new(start: EventDate, end: EventDate) -> Result<Self, InvalidEventRange> {
        if end < start {
            return Err(InvalidEventRange { start, end });
        }
        Ok(Self {
            summary: None,
            start,
            end,
        })
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn start(&self) -> EventDate {
        self.start
    }

    pub fn end(&self) -> EventDate {
        self.end
    }

    /// Returns true if the source encoded the start as a bare date.
    pub fn is_all_day(&self) -> bool {
        self.start.is_date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> EventDate {
        EventDate::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn accepts_equal_start_and_end() {
        let event = BookingEvent::new(date(2025, 9, 10), date(2025, 9, 10)).unwrap();
        assert!(event.is_all_day());
        assert!(event.summary.is_none());
    }

    #[test]
    fn rejects_end_before_start() {
        let err = BookingEvent::new(date(2025, 9, 13), date(2025, 9, 10)).unwrap_err();
        assert_eq!(err.start, date(2025, 9, 13));
        assert!(err.to_string().contains("before it starts"));
    }

    #[test]
    fn timed_event_is_not_all_day() {
        let start = EventDate::DateTime(Utc.with_ymd_and_hms(2025, 9, 10, 15, 0, 0).unwrap());
        let end = EventDate::DateTime(Utc.with_ymd_and_hms(2025, 9, 12, 11, 0, 0).unwrap());
        let event = BookingEvent::new(start, end)
            .unwrap()
            .with_summary("Reserved");

        assert!(!event.is_all_day());
        assert_eq!(event.summary.as_deref(), Some("Reserved"));
        assert_eq!(event.start(), start);
        assert_eq!(event.end(), end);
    }
}
