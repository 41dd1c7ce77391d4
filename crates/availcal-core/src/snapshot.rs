//! The aggregated availability value handed to consumers.
//!
//! An [`AvailabilitySnapshot`] is recomputed on every request and never
//! persisted. Consumers answer "is this day booked?" with
//! [`AvailabilitySnapshot::is_booked`] instead of re-deriving it from raw
//! feed data.
//!
//! A day present in the snapshot is reported as unavailable by at least one
//! source. A day absent from it is only *probably* free: the property may be
//! booked through a channel that is not registered, or a source may have
//! failed during this aggregation (see [`AvailabilitySnapshot::is_partial`]).

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::merge::DayMerger;
use crate::time::BookedDay;

/// Outcome category of a single source during one aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// The feed was fetched and parsed.
    Ok,
    /// The feed could not be retrieved.
    FetchFailed,
    /// The feed was retrieved but is not usable calendar data.
    ParseFailed,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::FetchFailed => "fetch_failed",
            Self::ParseFailed => "parse_failed",
        }
    }
}

/// Per-source report attached to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub status: SourceStatus,
    /// Booking events accepted from this source.
    pub events: usize,
    /// Entries dropped because they were malformed.
    pub skipped_entries: usize,
    /// Days this source reported, before merging.
    pub booked_days: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceSummary {
    /// Creates a summary for a source that was processed.
    pub fn ok(name: impl Into<String>, events: usize, skipped: usize, booked_days: usize) -> Self {
        Self {
            name: name.into(),
            status: SourceStatus::Ok,
            events,
            skipped_entries: skipped,
            booked_days,
            error: None,
        }
    }

    /// Creates a summary for a source that failed.
    pub fn failed(name: impl Into<String>, status: SourceStatus, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            events: 0,
            skipped_entries: 0,
            booked_days: 0,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == SourceStatus::Ok
    }
}

/// Merged set of booked days plus provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilitySnapshot {
    booked_days: BTreeSet<BookedDay>,
    generated_at: DateTime<Utc>,
    sources: Vec<SourceSummary>,
}

impl AvailabilitySnapshot {
    /// Creates a snapshot from merged days.
    pub fn new(merger: DayMerger, generated_at: DateTime<Utc>) -> Self {
        Self {
            booked_days: merger.into_set(),
            generated_at,
            sources: Vec::new(),
        }
    }

    /// Builder method to attach per-source summaries.
    pub fn with_sources(mut self, sources: Vec<SourceSummary>) -> Self {
        self.sources = sources;
        self
    }

    /// Returns true if any source reports `date` as unavailable.
    pub fn is_booked(&self, date: NaiveDate) -> bool {
        self.booked_days.contains(&BookedDay::new(date))
    }

    pub fn contains(&self, day: &BookedDay) -> bool {
        self.booked_days.contains(day)
    }

    /// Booked days in ascending order.
    pub fn booked_days(&self) -> impl ExactSizeIterator<Item = &BookedDay> + '_ {
        self.booked_days.iter()
    }

    /// Booked days as ascending `YYYY-MM-DD` strings.
    pub fn to_strings(&self) -> Vec<String> {
        self.booked_days.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.booked_days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.booked_days.is_empty()
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn sources(&self) -> &[SourceSummary] {
        &self.sources
    }

    /// Returns true if at least one source failed during this aggregation.
    pub fn is_partial(&self) -> bool {
        self.sources.iter().any(|s| !s.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(days: &[&str]) -> AvailabilitySnapshot {
        let merger: DayMerger = days.iter().map(|s| s.parse().unwrap()).collect();
        AvailabilitySnapshot::new(merger, Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn membership_queries() {
        let snap = snapshot(&["2025-09-12", "2025-09-10"]);

        assert!(snap.is_booked(NaiveDate::from_ymd_opt(2025, 9, 10).unwrap()));
        assert!(!snap.is_booked(NaiveDate::from_ymd_opt(2025, 9, 11).unwrap()));
        assert!(snap.contains(&"2025-09-12".parse().unwrap()));
        assert_eq!(snap.len(), 2);
        assert!(!snap.is_empty());
    }

    #[test]
    fn strings_are_ascending() {
        let snap = snapshot(&["2025-10-01", "2025-09-10", "2025-09-30"]);
        assert_eq!(
            snap.to_strings(),
            vec!["2025-09-10", "2025-09-30", "2025-10-01"]
        );
        assert_eq!(snap.booked_days().len(), 3);
    }

    #[test]
    fn partial_when_any_source_failed() {
        let snap = snapshot(&["2025-09-10"]);
        assert!(!snap.is_partial());

        let snap = snap.with_sources(vec![
            SourceSummary::ok("Booking.com", 1, 0, 1),
            SourceSummary::failed("Airbnb", SourceStatus::FetchFailed, "HTTP 503"),
        ]);
        assert!(snap.is_partial());
        assert_eq!(snap.sources().len(), 2);
        assert_eq!(snap.sources()[1].error.as_deref(), Some("HTTP 503"));
    }

    #[test]
    fn summary_serialization_skips_missing_error() {
        let json = serde_json::to_value(SourceSummary::ok("Airbnb", 2, 1, 5)).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["skipped_entries"], 1);
        assert!(json.get("error").is_none());

        let json = serde_json::to_value(SourceSummary::failed(
            "Airbnb",
            SourceStatus::ParseFailed,
            "not a calendar",
        ))
        .unwrap();
        assert_eq!(json["status"], "parse_failed");
        assert_eq!(json["error"], "not a calendar");
    }
}
