//! Hooks into the aggregation lifecycle.
//!
//! The aggregator reports per-source outcomes and the final result to an
//! [`AggregationObserver`]. The default observer writes structured logs;
//! tests inject a recording observer instead.

use std::time::Duration;

use availcal_core::AvailabilitySnapshot;
use tracing::{info, warn};

use crate::aggregator::SourceOutcome;
use crate::error::AggregationFailure;

/// Receives aggregation events. All methods default to doing nothing.
pub trait AggregationObserver: Send + Sync {
    /// Called once per source, in completion order.
    fn source_completed(&self, _outcome: &SourceOutcome) {}

    /// Called when a snapshot was produced, possibly partial.
    fn aggregation_completed(&self, _snapshot: &AvailabilitySnapshot, _elapsed: Duration) {}

    /// Called when every source failed.
    fn aggregation_failed(&self, _failure: &AggregationFailure, _elapsed: Duration) {}
}

/// Logs aggregation events with `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl AggregationObserver for TracingObserver {
    fn source_completed(&self, outcome: &SourceOutcome) {
        let elapsed_ms = outcome.elapsed.as_millis() as u64;
        match &outcome.result {
            Ok(report) => info!(
                source = %outcome.name,
                events = report.events,
                skipped = report.skipped,
                days = report.days.len(),
                elapsed_ms,
                "Source aggregated"
            ),
            Err(e) => warn!(
                source = %outcome.name,
                code = %e.code(),
                error = %e,
                elapsed_ms,
                "Source failed, excluding it from availability"
            ),
        }
    }

    fn aggregation_completed(&self, snapshot: &AvailabilitySnapshot, elapsed: Duration) {
        let failed = snapshot.sources().iter().filter(|s| !s.is_ok()).count();
        info!(
            booked_days = snapshot.len(),
            sources = snapshot.sources().len(),
            failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "Availability aggregated"
        );
    }

    fn aggregation_failed(&self, failure: &AggregationFailure, elapsed: Duration) {
        warn!(
            error = %failure.details(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Availability aggregation failed"
        );
    }
}
