//! Concurrent aggregation of all registered calendar sources.
//!
//! Every source is processed by its own task: fetch, parse, normalize into
//! booked days. Tasks share nothing while running; their per-source results
//! are merged once all of them have finished. A failing source is reported
//! and excluded, it never aborts the others.
//!
//! ```text
//! SourceRegistry ──▶ JoinSet ─┬─ fetch ─▶ parse ─▶ days ─┐
//!                            ├─ fetch ─▶ parse ─▶ days ─┼─▶ DayMerger ─▶ AvailabilitySnapshot
//!                            └─ fetch ─▶ parse ─▶ days ─┘
//! ```
//!
//! Dropping the future returned by [`Aggregator::aggregate`] (for example
//! when the HTTP client disconnects) drops the `JoinSet`, which aborts all
//! in-flight fetches.

use std::sync::Arc;
use std::time::{Duration, Instant};

use availcal_core::{
    AvailabilitySnapshot, BookedDay, CalendarSource, DayMerger, SourceRegistry, SourceStatus,
    SourceSummary, day_range,
};
use availcal_feeds::{FailureStage, FeedError, FeedFetcher, FeedResult, parse_feed};
use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info_span, warn};

use crate::error::AggregationFailure;
use crate::observer::{AggregationObserver, TracingObserver};

/// What one source contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    /// Booked days of this source, sorted and deduplicated.
    pub days: Vec<BookedDay>,
    pub events: usize,
    pub skipped: usize,
    pub cancelled: usize,
}

/// The result of processing one source.
#[derive(Debug)]
pub struct SourceOutcome {
    pub name: String,
    pub result: FeedResult<SourceReport>,
    pub elapsed: Duration,
}

impl SourceOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Fans out over the registry and merges the results.
pub struct Aggregator {
    registry: SourceRegistry,
    fetcher: Arc<dyn FeedFetcher>,
    observer: Arc<dyn AggregationObserver>,
}

impl Aggregator {
    /// Creates an aggregator that logs through [`TracingObserver`].
    pub fn new(registry: SourceRegistry, fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self {
            registry,
            fetcher,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the observer.
    pub fn with_observer(mut self, observer: Arc<dyn AggregationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Fetches every source concurrently and merges their booked days.
    ///
    /// Each call is independent: nothing is cached between calls.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationFailure`] only if the registry is non-empty and
    /// every source failed. Partial failure still yields a snapshot.
    pub async fn aggregate(&self) -> Result<AvailabilitySnapshot, AggregationFailure> {
        let started = Instant::now();
        debug!(
            sources = self.registry.len(),
            fetcher = self.fetcher.name(),
            "Starting aggregation"
        );

        let mut tasks = JoinSet::new();
        for (index, source) in self.registry.iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let source = source.clone();
            let span = info_span!("source", name = %source.name());
            tasks.spawn(
                async move { (index, process_source(fetcher.as_ref(), &source).await) }
                    .instrument(span),
            );
        }

        let mut slots: Vec<Option<SourceOutcome>> =
            std::iter::repeat_with(|| None).take(self.registry.len()).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    self.observer.source_completed(&outcome);
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
                Err(e) => warn!(error = %e, "Source task did not complete"),
            }
        }

        // A task that panicked left its slot empty.
        let outcomes: Vec<SourceOutcome> = self
            .registry
            .iter()
            .zip(slots)
            .map(|(source, slot)| {
                slot.unwrap_or_else(|| {
                    let outcome = SourceOutcome {
                        name: source.name().to_string(),
                        result: Err(FeedError::internal("Source task terminated unexpectedly")
                            .with_source_name(source.name())),
                        elapsed: started.elapsed(),
                    };
                    self.observer.source_completed(&outcome);
                    outcome
                })
            })
            .collect();

        let elapsed = started.elapsed();
        match assemble(outcomes) {
            Ok(snapshot) => {
                self.observer.aggregation_completed(&snapshot, elapsed);
                Ok(snapshot)
            }
            Err(failure) => {
                self.observer.aggregation_failed(&failure, elapsed);
                Err(failure)
            }
        }
    }
}

/// Runs the pipeline for one source.
async fn process_source(fetcher: &dyn FeedFetcher, source: &CalendarSource) -> SourceOutcome {
    let started = Instant::now();
    let result = fetch_days(fetcher, source)
        .await
        .map_err(|e| e.with_source_name(source.name()));

    SourceOutcome {
        name: source.name().to_string(),
        result,
        elapsed: started.elapsed(),
    }
}

async fn fetch_days(fetcher: &dyn FeedFetcher, source: &CalendarSource) -> FeedResult<SourceReport> {
    let raw = fetcher.fetch(source).await?;
    let parsed = parse_feed(&raw)?;
    let days: DayMerger = parsed.events.iter().flat_map(day_range).collect();

    Ok(SourceReport {
        days: days.finish(),
        events: parsed.events.len(),
        skipped: parsed.skipped,
        cancelled: parsed.cancelled,
    })
}

/// Merges per-source outcomes, given in registry order.
fn assemble(outcomes: Vec<SourceOutcome>) -> Result<AvailabilitySnapshot, AggregationFailure> {
    let total = outcomes.len();
    let mut merger = DayMerger::new();
    let mut summaries = Vec::with_capacity(total);
    let mut failures = Vec::new();

    for SourceOutcome { name, result, .. } in outcomes {
        match result {
            Ok(report) => {
                summaries.push(SourceSummary::ok(
                    name,
                    report.events,
                    report.skipped,
                    report.days.len(),
                ));
                merger.merge(report.days);
            }
            Err(e) => {
                summaries.push(SourceSummary::failed(name, source_status(&e), e.to_string()));
                failures.push(e);
            }
        }
    }

    if total > 0 && failures.len() == total {
        return Err(AggregationFailure::no_sources_reachable(failures));
    }

    Ok(AvailabilitySnapshot::new(merger, Utc::now()).with_sources(summaries))
}

fn source_status(error: &FeedError) -> SourceStatus {
    match error.stage() {
        FailureStage::Fetch => SourceStatus::FetchFailed,
        FailureStage::Parse => SourceStatus::ParseFailed,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use availcal_feeds::{FeedErrorCode, FetchConfig, HttpFeedFetcher};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::testing::{RecordingObserver, Stub, StubFetcher, ics, registry};

    fn days(snapshot: &AvailabilitySnapshot) -> Vec<String> {
        snapshot.to_strings()
    }

    #[tokio::test]
    async fn partial_failure_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/booking.ics"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(ics(&[("20250610", "20250613")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/airbnb.ics"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let registry = SourceRegistry::new(vec![
            CalendarSource::parse("Booking.com", &format!("{}/booking.ics", server.uri())).unwrap(),
            CalendarSource::parse("Airbnb", &format!("{}/airbnb.ics", server.uri())).unwrap(),
        ])
        .unwrap();
        let fetcher = HttpFeedFetcher::new(FetchConfig::default()).unwrap();
        let observer = Arc::new(RecordingObserver::default());
        let aggregator =
            Aggregator::new(registry, Arc::new(fetcher)).with_observer(observer.clone());

        let snapshot = aggregator.aggregate().await.unwrap();

        assert_eq!(days(&snapshot), ["2025-06-10", "2025-06-11", "2025-06-12"]);
        assert!(snapshot.is_partial());

        let statuses: Vec<_> = snapshot.sources().iter().map(|s| s.status).collect();
        assert_eq!(statuses, [SourceStatus::Ok, SourceStatus::FetchFailed]);
        assert_eq!(snapshot.sources()[0].booked_days, 3);
        assert!(snapshot.sources()[1].error.as_deref().unwrap().contains("http_status"));

        let mut events = observer.events();
        events.sort();
        assert_eq!(
            events,
            [
                "completed:3",
                "source:Airbnb:http_status",
                "source:Booking.com:ok",
            ]
        );
    }

    #[tokio::test]
    async fn all_sources_failing_is_aggregation_failure() {
        let fetcher = StubFetcher::new()
            .with("Booking.com", Stub::Fail(FeedErrorCode::Timeout))
            .with("Airbnb", Stub::Fail(FeedErrorCode::NetworkError));
        let observer = Arc::new(RecordingObserver::default());
        let aggregator = Aggregator::new(registry(&["Booking.com", "Airbnb"]), Arc::new(fetcher))
            .with_observer(observer.clone());

        let failure = aggregator.aggregate().await.unwrap_err();

        assert_eq!(failure.to_string(), "no sources reachable");
        let names: Vec<_> = failure
            .failures()
            .iter()
            .map(|e| e.source_name().unwrap())
            .collect();
        assert_eq!(names, ["Booking.com", "Airbnb"]);
        assert!(observer.events().contains(&"failed".to_string()));
    }

    #[tokio::test]
    async fn overlapping_sources_collapse() {
        let fetcher = StubFetcher::new()
            .with("Booking.com", Stub::feed(&[("20250610", "20250613")]))
            .with("Airbnb", Stub::feed(&[("20250612", "20250615")]));
        let aggregator =
            Aggregator::new(registry(&["Booking.com", "Airbnb"]), Arc::new(fetcher));

        let snapshot = aggregator.aggregate().await.unwrap();

        assert_eq!(
            days(&snapshot),
            [
                "2025-06-10",
                "2025-06-11",
                "2025-06-12",
                "2025-06-13",
                "2025-06-14"
            ]
        );
        assert!(!snapshot.is_partial());
    }

    #[tokio::test]
    async fn registry_order_does_not_change_result() {
        let stub = || {
            StubFetcher::new()
                .with("A", Stub::feed(&[("20251230", "20260102")]))
                .with("B", Stub::feed(&[("20251224", "20251227"), ("20251231", "20260101")]))
        };

        let forward = Aggregator::new(registry(&["A", "B"]), Arc::new(stub()))
            .aggregate()
            .await
            .unwrap();
        let backward = Aggregator::new(registry(&["B", "A"]), Arc::new(stub()))
            .aggregate()
            .await
            .unwrap();

        assert_eq!(days(&forward), days(&backward));
        assert_eq!(forward.len(), 6);
    }

    #[tokio::test]
    async fn empty_registry_yields_empty_snapshot() {
        let aggregator = Aggregator::new(SourceRegistry::empty(), Arc::new(StubFetcher::new()));

        let snapshot = aggregator.aggregate().await.unwrap();

        assert!(snapshot.is_empty());
        assert!(snapshot.sources().is_empty());
    }

    #[tokio::test]
    async fn unparseable_feed_is_excluded() {
        let fetcher = StubFetcher::new()
            .with("Booking.com", Stub::feed(&[("20250301", "20250302")]))
            .with(
                "Vrbo",
                Stub::Feed("<html><body>Sign in</body></html>".to_string()),
            );
        let aggregator = Aggregator::new(registry(&["Booking.com", "Vrbo"]), Arc::new(fetcher));

        let snapshot = aggregator.aggregate().await.unwrap();

        assert_eq!(days(&snapshot), ["2025-03-01"]);
        assert_eq!(snapshot.sources()[1].status, SourceStatus::ParseFailed);
    }

    #[tokio::test]
    async fn panicking_source_is_reported_as_failed() {
        let fetcher = StubFetcher::new()
            .with("Booking.com", Stub::feed(&[("20250301", "20250303")]))
            .with("Broken", Stub::Panic);
        let observer = Arc::new(RecordingObserver::default());
        let aggregator = Aggregator::new(registry(&["Booking.com", "Broken"]), Arc::new(fetcher))
            .with_observer(observer.clone());

        let snapshot = aggregator.aggregate().await.unwrap();

        assert_eq!(snapshot.len(), 2);
        let broken = &snapshot.sources()[1];
        assert_eq!(broken.name, "Broken");
        assert_eq!(broken.status, SourceStatus::FetchFailed);
        assert!(broken.error.as_deref().unwrap().contains("internal_error"));
        assert!(observer.events().contains(&"source:Broken:internal_error".to_string()));
    }

    #[tokio::test]
    async fn dropping_aggregation_aborts_fetches() {
        let dropped = Arc::new(AtomicBool::new(false));
        let fetcher = StubFetcher::new().with("Slow", Stub::Hang(Arc::clone(&dropped)));
        let aggregator = Aggregator::new(registry(&["Slow"]), Arc::new(fetcher));

        let result =
            tokio::time::timeout(Duration::from_millis(50), aggregator.aggregate()).await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn assemble_counts_per_source() {
        let outcomes = vec![
            SourceOutcome {
                name: "A".to_string(),
                result: Ok(SourceReport {
                    days: vec![BookedDay::from_ymd(2025, 1, 1).unwrap()],
                    events: 1,
                    skipped: 2,
                    cancelled: 0,
                }),
                elapsed: Duration::ZERO,
            },
            SourceOutcome {
                name: "B".to_string(),
                result: Err(FeedError::parse("bad").with_source_name("B")),
                elapsed: Duration::ZERO,
            },
        ];

        let snapshot = assemble(outcomes).unwrap();
        let a = &snapshot.sources()[0];
        assert_eq!((a.events, a.skipped_entries, a.booked_days), (1, 2, 1));
        assert_eq!(snapshot.sources()[1].status, SourceStatus::ParseFailed);
    }
}
