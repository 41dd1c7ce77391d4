//! Test doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use availcal_core::{AvailabilitySnapshot, CalendarSource, SourceRegistry};
use availcal_feeds::{BoxFuture, FeedError, FeedErrorCode, FeedFetcher, FeedResult, RawFeed};

use crate::aggregator::SourceOutcome;
use crate::error::AggregationFailure;
use crate::observer::AggregationObserver;

/// Builds an iCalendar body with one all-day event per `(start, end)` pair,
/// dates given as `YYYYMMDD`.
pub(crate) fn ics(events: &[(&str, &str)]) -> String {
    let mut body = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\n");
    for (i, (start, end)) in events.iter().enumerate() {
        body.push_str(&format!(
            "BEGIN:VEVENT\r\nUID:{i}@test\r\nDTSTART;VALUE=DATE:{start}\r\n\
             DTEND;VALUE=DATE:{end}\r\nSUMMARY:Reserved\r\nEND:VEVENT\r\n"
        ));
    }
    body.push_str("END:VCALENDAR\r\n");
    body
}

pub(crate) fn registry(names: &[&str]) -> SourceRegistry {
    let sources = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            CalendarSource::parse(*name, &format!("https://calendar.example.com/{i}.ics")).unwrap()
        })
        .collect();
    SourceRegistry::new(sources).unwrap()
}

pub(crate) enum Stub {
    Feed(String),
    Fail(FeedErrorCode),
    Panic,
    /// Never completes; sets the flag when the fetch future is dropped.
    Hang(Arc<AtomicBool>),
}

impl Stub {
    pub(crate) fn feed(events: &[(&str, &str)]) -> Self {
        Self::Feed(ics(events))
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Answers from a fixed table keyed by source name.
#[derive(Default)]
pub(crate) struct StubFetcher {
    responses: HashMap<String, Stub>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, name: &str, stub: Stub) -> Self {
        self.responses.insert(name.to_string(), stub);
        self
    }
}

impl FeedFetcher for StubFetcher {
    fn name(&self) -> &str {
        "stub"
    }

    fn fetch<'a>(&'a self, source: &'a CalendarSource) -> BoxFuture<'a, FeedResult<RawFeed>> {
        Box::pin(async move {
            // Suspend once, like a real request.
            tokio::time::sleep(Duration::from_millis(1)).await;
            match self.responses.get(source.name()) {
                Some(Stub::Feed(body)) => Ok(RawFeed::new(source.clone(), body.clone())),
                Some(Stub::Fail(code)) => Err(FeedError::new(*code, "stubbed failure")),
                Some(Stub::Panic) => panic!("stub fetcher panicked"),
                Some(Stub::Hang(dropped)) => {
                    let _guard = DropFlag(Arc::clone(dropped));
                    std::future::pending().await
                }
                None => Err(FeedError::network("no stub registered")),
            }
        })
    }
}

/// Records observer calls as short strings.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl AggregationObserver for RecordingObserver {
    fn source_completed(&self, outcome: &SourceOutcome) {
        let status = match &outcome.result {
            Ok(_) => "ok".to_string(),
            Err(e) => e.code().to_string(),
        };
        self.push(format!("source:{}:{}", outcome.name, status));
    }

    fn aggregation_completed(&self, snapshot: &AvailabilitySnapshot, _elapsed: Duration) {
        self.push(format!("completed:{}", snapshot.len()));
    }

    fn aggregation_failed(&self, _failure: &AggregationFailure, _elapsed: Duration) {
        self.push("failed".to_string());
    }
}
