//! Core types: calendar sources, booked days, normalization, merging.
//!
//! Everything in this crate is pure: no I/O happens here. Fetching and
//! parsing live in `availcal-feeds`, orchestration in `availcal-server`.

pub mod event;
pub mod logging;
pub mod merge;
pub mod normalize;
pub mod snapshot;
pub mod source;
pub mod time;

pub use event::{BookingEvent, InvalidEventRange};
pub use logging::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use merge::DayMerger;
pub use normalize::{DayRange, booked_days, day_range};
pub use snapshot::{AvailabilitySnapshot, SourceStatus, SourceSummary};
pub use source::{CalendarSource, SourceError, SourceRegistry};
pub use time::{BookedDay, EventDate, ParseBookedDayError};
