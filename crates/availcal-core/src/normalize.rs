//! Booking-to-day normalization.
//!
//! Converts a [`BookingEvent`] into the calendar days it blocks, using the
//! iCalendar `DTEND` convention: the end is exclusive, so a guest departing
//! on day `e` does not block night `e`.
//!
//! ```text
//! start = 2025-09-10, end = 2025-09-13  ->  10, 11, 12
//! start = 2025-09-10, end = 2025-09-10  ->  10
//! ```
//!
//! Both ends are floored to their UTC calendar day first. When the floored
//! days are equal the booking blocks exactly that one day; some sources
//! publish single-day blocks that way.

use std::iter::FusedIterator;

use chrono::NaiveDate;

use crate::event::BookingEvent;
use crate::time::BookedDay;

/// Iterator over the days blocked by one booking, in ascending order.
#[derive(Debug, Clone)]
pub struct DayRange {
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl DayRange {
    /// Builds the range for floored days `first` and `end` (exclusive).
    ///
    /// `end <= first` yields the single day `first`.
    pub fn new(first: NaiveDate, end: NaiveDate) -> Self {
        let last = if end > first {
            end.pred_opt().unwrap_or(first)
        } else {
            first
        };
        Self {
            next: Some(first),
            last,
        }
    }

    fn remaining(&self) -> usize {
        self.next.map_or(0, |next| {
            usize::try_from((self.last - next).num_days() + 1).unwrap_or(0)
        })
    }
}

impl Iterator for DayRange {
    type Item = BookedDay;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if current < self.last {
            current.succ_opt()
        } else {
            None
        };
        Some(BookedDay::new(current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for DayRange {}

impl FusedIterator for DayRange {}

/// Returns the iterator over the days `event` blocks.
pub fn day_range(event: &BookingEvent) -> DayRange {
    DayRange::new(event.start().floor(), event.end().floor())
}

/// Returns the days `event` blocks, ascending.
pub fn booked_days(event: &BookingEvent) -> Vec<BookedDay> {
    day_range(event).collect()
}
