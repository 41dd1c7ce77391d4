//! Date types for booking calendars.
//!
//! This module provides [`EventDate`] for the start/end of a booking as a
//! feed encodes it (a bare date or an instant), and [`BookedDay`], the
//! canonical UTC calendar day that the rest of the system works with.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Canonical text format of a [`BookedDay`].
const DAY_FORMAT: &str = "%Y-%m-%d";

/// The start or end of a booking as published by a source.
///
/// - **Date**: an iCalendar `DATE` value (all-day booking)
/// - **DateTime**: an iCalendar `DATE-TIME` value, already converted to UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventDate {
    /// A bare calendar date.
    Date(NaiveDate),
    /// A specific instant, stored in UTC.
    DateTime(DateTime<Utc>),
}

impl EventDate {
    /// Creates an `EventDate::DateTime` from a datetime in any timezone.
    pub fn from_local<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        Self::DateTime(dt.with_timezone(&Utc))
    }

    /// Returns `true` if the source encoded this as a bare date.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Converts to a UTC instant. Dates map to midnight UTC.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// Strips the time of day, evaluated in UTC.
    pub fn floor(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::Date(date) => *date,
        }
    }
}

impl PartialOrd for EventDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc_datetime().cmp(&other.to_utc_datetime())
    }
}

impl From<NaiveDate> for EventDate {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime<Utc>> for EventDate {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

/// A calendar day with no time component, in UTC.
///
/// Its text form is `YYYY-MM-DD`, which is also how it serializes. Two
/// sources reporting the same night always produce equal `BookedDay`s, and
/// the ordering matches the lexicographic ordering of the text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BookedDay(NaiveDate);

impl BookedDay {
    /// Wraps a calendar date.
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a day from year, month and day-of-month.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Returns the underlying date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for BookedDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl From<NaiveDate> for BookedDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<BookedDay> for NaiveDate {
    fn from(day: BookedDay) -> Self {
        day.0
    }
}

/// Error returned when a string is not a `YYYY-MM-DD` day.
#[derive(Debug, Error)]
#[error("invalid booked day {input:?}: expected YYYY-MM-DD")]
pub struct ParseBookedDayError {
    input: String,
    #[source]
    source: chrono::ParseError,
}

impl FromStr for BookedDay {
    type Err = ParseBookedDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DAY_FORMAT)
            .map(Self)
            .map_err(|source| ParseBookedDayError {
                input: s.to_string(),
                source,
            })
    }
}

impl Serialize for BookedDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BookedDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
