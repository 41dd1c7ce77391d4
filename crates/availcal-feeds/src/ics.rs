//! iCalendar (RFC 5545) parsing.
//!
//! Converts a [`RawFeed`] into [`BookingEvent`]s. Only `VEVENT` components
//! are read. A malformed entry is skipped and counted; only a payload that is
//! not a calendar at all fails the whole feed.

use availcal_core::{BookingEvent, EventDate, InvalidEventRange};
use chrono::{NaiveDateTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::error::{FeedError, FeedResult};
use crate::feed::{ParsedFeed, RawFeed};

/// Why a single `VEVENT` was dropped.
#[derive(Debug, Error)]
enum EntryError {
    #[error("missing or unparseable DTSTART")]
    MissingStart,
    #[error("unparseable DURATION {0:?}")]
    InvalidDuration(String),
    #[error(transparent)]
    InvalidRange(#[from] InvalidEventRange),
}

/// Parses a feed into booking events.
///
/// # Errors
///
/// Returns a parse-stage [`FeedError`] if the body is not an iCalendar
/// document (for example an HTML error page served with status 200) or the
/// parser rejects it outright.
pub fn parse_feed(feed: &RawFeed) -> FeedResult<ParsedFeed> {
    let name = feed.source().name();
    let body = feed.body().trim_start_matches('\u{feff}').trim_start();

    if !starts_with_ignore_case(body, "BEGIN:VCALENDAR") {
        return Err(
            FeedError::parse("Payload is not an iCalendar document").with_source_name(name)
        );
    }

    let calendar = body.parse::<Calendar>().map_err(|e| {
        FeedError::parse(format!("Failed to parse calendar: {}", e)).with_source_name(name)
    })?;

    let mut parsed = ParsedFeed::default();

    for component in calendar.iter() {
        let CalendarComponent::Event(event) = component else {
            continue;
        };

        if is_cancelled(event) {
            trace!(source = %name, uid = ?event.get_uid(), "Ignoring cancelled event");
            parsed.cancelled += 1;
            continue;
        }

        match parse_event(event) {
            Ok(booking) => {
                trace!(
                    source = %name,
                    summary = ?booking.summary,
                    start = ?booking.start(),
                    end = ?booking.end(),
                    "Parsed booking"
                );
                parsed.events.push(booking);
            }
            Err(e) => {
                warn!(
                    source = %name,
                    uid = ?event.get_uid(),
                    error = %e,
                    "Skipping calendar entry"
                );
                parsed.skipped += 1;
            }
        }
    }

    debug!(
        source = %name,
        events = parsed.events.len(),
        skipped = parsed.skipped,
        cancelled = parsed.cancelled,
        "Parsed calendar feed"
    );

    Ok(parsed)
}

/// Parses a single VEVENT into a booking.
fn parse_event(event: &Event) -> Result<BookingEvent, EntryError> {
    let start = resolve_date(event.get_start().ok_or(EntryError::MissingStart)?);
    let end = resolve_end(event, start)?;

    let mut booking = BookingEvent::new(start, end)?;
    if let Some(summary) = event.get_summary() {
        booking = booking.with_summary(summary);
    }
    Ok(booking)
}

/// Resolves the end of an event (RFC 5545 §3.6.1).
///
/// `DTEND` if present, else `DTSTART + DURATION`. With neither, a `DATE`
/// start lasts one day and a `DATE-TIME` start ends when it starts.
fn resolve_end(event: &Event, start: EventDate) -> Result<EventDate, EntryError> {
    if let Some(end) = event.get_end() {
        return Ok(resolve_date(end));
    }
    if let Some(duration) = event.property_value("DURATION") {
        return add_duration(start, duration.trim());
    }
    Ok(match start {
        EventDate::Date(date) => date.succ_opt().map_or(start, EventDate::Date),
        EventDate::DateTime(_) => start,
    })
}

/// Adds an ISO 8601 duration. Whole days keep a `DATE` start a date.
fn add_duration(start: EventDate, value: &str) -> Result<EventDate, EntryError> {
    let invalid = || EntryError::InvalidDuration(value.to_string());

    let duration: std::time::Duration = iso8601::duration(value).map_err(|_| invalid())?.into();
    let duration = TimeDelta::from_std(duration).map_err(|_| invalid())?;

    match start {
        EventDate::Date(date) if duration.num_seconds() % 86_400 == 0 => date
            .checked_add_signed(duration)
            .map(EventDate::Date)
            .ok_or_else(invalid),
        _ => start
            .to_utc_datetime()
            .checked_add_signed(duration)
            .map(EventDate::DateTime)
            .ok_or_else(invalid),
    }
}

/// Converts an iCalendar date or date-time to an [`EventDate`] in UTC.
fn resolve_date(value: DatePerhapsTime) -> EventDate {
    match value {
        DatePerhapsTime::Date(date) => EventDate::Date(date),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => EventDate::DateTime(dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
            EventDate::DateTime(naive.and_utc())
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            resolve_zoned(date_time, &tzid)
        }
    }
}

/// Resolves a local time in an IANA zone.
///
/// Unknown zones and local times that do not exist (DST gaps) fall back to
/// reading the wall-clock time as UTC.
fn resolve_zoned(local: NaiveDateTime, tzid: &str) -> EventDate {
    let tzid = tzid.trim_matches('"');
    let Ok(tz) = tzid.parse::<Tz>() else {
        debug!(tzid = %tzid, "Unknown TZID, interpreting as UTC");
        return EventDate::DateTime(local.and_utc());
    };

    match tz.from_local_datetime(&local).earliest() {
        Some(dt) => EventDate::from_local(dt),
        None => {
            debug!(tzid = %tzid, local = %local, "Nonexistent local time, interpreting as UTC");
            EventDate::DateTime(local.and_utc())
        }
    }
}

fn is_cancelled(event: &Event) -> bool {
    event
        .property_value("STATUS")
        .is_some_and(|status| status.trim().eq_ignore_ascii_case("CANCELLED"))
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
