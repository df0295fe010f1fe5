//! Receiver timestamp decoding
//!
//! NovAtel ASCII log headers carry the GPS reference week number and the
//! seconds into that week. This module turns the pair into a comparable
//! value and a stable, sortable UTC string used in every output row.
//!
//! Leap seconds are deliberately ignored; the string is a readable label
//! derived directly from receiver time, not a calendar conversion.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::fmt;

/// Seconds in one GPS week
const SECONDS_PER_WEEK: f64 = 604_800.0;

/// Position of the week field in a NovAtel ASCII header, marker included
const HEADER_WEEK_INDEX: usize = 5;

/// A receiver timestamp: GPS week number plus seconds into the week
///
/// The same (week, seconds) pair always renders to the same string, so the
/// rendered form can be compared and sorted like the numeric form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsTime {
    pub week: u32,
    pub seconds: f64,
}

impl GpsTime {
    pub fn new(week: u32, seconds: f64) -> Self {
        Self { week, seconds }
    }

    /// Seconds since the GPS epoch, the comparison key for sampling and
    /// duration decisions
    pub fn total_seconds(&self) -> f64 {
        self.week as f64 * SECONDS_PER_WEEK + self.seconds
    }

    /// Seconds elapsed from `earlier` to `self`
    pub fn seconds_since(&self, earlier: &GpsTime) -> f64 {
        self.total_seconds() - earlier.total_seconds()
    }

    /// Convert to a UTC datetime relative to the GPS epoch (1980-01-06)
    pub fn to_utc(&self) -> DateTime<Utc> {
        let epoch = NaiveDate::from_ymd_opt(1980, 1, 6)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or_default();
        let millis = (self.total_seconds() * 1000.0).round() as i64;
        epoch + Duration::milliseconds(millis)
    }
}

impl fmt::Display for GpsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_utc().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Extract the receiver timestamp from a NovAtel ASCII log line
///
/// The header is everything before the `;` separator; field 5 is the week
/// number and field 6 the seconds-of-week. Lines without a well-formed
/// header (NMEA sentences, free-form text) yield `None`.
pub fn extract(line: &str) -> Option<GpsTime> {
    if !line.starts_with('#') {
        return None;
    }
    let header = line.split(';').next()?;
    let fields: Vec<&str> = header.split(',').collect();
    if fields.len() <= HEADER_WEEK_INDEX + 1 {
        return None;
    }
    let week: u32 = fields[HEADER_WEEK_INDEX].trim().parse().ok()?;
    let seconds: f64 = fields[HEADER_WEEK_INDEX + 1].trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(GpsTime::new(week, seconds))
}

/// Tracks the most recent decoded timestamp across the run
///
/// Some records ($GPGSV in particular) carry no week/seconds header; they
/// are stamped with the last timestamp seen on any classified record.
#[derive(Debug, Default)]
pub struct TimestampTracker {
    last: Option<GpsTime>,
}

impl TimestampTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the line's timestamp if present and remember it
    pub fn observe(&mut self, line: &str) -> Option<GpsTime> {
        if let Some(time) = extract(line) {
            self.last = Some(time);
        }
        self.last
    }

    /// Last known timestamp, if any record carried one so far
    pub fn last(&self) -> Option<GpsTime> {
        self.last
    }

    /// Rendered form of the last known timestamp, empty before the first one
    pub fn last_text(&self) -> String {
        self.last.map(|t| t.to_string()).unwrap_or_default()
    }
}
