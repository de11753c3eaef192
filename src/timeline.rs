//! Timeline annotation and time parsing.
//!
//! Local timestamps are rendered in a reference offset the caller supplies;
//! the host machine's time zone is never consulted.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PassageError, Result};
use crate::sampling::SampleRecord;

/// A sample with its timestamp rendered in the reference offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub sample: SampleRecord,
    /// ETA as ISO-8601 in the reference offset
    pub time_local: String,
}

/// Attach local timestamps to every sample, keeping order
pub fn annotate_timeline(series: &[SampleRecord], offset: FixedOffset) -> Vec<TimelineEntry> {
    series
        .iter()
        .map(|sample| TimelineEntry {
            time_local: format_local(sample.time_utc(), offset),
            sample: sample.clone(),
        })
        .collect()
}

/// ISO-8601 rendering of a UTC instant in the given offset
pub fn format_local(time: DateTime<Utc>, offset: FixedOffset) -> String {
    time.with_timezone(&offset)
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parse a departure time.
///
/// RFC 3339 strings keep their offset; naive `YYYY-MM-DDTHH:MM[:SS]` values
/// are taken as UTC.
pub fn parse_departure(text: &str) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Ok(time.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(PassageError::invalid_input(
        "departure",
        format!("Malformed departure time: {:?}", text),
    ))
}

/// Parse a reference offset such as `UTC`, `Z`, `-05:00` or `+0930`
pub fn parse_reference_offset(text: &str) -> Result<FixedOffset> {
    let text = text.trim();
    let invalid = || {
        PassageError::invalid_input(
            "reference_offset",
            format!("Malformed UTC offset: {:?}. Expected UTC, Z, +HH:MM or +HHMM", text),
        )
    };

    if text.eq_ignore_ascii_case("utc") || text == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match text.chars().next() {
        Some('+') => (1, &text[1..]),
        Some('-') => (-1, &text[1..]),
        _ => return Err(invalid()),
    };
    if !rest.is_ascii() {
        return Err(invalid());
    }
    let digits = match rest.len() {
        4 => rest.to_string(),
        5 if rest.as_bytes()[2] == b':' => format!("{}{}", &rest[..2], &rest[3..]),
        _ => return Err(invalid()),
    };
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
