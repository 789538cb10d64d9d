//! Date parsing for movement filters and payloads

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::types::DateRange;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A parsed calendar value and whether the input named a time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub value: NaiveDateTime,
    pub has_time: bool,
}

/// Date range validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("Invalid `from` parameter")]
    InvalidFrom,

    #[error("Invalid `to` parameter")]
    InvalidTo,

    #[error("Date range is inverted (`from` after `to`)")]
    Inverted,
}

/// Parse an ISO-like date or date-time. Offsets are converted to UTC.
pub fn parse_date_time(input: &str) -> Option<ParsedDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ParsedDate {
            value: with_offset.naive_utc(),
            has_time: true,
        });
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ParsedDate {
                value,
                has_time: true,
            });
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|value| ParsedDate {
            value,
            has_time: false,
        })
}

/// Last representable millisecond of the given day
pub fn end_of_day(value: NaiveDateTime) -> NaiveDateTime {
    value
        .date()
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or(value)
}

/// Validate optional `from`/`to` bounds.
///
/// Blank strings count as absent. A date-only `to` is pushed to the end of
/// that day so the whole day is included.
pub fn parse_date_range(from: Option<&str>, to: Option<&str>) -> Result<DateRange, DateRangeError> {
    let from = from.filter(|s| !s.trim().is_empty());
    let to = to.filter(|s| !s.trim().is_empty());

    let start = match from {
        Some(raw) => Some(parse_date_time(raw).ok_or(DateRangeError::InvalidFrom)?.value),
        None => None,
    };

    let end = match to {
        Some(raw) => {
            let parsed = parse_date_time(raw).ok_or(DateRangeError::InvalidTo)?;
            Some(if parsed.has_time {
                parsed.value
            } else {
                end_of_day(parsed.value)
            })
        }
        None => None,
    };

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(DateRangeError::Inverted);
        }
    }

    Ok(DateRange { start, end })
}
