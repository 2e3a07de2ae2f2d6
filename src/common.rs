/// Common types and utilities shared across handlers and services
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::errors::ServiceError;

/// Last representable instant of a day
const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Which end of an inclusive date range a query value bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

/// Parses a query-string date.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC), or a bare
/// `YYYY-MM-DD`. A bare date used as an end bound covers the whole day.
pub fn parse_date_bound(
    raw: &str,
    field: &str,
    bound: DateBound,
) -> Result<DateTime<Utc>, ServiceError> {
    let value = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        ServiceError::ValidationError(format!("Invalid {} '{}': {}", field, value, e))
    })?;

    let time = match bound {
        DateBound::Start => NaiveTime::MIN,
        DateBound::End => END_OF_DAY,
    };

    Ok(date.and_time(time).and_utc())
}

/// Parses an optional query date, treating blank input as absent
pub fn parse_optional_date_bound(
    raw: Option<&str>,
    field: &str,
    bound: DateBound,
) -> Result<Option<DateTime<Utc>>, ServiceError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => parse_date_bound(value, field, bound).map(Some),
        None => Ok(None),
    }
}
