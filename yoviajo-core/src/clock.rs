use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{CoreError, CoreResult};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp as the backend sends it.
///
/// The backend stores departure times as free strings: RFC 3339 with an
/// offset when the client sent one, a naive local-less datetime otherwise.
/// Naive values are read as UTC.
pub fn parse_server_timestamp(raw: &str) -> CoreResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(CoreError::TimestampError(raw.to_string()))
}

/// Fractional hours from `now` until `target`. Negative once `target` has passed.
pub fn hours_until(target: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (target - now).num_milliseconds() as f64 / 3_600_000.0
}
