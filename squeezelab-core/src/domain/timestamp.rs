//! Timestamp normalization.
//!
//! All comparisons inside the engine happen on `DateTime<Utc>`. Zoned inputs
//! are converted, naive inputs are taken to already be UTC.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an RFC 3339 timestamp (any offset) or a naive `YYYY-MM-DD[T ]HH:MM:SS[.f]`
/// timestamp, which is interpreted as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let input = input.trim();
    let err = match DateTime::parse_from_rfc3339(input) {
        Ok(zoned) => return Ok(zoned.with_timezone(&Utc)),
        Err(e) => e,
    };
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(err)
}

/// Floor a timestamp to the start of its bar interval (epoch aligned).
///
/// For intervals that divide an hour this equals flooring the minute-of-hour.
pub fn floor_to_interval(ts: DateTime<Utc>, interval_secs: i64) -> DateTime<Utc> {
    if interval_secs <= 0 {
        return ts;
    }
    let floored = ts.timestamp().div_euclid(interval_secs) * interval_secs;
    DateTime::from_timestamp(floored, 0).unwrap_or(ts)
}

/// Serde adapter for CSV/JSON fields holding a timestamp string.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
}
