//! Timestamp-aware helpers for JSON values exchanged with the API.
//!
//! The API sends timestamps as ISO 8601 strings. These helpers recognize and
//! decode them; going the other way needs no helper, since `chrono` types
//! serialize to RFC 3339 strings when placed in a payload.
//!
//! ```
//! use singlebase_rs::json_ext::{is_timestamp, parse_timestamp};
//!
//! assert!(is_timestamp("2025-01-01T00:00:00Z"));
//! assert!(!is_timestamp("San Francisco"));
//!
//! let ts = parse_timestamp("2025-01-01T12:30:00+02:00").unwrap();
//! assert_eq!(ts.to_rfc3339(), "2025-01-01T12:30:00+02:00");
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Naive layouts accepted in addition to RFC 3339; interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an ISO 8601 timestamp.
///
/// Accepts RFC 3339 (`Z` or numeric offset), offset-less date-times with a `T`
/// or space separator, and bare `YYYY-MM-DD` dates (midnight). Values without
/// an offset are taken as UTC.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Some(naive.and_utc().fixed_offset());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Returns `true` if `s` parses as a timestamp under [`parse_timestamp`].
#[must_use]
pub fn is_timestamp(s: &str) -> bool {
    parse_timestamp(s).is_some()
}
