//! Timestamp utilities
//!
//! Upstream providers report times in several textual conventions. Adapters
//! funnel everything through these parsers so a malformed timestamp becomes
//! an explicit error instead of a silently defaulted value.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidInput(format!("Invalid RFC 3339 timestamp '{}': {}", value, e)))
}

/// Parse an upstream timestamp, accepting the formats seen across providers
///
/// Tries, in order: RFC 3339, `YYYY-MM-DDTHH:MM:SS` (naive, treated as UTC),
/// `YYYY-MM-DD HH:MM:SS` (naive, treated as UTC), and bare `YYYY-MM-DD`
/// (midnight UTC). Anything else is an error.
pub fn parse_upstream_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(Error::InvalidInput(format!(
        "Unparseable upstream timestamp '{}'",
        value
    )))
}
