// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp encoding shared by every persisted table.
//!
//! Timestamps are stored as UTC text with millisecond precision so that
//! lexical comparison in SQL matches chronological order.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::FedlinkError;

/// Storage format for all persisted timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Encode a timestamp for storage.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Decode a stored timestamp.
pub fn parse_ts(raw: &str) -> Result<DateTime<Utc>, FedlinkError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| FedlinkError::Storage {
            source: format!("malformed timestamp `{raw}`: {e}").into(),
        })
}

/// Current time truncated to storage precision.
pub fn now() -> DateTime<Utc> {
    // Round-trip so in-memory values compare equal to what was stored.
    let stamped = format_ts(Utc::now());
    parse_ts(&stamped).unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_is_lexically_ordered() {
        let early = Utc.with_ymd_and_hms(2026, 1, 9, 23, 59, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        assert!(format_ts(early) < format_ts(late));
    }

    #[test]
    fn parse_accepts_formatted_value() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_ts(&format_ts(ts)).unwrap(), ts);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_ts("yesterday").is_err());
    }

    #[test]
    fn now_has_millisecond_precision() {
        let ts = now();
        assert_eq!(ts.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
