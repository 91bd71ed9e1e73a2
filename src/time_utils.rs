// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and parsing.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with millisecond precision and a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a calendar date from `YYYY-MM-DD` or a full RFC3339 timestamp
/// (whose UTC date is taken).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_utc_rfc3339() {
        let dt = Utc.with_ymd_and_hms(2025, 5, 17, 8, 30, 0).unwrap();
        assert_eq!(format_utc_rfc3339(dt), "2025-05-17T08:30:00.000Z");
    }

    #[test]
    fn test_parse_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 5, 17);
        assert_eq!(parse_date("2025-05-17"), expected);
        assert_eq!(parse_date("2025-05-17T23:30:00Z"), expected);
        assert_eq!(parse_date("2025-05-18T01:00:00+02:00"), expected);
        assert_eq!(parse_date("17/05/2025"), None);
        assert_eq!(parse_date(""), None);
    }
}
