//! Timestamp normalization for feed, sitemap and CLI dates.
//!
//! Feeds disagree about how to write a date: RSS uses RFC 2822, Atom and
//! sitemaps use ISO 8601 in a handful of variants, and plenty of sites get
//! both wrong. [`parse_datetime`] tries each known shape in turn and always
//! returns UTC. A string it cannot read yields `None`, which callers treat as
//! an undated item rather than an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Patterns carrying an explicit numeric offset (`%z` takes `+0000` and `+00:00`).
const OFFSET_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
];

/// Patterns without an offset. A trailing `Z` is matched literally.
const NAIVE_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%dT%H:%M",
    "%a, %d %b %Y %H:%M:%S",
];

static TRAILING_OFFSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"([+-]\d{2})(\d{2})$").unwrap());

/// Parse a timestamp string into a UTC instant.
///
/// Order of attempts:
/// 1. RFC 2822 (`Tue, 10 Jun 2025 09:30:00 GMT`), then RFC 3339.
/// 2. The ISO-like pattern lists above, then a bare `YYYY-MM-DD`.
/// 3. A repair pass rewriting a trailing `+hhmm` offset to `+hh:mm`.
///
/// Values without a zone are taken as UTC.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_iso(s) {
        return Some(dt);
    }

    if TRAILING_OFFSET.is_match(s) {
        let fixed = TRAILING_OFFSET.replace(s, "$1:$2");
        if let Some(dt) = parse_iso(&fixed) {
            return Some(dt);
        }
    }

    tracing::trace!(value = %s, "Unparseable timestamp");
    None
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    for pat in OFFSET_PATTERNS {
        if let Ok(dt) = DateTime::parse_from_str(s, pat) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for pat in NAIVE_PATTERNS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, pat) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a strict `YYYY-MM-DD` CLI date as midnight UTC.
pub fn parse_ymd(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("   "), None);
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_datetime("yesterday-ish"), None);
        assert_eq!(parse_datetime("2025-13-45"), None);
    }

    #[test]
    fn test_rfc2822_pubdate() {
        assert_eq!(
            parse_datetime("Tue, 10 Jun 2025 09:30:00 GMT"),
            Some(utc(2025, 6, 10, 9, 30, 0))
        );
        assert_eq!(
            parse_datetime("Tue, 10 Jun 2025 12:30:00 +0300"),
            Some(utc(2025, 6, 10, 9, 30, 0))
        );
    }

    #[test]
    fn test_rfc2822_without_zone_is_utc() {
        assert_eq!(
            parse_datetime("Tue, 10 Jun 2025 09:30:00"),
            Some(utc(2025, 6, 10, 9, 30, 0))
        );
    }

    #[test]
    fn test_iso_variants() {
        let want = utc(2025, 6, 10, 9, 30, 0);
        for s in [
            "2025-06-10T09:30:00Z",
            "2025-06-10T09:30:00.000Z",
            "2025-06-10T11:30:00+02:00",
            "2025-06-10T11:30:00+0200",
            "2025-06-10T11:30:00.250+0200",
            "2025-06-10 09:30:00",
            "2025-06-10 09:30:00+00:00",
            "2025-06-10T09:30:00",
            "2025-06-10T09:30Z",
        ] {
            let got = parse_datetime(s).unwrap_or_else(|| panic!("failed on {s}"));
            assert_eq!(got.timestamp(), want.timestamp(), "mismatch on {s}");
        }
    }

    #[test]
    fn test_date_only_is_midnight_utc() {
        assert_eq!(parse_datetime("2025-06-10"), Some(utc(2025, 6, 10, 0, 0, 0)));
    }

    #[test]
    fn test_round_trip_for_each_accepted_format() {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let instant = utc(2024, 2, 29, 23, 15, 42);
        let local = instant.with_timezone(&offset);

        let renderings = [
            instant.to_rfc2822(),
            local.to_rfc2822(),
            instant.to_rfc3339(),
            local.to_rfc3339(),
            instant.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            local.format("%Y-%m-%dT%H:%M:%S%z").to_string(),
            local.format("%Y-%m-%d %H:%M:%S%z").to_string(),
            instant.format("%Y-%m-%d %H:%M:%S").to_string(),
        ];
        for rendered in renderings {
            assert_eq!(parse_datetime(&rendered), Some(instant), "round trip of {rendered}");
        }

        let midnight = utc(2024, 2, 29, 0, 0, 0);
        assert_eq!(
            parse_datetime(&midnight.format("%Y-%m-%d").to_string()),
            Some(midnight)
        );
    }

    #[test]
    fn test_parse_ymd() {
        assert_eq!(parse_ymd("2025-07-01").unwrap(), utc(2025, 7, 1, 0, 0, 0));
        assert!(parse_ymd("07/01/2025").is_err());
    }
}
