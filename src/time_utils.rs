// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time and distance formatting.

use chrono::{DateTime, Datelike, Duration, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Monday and Sunday of the ISO week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Format a pace in seconds per km as `M:SS`.
pub fn format_pace(secs_per_km: f64) -> String {
    let total = secs_per_km.round() as i64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Format a duration as `M:SS`, or `H:MM:SS` once it reaches an hour.
pub fn format_duration(secs: i64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Round to one decimal place (chart values).
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_bounds() {
        // 2025-01-22 is a Wednesday
        let (monday, sunday) = week_bounds(NaiveDate::from_ymd_opt(2025, 1, 22).unwrap());
        assert_eq!(monday, NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
        assert_eq!(sunday, NaiveDate::from_ymd_opt(2025, 1, 26).unwrap());

        let (monday, _) = week_bounds(NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
        assert_eq!(monday, NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
    }

    #[test]
    fn test_format_pace() {
        assert_eq!(format_pace(330.0), "5:30");
        assert_eq!(format_pace(255.0), "4:15");
        assert_eq!(format_pace(299.6), "5:00");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(1845), "30:45");
        assert_eq!(format_duration(3725), "1:02:05");
        assert_eq!(format_duration(0), "0:00");
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_iso_date("2025-01-20"),
            NaiveDate::from_ymd_opt(2025, 1, 20)
        );
        assert_eq!(parse_iso_date("20/01/2025"), None);
    }
}
