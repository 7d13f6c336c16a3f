//! Date utilities: ISO calendar dates and timezone-aware "today".

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

/// Parse an ISO calendar date like "2026-02-20".
pub fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}

/// Format a date as "YYYY-MM-DD".
pub fn to_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The calendar date at `now` in an IANA timezone like "America/Chicago".
pub fn today_in_tz(now: DateTime<Utc>, tz: &str) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(now.with_timezone(&tz).date_naive())
}

/// Signed whole-day difference `to - from`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Inclusive list of dates from `start` through `end` (empty when `end < start`).
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Parse a comma-separated weekday list like "mon,wed,fri".
pub fn parse_weekdays(s: &str) -> Result<Vec<Weekday>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<Weekday>()
                .map_err(|_| anyhow::anyhow!("invalid weekday: {p}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_roundtrip_and_rejects_garbage() {
        let d = parse_iso_date("2026-02-20").unwrap();
        assert_eq!(to_iso_date(d), "2026-02-20");
        assert!(parse_iso_date("20/02/2026").is_err());
    }

    #[test]
    fn test_today_in_chicago_lags_utc_late_evening() {
        // 03:00 UTC is still the previous evening in Chicago (UTC-6 in Feb).
        let now = Utc.with_ymd_and_hms(2026, 2, 21, 3, 0, 0).unwrap();
        let today = today_in_tz(now, "America/Chicago").unwrap();
        assert_eq!(today, NaiveDate::from_ymd_opt(2026, 2, 20).unwrap());
        assert!(today_in_tz(now, "Mars/Olympus").is_err());
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let a = parse_iso_date("2026-01-30").unwrap();
        let b = parse_iso_date("2026-02-02").unwrap();
        assert_eq!(date_range(a, b).len(), 4);
        assert!(date_range(b, a).is_empty());
    }

    #[test]
    fn test_parse_weekdays() {
        let days = parse_weekdays("mon, Wed,fri").unwrap();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        assert!(parse_weekdays("mon,funday").is_err());
    }
}
