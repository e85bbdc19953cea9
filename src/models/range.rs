//! Date range handling for analytics queries.
//!
//! Ranges arrive as ISO `YYYY-MM-DD` strings and are inclusive on both
//! ends: a range of `2024-01-01..2024-01-02` covers every timestamp from
//! the first midnight up to (excluding) midnight of `2024-01-03` UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::errors::AppError;

/// Raw `{start, end}` body fields, parsed with [`DateRange::parse`].
#[derive(Debug, Clone, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn parse(&self) -> Result<ResolvedRange, AppError> {
        ResolvedRange::new(parse_iso_date("start", &self.start)?, parse_iso_date("end", &self.end)?)
    }
}

fn parse_iso_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("{field} must be an ISO date (YYYY-MM-DD)")))
}

/// Validated inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ResolvedRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if end < start {
            return Err(AppError::validation("start must not be after end"));
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound as a UTC instant.
    pub fn from_utc(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Exclusive upper bound: midnight UTC of the day after `end`.
    pub fn to_exclusive_utc(&self) -> DateTime<Utc> {
        (self.end + Duration::days(1)).and_time(NaiveTime::MIN).and_utc()
    }

    /// Bounds as BSON datetimes for `$gte`/`$lt` filters.
    pub fn bson_bounds(&self) -> (bson::DateTime, bson::DateTime) {
        (
            bson::DateTime::from_chrono(self.from_utc()),
            bson::DateTime::from_chrono(self.to_exclusive_utc()),
        )
    }

    /// Whether a stored timestamp falls inside the range.
    pub fn contains(&self, ts: bson::DateTime) -> bool {
        let (from, to) = self.bson_bounds();
        ts >= from && ts < to
    }

    /// Number of calendar days covered, at least 1.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The window of equal length immediately before this one, used by
    /// retention comparisons.
    pub fn previous_window(&self) -> Self {
        let days = self.days();
        Self {
            start: self.start - Duration::days(days),
            end: self.start - Duration::days(1),
        }
    }

    /// Trailing window of `days` calendar days ending on `end` (inclusive).
    pub fn trailing(end: NaiveDate, days: i64) -> Self {
        let days = days.max(1);
        Self {
            start: end - Duration::days(days - 1),
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn parses_valid_range() {
        let range = DateRange {
            start: "2024-01-01".to_string(),
            end: "2024-01-31".to_string(),
        }
        .parse()
        .unwrap();
        assert_eq!(range.start, date("2024-01-01"));
        assert_eq!(range.end, date("2024-01-31"));
        assert_eq!(range.days(), 31);
    }

    #[test]
    fn rejects_malformed_date() {
        let err = DateRange {
            start: "01/01/2024".to_string(),
            end: "2024-01-31".to_string(),
        }
        .parse()
        .unwrap_err();
        assert!(err.to_string().contains("start"));
    }

    #[test]
    fn rejects_inverted_range() {
        let err = DateRange {
            start: "2024-02-01".to_string(),
            end: "2024-01-01".to_string(),
        }
        .parse()
        .unwrap_err();
        assert!(err.to_string().contains("after"));
    }

    #[test]
    fn single_day_range_is_valid() {
        let range = ResolvedRange::new(date("2024-01-01"), date("2024-01-01")).unwrap();
        assert_eq!(range.days(), 1);
    }

    #[test]
    fn bounds_are_inclusive_of_both_end_dates() {
        let range = ResolvedRange::new(date("2024-01-01"), date("2024-01-02")).unwrap();

        let first_instant = bson::DateTime::from_chrono(range.from_utc());
        assert!(range.contains(first_instant));

        let late_on_end_day =
            bson::DateTime::from_chrono(date("2024-01-02").and_hms_opt(23, 59, 59).unwrap().and_utc());
        assert!(range.contains(late_on_end_day));

        let day_after =
            bson::DateTime::from_chrono(date("2024-01-03").and_time(NaiveTime::MIN).and_utc());
        assert!(!range.contains(day_after));

        let day_before =
            bson::DateTime::from_chrono(date("2023-12-31").and_hms_opt(23, 59, 59).unwrap().and_utc());
        assert!(!range.contains(day_before));
    }

    #[test]
    fn previous_window_has_equal_length() {
        let range = ResolvedRange::new(date("2024-01-08"), date("2024-01-14")).unwrap();
        let previous = range.previous_window();
        assert_eq!(previous.start, date("2024-01-01"));
        assert_eq!(previous.end, date("2024-01-07"));
        assert_eq!(previous.days(), range.days());
    }

    #[test]
    fn trailing_window_includes_end_day() {
        let range = ResolvedRange::trailing(date("2024-03-30"), 30);
        assert_eq!(range.days(), 30);
        assert_eq!(range.end, date("2024-03-30"));
        assert_eq!(range.start, date("2024-03-01"));
    }
}
