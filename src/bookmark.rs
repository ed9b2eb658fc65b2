//! Bookmark formats and advancement strategies
//!
//! Bookmarks are persisted with second precision (`2020-08-01T00:00:00Z`),
//! while record timestamps carry microseconds (`2020-08-01T00:00:00.000000Z`).

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format of persisted bookmark values
pub const BOOKMARK_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format of `date-time` values in transformed records
pub const RECORD_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Parse a persisted bookmark (or the configured start date).
///
/// Only the exact bookmark format is accepted.
pub fn parse_bookmark(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, BOOKMARK_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            Error::invalid_value(
                "bookmark",
                format!("'{value}' does not match YYYY-MM-DDTHH:MM:SSZ: {e}"),
            )
        })
}

/// Render an instant as a bookmark value
pub fn format_bookmark(instant: DateTime<Utc>) -> String {
    instant.format(BOOKMARK_FORMAT).to_string()
}

/// Timezone-less layouts read as UTC
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a record timestamp.
///
/// Accepts RFC 3339 (with a `T` or a space separator), the record format,
/// timezone-less date-times and bare dates. Values without an offset are UTC;
/// a bare date is midnight.
pub fn parse_record_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render an instant in the record format
pub fn format_record_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(RECORD_FORMAT).to_string()
}

/// How a stream's bookmark advances while its records are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookmarkStrategy {
    /// Records arrive sorted by replication key; commit after every record
    Streaming,
    /// Records arrive unsorted; commit the maximum once the stream is done
    #[default]
    Accumulating,
}

/// Tracks the bookmark of one stream during one sync
#[derive(Debug, Clone)]
pub struct BookmarkTracker {
    strategy: BookmarkStrategy,
    floor: DateTime<Utc>,
    max_seen: Option<DateTime<Utc>>,
}

impl BookmarkTracker {
    /// Start tracking from the resolved bookmark
    pub fn new(strategy: BookmarkStrategy, resolved: DateTime<Utc>) -> Self {
        Self {
            strategy,
            floor: resolved,
            max_seen: None,
        }
    }

    /// Record one observed replication-key value.
    ///
    /// Returns the instant to commit right away (streaming strategy only).
    pub fn observe(&mut self, value: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.max_seen = Some(self.max_seen.map_or(value, |current| current.max(value)));

        match self.strategy {
            BookmarkStrategy::Streaming => self.committable(),
            BookmarkStrategy::Accumulating => None,
        }
    }

    /// Instant to commit once the stream is exhausted.
    ///
    /// `None` when nothing was observed or when the streaming strategy
    /// already committed every value.
    pub fn finish(&self) -> Option<DateTime<Utc>> {
        match self.strategy {
            BookmarkStrategy::Streaming => None,
            BookmarkStrategy::Accumulating => self.committable(),
        }
    }

    /// Highest value observed so far
    pub fn max_seen(&self) -> Option<DateTime<Utc>> {
        self.max_seen
    }

    fn committable(&self) -> Option<DateTime<Utc>> {
        self.max_seen.map(|seen| seen.max(self.floor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(value: &str) -> DateTime<Utc> {
        parse_record_timestamp(value).unwrap()
    }

    #[test]
    fn test_parse_bookmark() {
        let parsed = parse_bookmark("2020-08-01T00:00:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2020, 8, 1, 0, 0, 0).unwrap());
        assert_eq!(format_bookmark(parsed), "2020-08-01T00:00:00Z");
    }

    #[test]
    fn test_parse_bookmark_rejects_other_formats() {
        assert!(parse_bookmark("2020-08-01").is_err());
        assert!(parse_bookmark("2020-08-01T00:00:00.000000Z").is_err());
        assert!(parse_bookmark("2020-08-01T00:00:00+00:00").is_err());
        assert!(matches!(
            parse_bookmark("yesterday"),
            Err(Error::InvalidConfigValue { .. })
        ));
    }

    #[test]
    fn test_parse_record_timestamp() {
        assert_eq!(
            ts("2020-03-01T12:30:45.123456Z"),
            Utc.with_ymd_and_hms(2020, 3, 1, 12, 30, 45).unwrap()
                + chrono::Duration::microseconds(123_456)
        );
        assert_eq!(
            ts("2020-03-01T09:30:45-03:00"),
            Utc.with_ymd_and_hms(2020, 3, 1, 12, 30, 45).unwrap()
        );
        assert_eq!(
            ts("2020-03-01 12:30:45"),
            Utc.with_ymd_and_hms(2020, 3, 1, 12, 30, 45).unwrap()
        );
        assert_eq!(
            ts("2020-03-01T12:30:45"),
            Utc.with_ymd_and_hms(2020, 3, 1, 12, 30, 45).unwrap()
        );
        assert_eq!(
            ts("2020-03-01"),
            Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_record_timestamp("01/03/2020").is_none());
        assert!(parse_record_timestamp("2020-13-01").is_none());
    }

    #[test]
    fn test_record_timestamp_normalized_to_bookmark() {
        let instant = ts("2020-03-01T12:30:45.999999Z");
        assert_eq!(format_bookmark(instant), "2020-03-01T12:30:45Z");
        assert_eq!(
            format_record_timestamp(instant),
            "2020-03-01T12:30:45.999999Z"
        );
    }

    #[test]
    fn test_accumulating_keeps_maximum() {
        let start = parse_bookmark("2019-01-01T00:00:00Z").unwrap();
        let mut tracker = BookmarkTracker::new(BookmarkStrategy::Accumulating, start);

        assert_eq!(tracker.observe(ts("2020-01-01T00:00:00.000000Z")), None);
        assert_eq!(tracker.observe(ts("2020-03-01T00:00:00.000000Z")), None);
        assert_eq!(tracker.observe(ts("2020-02-01T00:00:00.000000Z")), None);

        assert_eq!(
            tracker.finish().map(format_bookmark),
            Some("2020-03-01T00:00:00Z".to_string())
        );
    }

    #[test]
    fn test_accumulating_without_records() {
        let start = parse_bookmark("2019-01-01T00:00:00Z").unwrap();
        let tracker = BookmarkTracker::new(BookmarkStrategy::Accumulating, start);
        assert_eq!(tracker.finish(), None);
        assert_eq!(tracker.max_seen(), None);
    }

    #[test]
    fn test_accumulating_never_moves_backwards() {
        let start = parse_bookmark("2021-01-01T00:00:00Z").unwrap();
        let mut tracker = BookmarkTracker::new(BookmarkStrategy::Accumulating, start);
        tracker.observe(ts("2020-06-01T00:00:00.000000Z"));

        assert_eq!(
            tracker.finish().map(format_bookmark),
            Some("2021-01-01T00:00:00Z".to_string())
        );
    }

    #[test]
    fn test_streaming_commits_each_record() {
        let start = parse_bookmark("2019-01-01T00:00:00Z").unwrap();
        let mut tracker = BookmarkTracker::new(BookmarkStrategy::Streaming, start);

        assert_eq!(
            tracker.observe(ts("2020-01-01T00:00:00.000000Z")).map(format_bookmark),
            Some("2020-01-01T00:00:00Z".to_string())
        );
        assert_eq!(
            tracker.observe(ts("2020-02-01T00:00:00.000000Z")).map(format_bookmark),
            Some("2020-02-01T00:00:00Z".to_string())
        );
        assert_eq!(tracker.finish(), None);
    }

    #[test]
    fn test_streaming_is_monotonic_on_unsorted_input() {
        let start = parse_bookmark("2019-01-01T00:00:00Z").unwrap();
        let mut tracker = BookmarkTracker::new(BookmarkStrategy::Streaming, start);

        tracker.observe(ts("2020-03-01T00:00:00.000000Z"));
        assert_eq!(
            tracker.observe(ts("2020-02-01T00:00:00.000000Z")).map(format_bookmark),
            Some("2020-03-01T00:00:00Z".to_string())
        );
    }

    #[test]
    fn test_strategy_serde() {
        let strategy: BookmarkStrategy = serde_yaml::from_str("streaming").unwrap();
        assert_eq!(strategy, BookmarkStrategy::Streaming);
        assert_eq!(BookmarkStrategy::default(), BookmarkStrategy::Accumulating);
    }
}
