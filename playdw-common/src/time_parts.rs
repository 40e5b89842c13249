//! Calendar decomposition of event timestamps
//!
//! Mirrors what the `time` insert computes in the warehouse, so loaded rows
//! can be checked independently:
//! - seconds since the Unix epoch, interpreted as UTC
//! - `week` is the ISO 8601 week number (weeks start on Monday)
//! - `weekday` counts from Sunday = 0

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

/// Decomposed timestamp, one `time` dimension row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeParts {
    pub start_time: NaiveDateTime,
    pub hour: i16,
    pub day: i16,
    pub week: i16,
    pub month: i16,
    pub year: i16,
    pub weekday: i16,
}

impl TimeParts {
    /// Decompose epoch seconds; `None` if out of chrono's range
    pub fn from_epoch_seconds(seconds: i64) -> Option<Self> {
        let start_time = DateTime::from_timestamp(seconds, 0)?.naive_utc();

        Some(Self {
            start_time,
            hour: start_time.hour() as i16,
            day: start_time.day() as i16,
            week: start_time.iso_week().week() as i16,
            month: start_time.month() as i16,
            year: i16::try_from(start_time.year()).ok()?,
            weekday: start_time.weekday().num_days_from_sunday() as i16,
        })
    }

    /// Decompose an event `ts` value, dropping sub-second precision the way
    /// the warehouse's integer division does
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        Self::from_epoch_seconds(millis / 1000)
    }

    /// Components in table column order (hour, day, week, month, year, weekday)
    pub fn components(&self) -> [i16; 6] {
        [
            self.hour,
            self.day,
            self.week,
            self.month,
            self.year,
            self.weekday,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_reference_timestamp() {
        let parts = TimeParts::from_epoch_millis(1_600_000_000_000).unwrap();

        assert_eq!(
            parts.start_time,
            NaiveDate::from_ymd_opt(2020, 9, 13)
                .unwrap()
                .and_hms_opt(12, 26, 40)
                .unwrap()
        );
        assert_eq!(parts.hour, 12);
        assert_eq!(parts.day, 13);
        assert_eq!(parts.week, 37);
        assert_eq!(parts.month, 9);
        assert_eq!(parts.year, 2020);
        // Sunday
        assert_eq!(parts.weekday, 0);
    }

    #[test]
    fn test_millis_truncated_to_seconds() {
        let exact = TimeParts::from_epoch_millis(1_541_121_934_000).unwrap();
        let later = TimeParts::from_epoch_millis(1_541_121_934_796).unwrap();
        assert_eq!(exact, later);

        // 2018-11-02 01:25:34, a Friday
        assert_eq!(exact.components(), [1, 2, 44, 11, 2018, 5]);
    }

    #[test]
    fn test_iso_week_at_year_boundary() {
        // 2021-01-01 belongs to ISO week 53 of 2020, calendar year stays 2021
        let parts = TimeParts::from_epoch_seconds(1_609_459_200).unwrap();
        assert_eq!(parts.week, 53);
        assert_eq!(parts.year, 2021);
        assert_eq!(parts.weekday, 5);
    }

    #[test]
    fn test_out_of_range() {
        assert!(TimeParts::from_epoch_seconds(i64::MAX).is_none());
    }
}
