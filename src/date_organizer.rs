//! Date-based destination segments.
//!
//! A file's modification timestamp is turned into a relative folder path such
//! as `2024/03/02`. The timestamp is read in the local time zone, which is how
//! the filesystem reports it to the user; no other conversion is applied.

use chrono::{DateTime, Datelike, Local, NaiveDate};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::SystemTime;

/// Folder used when a file's modification time cannot be read.
pub const UNKNOWN_DATE_FOLDER: &str = "Unknown-Date";

/// Layout of the date folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// `2024/03/02`
    #[default]
    YearMonthDayNested,
    /// `2024/03`
    YearMonthNested,
    /// `2024`
    Year,
    /// `2024-03`
    YearMonth,
    /// `2024-03-02`
    YearMonthDay,
    /// `2024-Q1`
    YearQuarter,
    /// `2024-W09`, ISO week numbering (the year is the ISO week-year)
    YearWeek,
}

impl DateFormat {
    pub const ALL: [DateFormat; 7] = [
        DateFormat::YearMonthDayNested,
        DateFormat::YearMonthNested,
        DateFormat::Year,
        DateFormat::YearMonth,
        DateFormat::YearMonthDay,
        DateFormat::YearQuarter,
        DateFormat::YearWeek,
    ];

    /// The literal accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YearMonthDayNested => "YYYY/MM/DD",
            Self::YearMonthNested => "YYYY/MM",
            Self::Year => "YYYY",
            Self::YearMonth => "YYYY-MM",
            Self::YearMonthDay => "YYYY-MM-DD",
            Self::YearQuarter => "YYYY-QQ",
            Self::YearWeek => "YYYY-WW",
        }
    }

    /// Formats a date as a `/`-separated folder segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use fileorg::date_organizer::DateFormat;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
    /// assert_eq!(DateFormat::YearMonthDayNested.segment(date), "2024/03/02");
    /// assert_eq!(DateFormat::YearQuarter.segment(date), "2024-Q1");
    /// ```
    pub fn segment(&self, date: NaiveDate) -> String {
        match self {
            Self::YearMonthDayNested => date.format("%Y/%m/%d").to_string(),
            Self::YearMonthNested => date.format("%Y/%m").to_string(),
            Self::Year => date.format("%Y").to_string(),
            Self::YearMonth => date.format("%Y-%m").to_string(),
            Self::YearMonthDay => date.format("%Y-%m-%d").to_string(),
            Self::YearQuarter => format!("{}-Q{}", date.year(), date.month0() / 3 + 1),
            Self::YearWeek => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let accepted: Vec<_> = Self::ALL.iter().map(DateFormat::as_str).collect();
                format!(
                    "unknown date format '{}', expected one of: {}",
                    s,
                    accepted.join(", ")
                )
            })
    }
}

/// Returns the local calendar date of a filesystem timestamp.
pub fn local_date(timestamp: SystemTime) -> NaiveDate {
    DateTime::<Local>::from(timestamp).date_naive()
}

/// Derives destination segments from modification times.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateOrganizer {
    format: DateFormat,
}

impl DateOrganizer {
    pub fn new(format: DateFormat) -> Self {
        Self { format }
    }

    /// Segment for a file, or [`UNKNOWN_DATE_FOLDER`] when no timestamp is known.
    pub fn segment_for(&self, modified: Option<SystemTime>) -> String {
        match modified {
            Some(timestamp) => self.format.segment(local_date(timestamp)),
            None => UNKNOWN_DATE_FOLDER.to_string(),
        }
    }

    /// Converts a `/`-separated segment into a relative path.
    pub fn relative_dir(segment: &str) -> PathBuf {
        segment.split('/').filter(|part| !part.is_empty()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::Path;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_nested_default_is_year_month_day() {
        assert_eq!(DateFormat::default(), DateFormat::YearMonthDayNested);
        assert_eq!(
            DateFormat::default().segment(date(2024, 3, 2)),
            "2024/03/02"
        );
    }

    #[test]
    fn test_all_formats_bit_exact() {
        let d = date(2024, 3, 2);
        assert_eq!(DateFormat::YearMonthNested.segment(d), "2024/03");
        assert_eq!(DateFormat::Year.segment(d), "2024");
        assert_eq!(DateFormat::YearMonth.segment(d), "2024-03");
        assert_eq!(DateFormat::YearMonthDay.segment(d), "2024-03-02");
        assert_eq!(DateFormat::YearQuarter.segment(d), "2024-Q1");
        assert_eq!(DateFormat::YearWeek.segment(d), "2024-W09");
    }

    #[test]
    fn test_quarter_boundaries() {
        assert_eq!(DateFormat::YearQuarter.segment(date(2023, 3, 31)), "2023-Q1");
        assert_eq!(DateFormat::YearQuarter.segment(date(2023, 4, 1)), "2023-Q2");
        assert_eq!(DateFormat::YearQuarter.segment(date(2023, 12, 31)), "2023-Q4");
    }

    #[test]
    fn test_iso_week_uses_week_year() {
        // 2024-12-30 is a Monday in ISO week 1 of 2025.
        assert_eq!(DateFormat::YearWeek.segment(date(2024, 12, 30)), "2025-W01");
        // 2021-01-01 belongs to week 53 of 2020.
        assert_eq!(DateFormat::YearWeek.segment(date(2021, 1, 1)), "2020-W53");
    }

    #[test]
    fn test_parse_formats() {
        for format in DateFormat::ALL {
            assert_eq!(format.as_str().parse::<DateFormat>(), Ok(format));
        }
        assert_eq!("yyyy-mm".parse::<DateFormat>(), Ok(DateFormat::YearMonth));
        assert!("DD/MM".parse::<DateFormat>().is_err());
    }

    #[test]
    fn test_segment_for_local_timestamp() {
        let local = Local
            .with_ymd_and_hms(2024, 3, 2, 12, 0, 0)
            .single()
            .unwrap();
        let organizer = DateOrganizer::default();
        assert_eq!(
            organizer.segment_for(Some(SystemTime::from(local))),
            "2024/03/02"
        );
    }

    #[test]
    fn test_segment_for_unknown_timestamp() {
        let organizer = DateOrganizer::new(DateFormat::YearMonth);
        assert_eq!(organizer.segment_for(None), UNKNOWN_DATE_FOLDER);
    }

    #[test]
    fn test_relative_dir_splits_segments() {
        assert_eq!(
            DateOrganizer::relative_dir("2024/03/02"),
            Path::new("2024").join("03").join("02")
        );
        assert_eq!(DateOrganizer::relative_dir("2024-Q1"), Path::new("2024-Q1"));
    }
}
