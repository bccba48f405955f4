//! Calendar primitives: year/month points and the vesting calendar

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default quarterly vesting months (Feb/May/Aug/Nov)
pub const DEFAULT_VESTING_MONTHS: [u32; 4] = [2, 5, 8, 11];

/// A calendar month in a given year
///
/// Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawYearMonth")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

#[derive(Deserialize)]
struct RawYearMonth {
    year: i32,
    month: u32,
}

impl TryFrom<RawYearMonth> for YearMonth {
    type Error = ConfigError;

    fn try_from(raw: RawYearMonth) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.month)
    }
}

impl YearMonth {
    /// Create a year/month, rejecting months outside 1-12
    pub fn new(year: i32, month: u32) -> Result<Self, ConfigError> {
        if !(1..=12).contains(&month) {
            return Err(ConfigError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// Current month according to the local clock
    pub fn today() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// True when `(year, month)` is at or before this point
    pub fn has_reached(&self, year: i32, month: u32) -> bool {
        (year, month) <= (self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidYearMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

/// Months of the year on which vesting tranches occur
///
/// Stored sorted and de-duplicated. Serialized as a plain list of month numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct VestingCalendar {
    months: Vec<u32>,
}

impl VestingCalendar {
    pub fn new(mut months: Vec<u32>) -> Result<Self, ConfigError> {
        if let Some(&bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(ConfigError::InvalidVestingMonth(bad));
        }
        months.sort_unstable();
        months.dedup();
        Ok(Self { months })
    }

    /// Feb/May/Aug/Nov
    pub fn quarterly_default() -> Self {
        Self {
            months: DEFAULT_VESTING_MONTHS.to_vec(),
        }
    }

    pub fn months(&self) -> &[u32] {
        &self.months
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

impl Default for VestingCalendar {
    fn default() -> Self {
        Self::quarterly_default()
    }
}

impl TryFrom<Vec<u32>> for VestingCalendar {
    type Error = ConfigError;

    fn try_from(months: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(months)
    }
}

impl From<VestingCalendar> for Vec<u32> {
    fn from(calendar: VestingCalendar) -> Self {
        calendar.months
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_sorted_and_deduplicated() {
        let calendar = VestingCalendar::new(vec![11, 2, 8, 5, 2]).unwrap();
        assert_eq!(calendar.months(), &[2, 5, 8, 11]);
    }

    #[test]
    fn test_calendar_rejects_month_13() {
        let err = VestingCalendar::new(vec![3, 13]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVestingMonth(13)));
    }

    #[test]
    fn test_calendar_json_round_trip_validates() {
        let calendar: VestingCalendar = serde_json::from_str("[3, 6, 9, 12]").unwrap();
        assert_eq!(calendar.len(), 4);
        assert!(serde_json::from_str::<VestingCalendar>("[0, 6]").is_err());
    }

    #[test]
    fn test_year_month_parse_and_order() {
        let ym: YearMonth = "2025-06".parse().unwrap();
        assert_eq!(ym, YearMonth { year: 2025, month: 6 });
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("June 2025".parse::<YearMonth>().is_err());

        assert!(ym.has_reached(2024, 12));
        assert!(ym.has_reached(2025, 6));
        assert!(!ym.has_reached(2025, 7));
        assert_eq!(ym.to_string(), "2025-06");
    }

    #[test]
    fn test_year_month_json_rejects_month_13() {
        let ym: YearMonth = serde_json::from_str(r#"{"year": 2025, "month": 6}"#).unwrap();
        assert_eq!(ym, YearMonth { year: 2025, month: 6 });
        assert!(serde_json::from_str::<YearMonth>(r#"{"year": 2025, "month": 13}"#).is_err());
        assert!(serde_json::from_str::<YearMonth>(r#"{"year": 2025, "month": 0}"#).is_err());
    }
}
