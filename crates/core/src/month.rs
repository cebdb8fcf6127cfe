//! Calendar months for the monthly reward workflow

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{Result, RewardError};

/// A calendar month, formatted and parsed as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(RewardError::Parse(format!("invalid month {year}-{month}")));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Validated in `new`
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn next(&self) -> Month {
        if self.month == 12 {
            Month { year: self.year + 1, month: 1 }
        } else {
            Month { year: self.year, month: self.month + 1 }
        }
    }

    /// The month before, `None` outside the supported calendar
    pub fn previous(&self) -> Option<Month> {
        if self.month == 1 {
            Month::new(self.year - 1, 12).ok()
        } else {
            Month::new(self.year, self.month - 1).ok()
        }
    }

    /// Number of days in the month
    pub fn days(&self) -> u32 {
        let days = self.next().first_day().signed_duration_since(self.first_day()).num_days();
        days as u32
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = RewardError;

    fn from_str(s: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map_err(|e| RewardError::Parse(format!("invalid month {s:?} (want YYYY-MM): {e}")))?;
        Self::new(date.year(), date.month())
    }
}

/// Inclusive, contiguous range of months
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    from: Month,
    to: Month,
}

impl MonthRange {
    pub fn new(from: Month, to: Month) -> Result<Self> {
        if from > to {
            return Err(RewardError::Parse(format!(
                "from month {from} must not be after to month {to}"
            )));
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> Month {
        self.from
    }

    pub fn to(&self) -> Month {
        self.to
    }

    pub fn len(&self) -> usize {
        let span =
            (self.to.year - self.from.year) * 12 + self.to.month as i32 - self.from.month as i32;
        span as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Months in chronological order
    pub fn iter(&self) -> impl Iterator<Item = Month> {
        let to = self.to;
        std::iter::successors(Some(self.from), move |m| {
            let next = m.next();
            (next <= to).then_some(next)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let m = month("2023-10");
        assert_eq!(m.year(), 2023);
        assert_eq!(m.month(), 10);
        assert_eq!(m.to_string(), "2023-10");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("2023-13".parse::<Month>().is_err());
        assert!("2023".parse::<Month>().is_err());
        assert!("october".parse::<Month>().is_err());
    }

    #[test]
    fn test_next_rolls_year() {
        assert_eq!(month("2023-12").next(), month("2024-01"));
        assert_eq!(month("2023-05").next(), month("2023-06"));
    }

    #[test]
    fn test_previous() {
        assert_eq!(month("2024-01").previous(), Some(month("2023-12")));
        assert_eq!(month("2023-06").previous(), Some(month("2023-05")));
    }

    #[test]
    fn test_days() {
        assert_eq!(month("2024-02").days(), 29);
        assert_eq!(month("2023-02").days(), 28);
        assert_eq!(month("2023-10").days(), 31);
        assert_eq!(month("2023-11").days(), 30);
    }

    #[test]
    fn test_range_iter_inclusive() {
        let range = MonthRange::new(month("2023-11"), month("2024-02")).unwrap();
        let months: Vec<String> = range.iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn test_range_single_month() {
        let range = MonthRange::new(month("2023-10"), month("2023-10")).unwrap();
        assert_eq!(range.iter().count(), 1);
    }

    #[test]
    fn test_range_rejects_reversed() {
        assert!(MonthRange::new(month("2023-11"), month("2023-10")).is_err());
    }
}
