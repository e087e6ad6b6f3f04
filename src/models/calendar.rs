//! Calendar buckets used by the aggregations: year-months and Monday-start weeks.

use chrono::{Datelike, Days, Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a `YYYY-MM` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid year-month (expected YYYY-MM): {0}")]
pub struct ParseYearMonthError(pub String);

/// A calendar month, e.g. `2026-10`.
///
/// Ordering is chronological. Serialized as the `YYYY-MM` string that also
/// names the month's event file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a year-month. Returns `None` when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month a date falls in.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month number, 1-based.
    pub fn month(&self) -> u32 {
        self.month
    }

    fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }

    /// The month `n` calendar months before this one.
    pub fn months_back(&self, n: u32) -> Self {
        Self::from_ordinal(self.ordinal() - n as i64)
    }

    /// The month `n` calendar months after this one.
    pub fn months_forward(&self, n: u32) -> Self {
        Self::from_ordinal(self.ordinal() + n as i64)
    }

    /// Whole calendar months from `earlier` to `self`.
    ///
    /// Day of month is ignored; negative when `earlier` is after `self`.
    pub fn months_since(&self, earlier: YearMonth) -> i64 {
        self.ordinal() - earlier.ordinal()
    }

    /// Whether `date` falls in exactly this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Every month from `start` to `end`, inclusive. Empty when `start > end`.
    pub fn range_inclusive(start: YearMonth, end: YearMonth) -> Vec<YearMonth> {
        (start.ordinal()..=end.ordinal())
            .map(Self::from_ordinal)
            .collect()
    }

    /// Human-readable label, e.g. `October 2026`.
    pub fn label(&self) -> String {
        let name = u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("Unknown");
        format!("{} {}", name, self.year)
    }

    /// Name of the event file holding this month, e.g. `2026-10.json`.
    pub fn file_name(&self) -> String {
        format!("{}.json", self)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseYearMonthError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = ParseYearMonthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// A Monday-to-Sunday week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Week {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Week {
    /// The week containing `date`; `None` when the week runs past the
    /// representable date range.
    pub fn containing(date: NaiveDate) -> Option<Self> {
        let offset = u64::from(date.weekday().num_days_from_monday());
        let start = date.checked_sub_days(Days::new(offset))?;
        let end = start.checked_add_days(Days::new(6))?;
        Some(Self { start, end })
    }

    /// Display label: `Dec 8-14, 2025` within one month,
    /// `Nov 30-Dec 6, 2025` across months (year of the week's end).
    pub fn label(&self) -> String {
        let head = self.start.format("%b %-d");
        if self.start.month() == self.end.month() {
            format!("{}-{}, {}", head, self.end.day(), self.end.year())
        } else {
            format!("{}-{}", head, self.end.format("%b %-d, %Y"))
        }
    }
}
