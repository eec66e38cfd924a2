//! Calendar periods (inclusive date ranges) used to query and aggregate records.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Inclusive range of operating days.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if end < start {
            return Err(DomainError::invalid_input(format!(
                "date range ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The `days` operating days ending at (and including) `today`.
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        let span = u64::from(days.max(1) - 1);
        let start = today.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    /// Whole calendar month.
    pub fn month(year: i32, month: u32) -> DomainResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| DomainError::invalid_input(format!("invalid month {year}-{month}")))?;
        let end = start
            .checked_add_days(Days::new(u64::from(days_in_month(year, month)? - 1)))
            .ok_or_else(|| DomainError::invalid_input(format!("invalid month {year}-{month}")))?;
        Ok(Self { start, end })
    }

    /// From the first day of `date`'s month up to `date`.
    pub fn month_to_date(date: NaiveDate) -> Self {
        Self {
            start: date.with_day(1).unwrap_or(date),
            end: date,
        }
    }

    /// Whole calendar month before the one `self` starts in.
    pub fn previous_month(&self) -> DomainResult<Self> {
        let (year, month) = match self.start.month() {
            1 => (self.start.year() - 1, 12),
            m => (self.start.year(), m - 1),
        };
        Self::month(year, month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered (inclusive).
    pub fn days(&self) -> u32 {
        let span = (self.end - self.start).num_days();
        u32::try_from(span + 1).unwrap_or(u32::MAX)
    }
}

/// Number of days in a calendar month.
pub fn days_in_month(year: i32, month: u32) -> DomainResult<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DomainError::invalid_input(format!("invalid month {year}-{month}")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| DomainError::invalid_input(format!("invalid month {year}-{month}")))?;
    Ok(u32::try_from((next - first).num_days()).unwrap_or(31))
}
