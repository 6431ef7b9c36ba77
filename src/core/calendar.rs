//! Business-day normalization and fetch date windows

use anyhow::{Result, ensure};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::fmt::Display;

/// Moves a weekend date forward to the next business day. Weekdays pass
/// through unchanged. Holiday calendars are not considered.
pub fn adjust_to_business_day(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// Inclusive date range for a history fetch. Only [`DateWindow::widened`]
/// produces a different window, during fallback retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        ensure!(
            start <= end,
            "Invalid date range: start {start} is after end {end}"
        );
        Ok(DateWindow { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns a window extended by `days` on each side.
    pub fn widened(&self, days: i64) -> Self {
        DateWindow {
            start: self.start - Duration::days(days),
            end: self.end + Duration::days(days),
        }
    }

    /// Snaps both ends forward to business days. Both ends move by at most
    /// two days in the same direction, so the ordering invariant holds.
    pub fn adjusted_to_business_days(&self) -> Self {
        DateWindow {
            start: adjust_to_business_day(self.start),
            end: adjust_to_business_day(self.end),
        }
    }
}

impl Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
