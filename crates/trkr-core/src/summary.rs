//! Summary aggregation over a set of time entries.
//!
//! # Algorithm
//!
//! A single pass over the entries:
//!
//! 1. Duration is `end - start` in minutes; when the end is strictly before
//!    the start, a day is added to the end first (overnight rollover)
//! 2. Durations are summed into `total_minutes`
//! 3. Distinct dates are collected into a set for `days_with_entries`
//!
//! An entry whose start equals its end counts as zero minutes. The validator
//! treats the same shape as overnight when it ends before 06:00; the two rules
//! disagree only on that zero-length case.
//!
//! Entries are not re-validated here. Stored rows that predate the five-minute
//! rule are summed as they are.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;

use crate::entry::{MINUTES_PER_DAY, minute_of_day};

/// Anything with a date and a start/end time that can be summed.
///
/// Lets the aggregator work on validated [`TimeEntry`](crate::TimeEntry)
/// values as well as raw rows read back from storage.
pub trait WorkInterval {
    /// Returns the calendar date the interval starts on.
    fn date(&self) -> NaiveDate;

    /// Returns the wall-clock start time.
    fn start_time(&self) -> NaiveTime;

    /// Returns the wall-clock end time.
    fn end_time(&self) -> NaiveTime;

    /// Duration in whole minutes, rolling over midnight when needed.
    fn duration_minutes(&self) -> u32 {
        interval_minutes(self.start_time(), self.end_time())
    }
}

/// A start date later than the end date.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("start date {start} cannot be after end date {end}")]
pub struct InvalidRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// An inclusive date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRange> {
        if start > end {
            return Err(InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Monday through Sunday of the week containing `day`.
    pub fn week_of(day: NaiveDate) -> Self {
        let days_since_monday = day.weekday().num_days_from_monday();
        let start = day - Duration::days(i64::from(days_since_monday));
        let end = start + Duration::days(6);
        Self { start, end }
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Aggregate totals over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_minutes: u64,
    pub entries_count: usize,
    pub days_with_entries: usize,
}

/// Totals for a single calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_minutes: u64,
    pub entries_count: usize,
}

/// Minutes from `start` to `end`, adding a day when `end` is before `start`.
///
/// Equal times yield zero.
pub fn interval_minutes(start: NaiveTime, end: NaiveTime) -> u32 {
    let start_minutes = minute_of_day(start);
    let mut end_minutes = minute_of_day(end);
    if end_minutes < start_minutes {
        end_minutes += MINUTES_PER_DAY;
    }
    end_minutes - start_minutes
}

/// Reduces entries into a [`TimeSummary`] echoing the range bounds.
///
/// The caller is expected to have restricted `entries` to the range and to a
/// single owner already; the range is only echoed back.
pub fn summarize<E: WorkInterval>(entries: &[E], range: &DateRange) -> TimeSummary {
    let mut total_minutes = 0_u64;
    let mut days = HashSet::new();

    for entry in entries {
        total_minutes += u64::from(entry.duration_minutes());
        days.insert(entry.date());
    }

    tracing::debug!(
        entries = entries.len(),
        total_minutes,
        days = days.len(),
        "summarized entries"
    );

    TimeSummary {
        start_date: range.start(),
        end_date: range.end(),
        total_minutes,
        entries_count: entries.len(),
        days_with_entries: days.len(),
    }
}

/// Per-day totals, ordered by date.
pub fn daily_totals<E: WorkInterval>(entries: &[E]) -> Vec<DailyTotal> {
    let mut by_date: BTreeMap<NaiveDate, (u64, usize)> = BTreeMap::new();
    for entry in entries {
        let slot = by_date.entry(entry.date()).or_default();
        slot.0 += u64::from(entry.duration_minutes());
        slot.1 += 1;
    }

    by_date
        .into_iter()
        .map(|(date, (total_minutes, entries_count))| DailyTotal {
            date,
            total_minutes,
            entries_count,
        })
        .collect()
}

/// Formats minutes as `"Xh Ym"`.
pub fn format_minutes(total_minutes: u64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    format!("{hours}h {minutes}m")
}
