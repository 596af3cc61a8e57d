//! Time entry validation.
//!
//! An entry is a calendar date plus a start and end wall-clock time. Times are
//! truncated to whole minutes and must land on five-minute boundaries. An end
//! at or before the start is read as crossing midnight, which is only allowed
//! when the entry ends before 06:00.
//!
//! Checks run in a fixed order and the first failure is reported:
//!
//! 1. Truncate both times to minute precision (never fails)
//! 2. Start minute, then end minute, must be a multiple of 5
//! 3. Same-day intervals are accepted; overnight ones need `end.hour < 6`

use std::fmt;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::summary::WorkInterval;

/// Minute-of-hour values must be multiples of this.
pub const MINUTE_INCREMENT: u32 = 5;

/// Overnight entries must end strictly before this hour.
pub const OVERNIGHT_CUTOFF_HOUR: u32 = 6;

/// Minutes in a calendar day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Which side of an entry a time value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeField {
    Start,
    End,
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start time",
            Self::End => "end time",
        };
        write!(f, "{s}")
    }
}

/// Reasons a candidate entry is rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EntryError {
    /// A time does not land on a five-minute boundary.
    #[error(
        "{field} must be on 5-minute increments (e.g. 9:00, 9:05, 9:10), got {}",
        .time.format(TIME_FORMAT)
    )]
    NotFiveMinuteIncrement { field: TimeField, time: NaiveTime },

    /// The end is not after the start and the entry does not qualify as overnight.
    #[error(
        "start time must be before end time; overnight entries must end before 06:00 (got {} - {})",
        .start.format(TIME_FORMAT),
        .end.format(TIME_FORMAT)
    )]
    InvalidInterval { start: NaiveTime, end: NaiveTime },
}

/// Wire format for wall-clock times.
pub const TIME_FORMAT: &str = "%H:%M";

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A validated time entry.
///
/// Only obtainable through [`validate_entry`] (or deserialization, which runs
/// the same checks), so every value satisfies the entry invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "EntryInput")]
pub struct TimeEntry {
    date: NaiveDate,
    #[serde(with = "hhmm")]
    start_time: NaiveTime,
    #[serde(with = "hhmm")]
    end_time: NaiveTime,
}

/// An unvalidated candidate entry as received from a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EntryInput {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl TryFrom<EntryInput> for TimeEntry {
    type Error = EntryError;

    fn try_from(input: EntryInput) -> Result<Self, Self::Error> {
        validate_entry(input.date, input.start_time, input.end_time)
    }
}

impl TimeEntry {
    /// Validates and normalizes a candidate entry. Same as [`validate_entry`].
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Result<Self, EntryError> {
        validate_entry(date, start_time, end_time)
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub const fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub const fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    /// True when the entry crosses midnight into the next day.
    pub fn is_overnight(&self) -> bool {
        minute_of_day(self.end_time) <= minute_of_day(self.start_time)
    }
}

impl WorkInterval for TimeEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    fn end_time(&self) -> NaiveTime {
        self.end_time
    }
}

/// Drops seconds and sub-second components.
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

/// Minutes since midnight, ignoring seconds.
pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn check_increment(field: TimeField, time: NaiveTime) -> Result<(), EntryError> {
    if time.minute() % MINUTE_INCREMENT == 0 {
        Ok(())
    } else {
        Err(EntryError::NotFiveMinuteIncrement { field, time })
    }
}

/// Normalizes a candidate entry and checks it against the entry rules.
///
/// Note that an entry whose start equals its end is accepted when it ends
/// before 06:00, since it qualifies as "overnight".
pub fn validate_entry(
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<TimeEntry, EntryError> {
    let start_time = truncate_to_minute(start_time);
    let end_time = truncate_to_minute(end_time);

    check_increment(TimeField::Start, start_time)?;
    check_increment(TimeField::End, end_time)?;

    let same_day = minute_of_day(end_time) > minute_of_day(start_time);
    if !same_day && end_time.hour() >= OVERNIGHT_CUTOFF_HOUR {
        return Err(EntryError::InvalidInterval {
            start: start_time,
            end: end_time,
        });
    }

    Ok(TimeEntry {
        date,
        start_time,
        end_time,
    })
}

/// Parses a wall-clock time as `HH:MM`, also accepting `HH:MM:SS[.fff]`.
pub fn parse_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S%.f"))
}

/// Parses a calendar date as `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
}

/// Serde adapter writing times as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_time(&s).map_err(serde::de::Error::custom)
    }
}
