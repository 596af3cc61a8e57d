//! Storage and credential collaborator interfaces.
//!
//! The core never talks to a database directly. Callers pass in an
//! implementation of these traits (`trkr-db` provides the SQLite one,
//! [`MemoryStore`](crate::MemoryStore) an in-memory one).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::entry::{TimeEntry, hhmm};
use crate::summary::{DateRange, WorkInterval};

/// Generates an integer ID newtype with common trait implementations.
macro_rules! define_int_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self).map_err(|_| InvalidId {
                    field: $field_name,
                    value: s.to_string(),
                })
            }
        }
    };
}

/// An ID string that is not an integer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {field}: {value}")]
pub struct InvalidId {
    pub field: &'static str,
    pub value: String,
}

define_int_id!(
    /// Identifies a registered user. Entries are keyed by it.
    UserId, "user ID"
);

define_int_id!(
    /// Identifies a stored time entry.
    EntryId, "entry ID"
);

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

/// A time entry as read back from storage.
///
/// Times are not re-validated on read; rows written before the five-minute
/// rule existed may not satisfy it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoredEntry {
    pub id: EntryId,
    pub owner: UserId,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl StoredEntry {
    /// Builds the stored form of a freshly validated entry.
    pub const fn from_entry(id: EntryId, owner: UserId, entry: &TimeEntry) -> Self {
        Self {
            id,
            owner,
            date: entry.date(),
            start_time: entry.start_time(),
            end_time: entry.end_time(),
        }
    }
}

impl WorkInterval for StoredEntry {
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

/// A `YYYY-MM` month, matched as a literal prefix of stored dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

/// A month filter that is not a 4-digit year and 2-digit month.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid month filter {0:?}: expected YYYY-MM")]
pub struct InvalidMonth(pub String);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        ((0..=9999).contains(&year) && (1..=12).contains(&month)).then_some(Self { year, month })
    }

    pub const fn year(&self) -> i32 {
        self.year
    }

    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Whether `date` falls in this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.format("%Y-%m").to_string() == self.to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = InvalidMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidMonth(s.to_string());
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !shape_ok {
            return Err(invalid());
        }
        let year = s[..4].parse().map_err(|_| invalid())?;
        let month = s[5..].parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

/// Which of an owner's entries to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryFilter {
    #[default]
    All,
    /// Entries on exactly this date.
    Date(NaiveDate),
    /// Entries whose date starts with this `YYYY-MM` prefix.
    Month(YearMonth),
    /// Entries dated within the inclusive range.
    Range(DateRange),
}

impl EntryFilter {
    /// Whether an entry dated `date` passes the filter.
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Date(d) => *d == date,
            Self::Month(month) => month.contains(date),
            Self::Range(range) => range.contains(date),
        }
    }
}

/// A failure inside a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint refused the write, e.g. a taken username.
    #[error("already exists: {0}")]
    Duplicate(String),

    /// Any other backend failure, passed through unmodified.
    #[error("storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }
}

/// Record store for time entries, keyed by owner.
///
/// Every operation is scoped to `owner`: an entry owned by someone else is
/// indistinguishable from a missing one. Listings are ordered by date, then
/// start time, then ID.
pub trait EntryStore {
    /// Persists a validated entry and returns its generated ID.
    fn create(&mut self, owner: UserId, entry: &TimeEntry) -> Result<EntryId, StoreError>;

    /// Lists the owner's entries passing `filter`.
    fn list(&self, owner: UserId, filter: &EntryFilter) -> Result<Vec<StoredEntry>, StoreError>;

    /// Fetches one entry.
    fn get(&self, owner: UserId, id: EntryId) -> Result<Option<StoredEntry>, StoreError>;

    /// Replaces the date and times of an entry, returning the new record.
    fn update(
        &mut self,
        owner: UserId,
        id: EntryId,
        entry: &TimeEntry,
    ) -> Result<Option<StoredEntry>, StoreError>;

    /// Deletes an entry. Returns whether anything was deleted.
    fn delete(&mut self, owner: UserId, id: EntryId) -> Result<bool, StoreError>;
}

/// A registered user with their stored password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Stored state for an issued bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRecord {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Persistence for users and issued tokens.
pub trait CredentialStore {
    fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    fn user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Inserts a user. A taken username fails with [`StoreError::Duplicate`].
    fn insert_user(&mut self, username: &str, password_hash: &str) -> Result<UserId, StoreError>;

    fn insert_token(&mut self, token: &str, record: &TokenRecord) -> Result<(), StoreError>;

    fn find_token(&self, token: &str) -> Result<Option<TokenRecord>, StoreError>;

    /// Removes a token. Returns whether it existed.
    fn delete_token(&mut self, token: &str) -> Result<bool, StoreError>;
}

impl<T: EntryStore + ?Sized> EntryStore for &mut T {
    fn create(&mut self, owner: UserId, entry: &TimeEntry) -> Result<EntryId, StoreError> {
        (**self).create(owner, entry)
    }

    fn list(&self, owner: UserId, filter: &EntryFilter) -> Result<Vec<StoredEntry>, StoreError> {
        (**self).list(owner, filter)
    }

    fn get(&self, owner: UserId, id: EntryId) -> Result<Option<StoredEntry>, StoreError> {
        (**self).get(owner, id)
    }

    fn update(
        &mut self,
        owner: UserId,
        id: EntryId,
        entry: &TimeEntry,
    ) -> Result<Option<StoredEntry>, StoreError> {
        (**self).update(owner, id, entry)
    }

    fn delete(&mut self, owner: UserId, id: EntryId) -> Result<bool, StoreError> {
        (**self).delete(owner, id)
    }
}

impl<T: CredentialStore + ?Sized> CredentialStore for &mut T {
    fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_user(username)
    }

    fn user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        (**self).user_by_id(id)
    }

    fn insert_user(&mut self, username: &str, password_hash: &str) -> Result<UserId, StoreError> {
        (**self).insert_user(username, password_hash)
    }

    fn insert_token(&mut self, token: &str, record: &TokenRecord) -> Result<(), StoreError> {
        (**self).insert_token(token, record)
    }

    fn find_token(&self, token: &str) -> Result<Option<TokenRecord>, StoreError> {
        (**self).find_token(token)
    }

    fn delete_token(&mut self, token: &str) -> Result<bool, StoreError> {
        (**self).delete_token(token)
    }
}
