//! Storage layer for trkr.
//!
//! Provides persistence for users, access tokens and time entries using
//! `rusqlite`, and implements the [`EntryStore`] and [`CredentialStore`]
//! traits from `trkr-core` on top of it.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization (e.g. a `Mutex<Database>`).
//!
//! # Schema
//!
//! ## Value Formats
//!
//! - Dates are TEXT in `YYYY-MM-DD` form, so lexicographic order is date order
//!   and a month filter is a literal `YYYY-MM` prefix comparison.
//! - Times are TEXT in `HH:MM` form. Rows written by older versions may carry
//!   seconds (`HH:MM:SS`); those are read back as-is.
//! - Timestamps are TEXT in RFC 3339 UTC (e.g. `2024-01-15T10:30:00.000Z`).
//!
//! Entry rows are never re-validated on read.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params, params_from_iter};
use thiserror::Error;
use trkr_core::entry::{DATE_FORMAT, TIME_FORMAT, parse_date, parse_time};
use trkr_core::{
    CredentialStore, EntryFilter, EntryId, EntryStore, StoreError, StoredEntry, TimeEntry,
    TokenRecord, UserId, UserRecord,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored date or time column could not be parsed.
    #[error("invalid {column} for time entry {entry_id}: {value}")]
    InvalidEntryData {
        entry_id: i64,
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// The username is already taken.
    #[error("username already exists: {0}")]
    DuplicateUsername(String),
    /// Failed to parse a token expiry timestamp.
    #[error("invalid token expiry timestamp: {timestamp}")]
    TimestampParse {
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateUsername(username) => Self::Duplicate(username),
            other => Self::new(other),
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Row counts reported by `trkr status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbStats {
    pub users: i64,
    pub entries: i64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

/// Raw `time_entries` row before date/time parsing.
struct EntryRow {
    id: i64,
    user_id: i64,
    date: String,
    start_time: String,
    end_time: String,
}

const ENTRY_COLUMNS: &str = "id, user_id, date, start_time, end_time";

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
        })
    }

    fn parse(self) -> Result<StoredEntry, DbError> {
        let date = parse_date(&self.date).map_err(|source| DbError::InvalidEntryData {
            entry_id: self.id,
            column: "date",
            value: self.date.clone(),
            source,
        })?;
        let start_time = parse_column_time(self.id, "start_time", &self.start_time)?;
        let end_time = parse_column_time(self.id, "end_time", &self.end_time)?;
        Ok(StoredEntry {
            id: EntryId::new(self.id),
            owner: UserId::new(self.user_id),
            date,
            start_time,
            end_time,
        })
    }
}

fn parse_column_time(entry_id: i64, column: &'static str, value: &str) -> Result<NaiveTime, DbError> {
    parse_time(value).map_err(|source| DbError::InvalidEntryData {
        entry_id,
        column,
        value: value.to_string(),
        source,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            timestamp: timestamp.to_string(),
            source,
        })
}

/// Builds the WHERE clause and parameters for an owner-scoped listing.
fn filter_clause(owner: UserId, filter: &EntryFilter) -> (String, Vec<Value>) {
    let mut clause = String::from("user_id = ?");
    let mut values = vec![Value::Integer(owner.get())];
    match filter {
        EntryFilter::All => {}
        EntryFilter::Date(date) => {
            clause.push_str(" AND date = ?");
            values.push(Value::Text(format_date(*date)));
        }
        EntryFilter::Month(month) => {
            clause.push_str(" AND substr(date, 1, 7) = ?");
            values.push(Value::Text(month.to_string()));
        }
        EntryFilter::Range(range) => {
            clause.push_str(" AND date >= ? AND date <= ?");
            values.push(Value::Text(format_date(range.start())));
            values.push(Value::Text(format_date(range.end())));
        }
    }
    (clause, values)
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS access_tokens (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_access_tokens_expires ON access_tokens(expires_at);

            -- date: 'YYYY-MM-DD'; start_time/end_time: 'HH:MM'
            CREATE TABLE IF NOT EXISTS time_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_time_entries_user_date ON time_entries(user_id, date);
            ",
        )?;
        Ok(())
    }

    /// Inserts a validated entry and returns its ID.
    pub fn insert_entry(&mut self, owner: UserId, entry: &TimeEntry) -> Result<EntryId, DbError> {
        self.conn.execute(
            "INSERT INTO time_entries (user_id, date, start_time, end_time) VALUES (?, ?, ?, ?)",
            params![
                owner.get(),
                format_date(entry.date()),
                format_time(entry.start_time()),
                format_time(entry.end_time()),
            ],
        )?;
        Ok(EntryId::new(self.conn.last_insert_rowid()))
    }

    /// Lists an owner's entries ordered by date, start time, then ID.
    pub fn list_entries(
        &self,
        owner: UserId,
        filter: &EntryFilter,
    ) -> Result<Vec<StoredEntry>, DbError> {
        let (clause, values) = filter_clause(owner, filter);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE {clause} ORDER BY date ASC, start_time ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params_from_iter(values), EntryRow::from_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.parse()?);
        }
        Ok(entries)
    }

    /// Fetches one of an owner's entries.
    pub fn get_entry(&self, owner: UserId, id: EntryId) -> Result<Option<StoredEntry>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ? AND user_id = ?"),
                params![id.get(), owner.get()],
                EntryRow::from_row,
            )
            .optional()?;
        row.map(EntryRow::parse).transpose()
    }

    /// Replaces an entry's date and times. Returns `None` if the owner has no such entry.
    pub fn update_entry(
        &mut self,
        owner: UserId,
        id: EntryId,
        entry: &TimeEntry,
    ) -> Result<Option<StoredEntry>, DbError> {
        let changed = self.conn.execute(
            "UPDATE time_entries SET date = ?, start_time = ?, end_time = ? WHERE id = ? AND user_id = ?",
            params![
                format_date(entry.date()),
                format_time(entry.start_time()),
                format_time(entry.end_time()),
                id.get(),
                owner.get(),
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(StoredEntry::from_entry(id, owner, entry)))
    }

    /// Deletes one of an owner's entries.
    pub fn delete_entry(&mut self, owner: UserId, id: EntryId) -> Result<bool, DbError> {
        let deleted = self.conn.execute(
            "DELETE FROM time_entries WHERE id = ? AND user_id = ?",
            params![id.get(), owner.get()],
        )?;
        Ok(deleted > 0)
    }

    fn query_user(&self, column: &str, value: Value) -> Result<Option<UserRecord>, DbError> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT id, username, password_hash FROM users WHERE {column} = ?"),
                [value],
                |row| {
                    Ok(UserRecord {
                        id: UserId::new(row.get(0)?),
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Looks up a user by username.
    pub fn find_user_by_name(&self, username: &str) -> Result<Option<UserRecord>, DbError> {
        self.query_user("username", Value::Text(username.to_string()))
    }

    /// Looks up a user by ID.
    pub fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DbError> {
        self.query_user("id", Value::Integer(id.get()))
    }

    /// Inserts a user with an already-hashed password.
    pub fn insert_user_record(&mut self, username: &str, password_hash: &str) -> Result<UserId, DbError> {
        let inserted = self.conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
            params![username, password_hash, format_timestamp(Utc::now())],
        );
        match inserted {
            Ok(_) => Ok(UserId::new(self.conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(DbError::DuplicateUsername(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stores an issued token.
    pub fn insert_access_token(&mut self, token: &str, record: &TokenRecord) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO access_tokens (token, user_id, expires_at) VALUES (?, ?, ?)",
            params![token, record.user_id.get(), format_timestamp(record.expires_at)],
        )?;
        Ok(())
    }

    /// Looks up an issued token, expired or not.
    pub fn find_access_token(&self, token: &str) -> Result<Option<TokenRecord>, DbError> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT user_id, expires_at FROM access_tokens WHERE token = ?",
                [token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        row.map(|(user_id, expires_at)| {
            Ok(TokenRecord {
                user_id: UserId::new(user_id),
                expires_at: parse_timestamp(&expires_at)?,
            })
        })
        .transpose()
    }

    /// Deletes an issued token.
    pub fn delete_access_token(&mut self, token: &str) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM access_tokens WHERE token = ?", [token])?;
        Ok(deleted > 0)
    }

    /// Deletes every token that expired at or before `now`.
    pub fn purge_expired_tokens(&mut self, now: DateTime<Utc>) -> Result<usize, DbError> {
        let purged = self.conn.execute(
            "DELETE FROM access_tokens WHERE expires_at <= ?",
            [format_timestamp(now)],
        )?;
        if purged > 0 {
            tracing::debug!(purged, "purged expired tokens");
        }
        Ok(purged)
    }

    /// Counts users and entries and reports the stored date span.
    pub fn stats(&self) -> Result<DbStats, DbError> {
        let users = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        let (entries, first_date, last_date) = self.conn.query_row(
            "SELECT COUNT(*), MIN(date), MAX(date) FROM time_entries",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(DbStats {
            users,
            entries,
            first_date,
            last_date,
        })
    }
}

impl EntryStore for Database {
    fn create(&mut self, owner: UserId, entry: &TimeEntry) -> Result<EntryId, StoreError> {
        Ok(self.insert_entry(owner, entry)?)
    }

    fn list(&self, owner: UserId, filter: &EntryFilter) -> Result<Vec<StoredEntry>, StoreError> {
        Ok(self.list_entries(owner, filter)?)
    }

    fn get(&self, owner: UserId, id: EntryId) -> Result<Option<StoredEntry>, StoreError> {
        Ok(self.get_entry(owner, id)?)
    }

    fn update(
        &mut self,
        owner: UserId,
        id: EntryId,
        entry: &TimeEntry,
    ) -> Result<Option<StoredEntry>, StoreError> {
        Ok(self.update_entry(owner, id, entry)?)
    }

    fn delete(&mut self, owner: UserId, id: EntryId) -> Result<bool, StoreError> {
        Ok(self.delete_entry(owner, id)?)
    }
}

impl CredentialStore for Database {
    fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.find_user_by_name(username)?)
    }

    fn user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.find_user_by_id(id)?)
    }

    fn insert_user(&mut self, username: &str, password_hash: &str) -> Result<UserId, StoreError> {
        Ok(self.insert_user_record(username, password_hash)?)
    }

    fn insert_token(&mut self, token: &str, record: &TokenRecord) -> Result<(), StoreError> {
        Ok(self.insert_access_token(token, record)?)
    }

    fn find_token(&self, token: &str) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self.find_access_token(token)?)
    }

    fn delete_token(&mut self, token: &str) -> Result<bool, StoreError> {
        Ok(self.delete_access_token(token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::Duration;
    use trkr_core::{DateRange, EntryService, TrackerError, summarize, validate_entry};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn entry(date: NaiveDate, start: (u32, u32), end: (u32, u32)) -> TimeEntry {
        validate_entry(date, hm(start.0, start.1), hm(end.0, end.1)).unwrap()
    }

    fn db_with_users() -> (Database, UserId, UserId) {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let alice = db.insert_user_record("alice", "salt$hash").unwrap();
        let bob = db.insert_user_record("bob", "salt$hash").unwrap();
        (db, alice, bob)
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "users"),
            vec!["id", "username", "password_hash", "created_at"]
        );
        assert_eq!(
            table_columns(&db.conn, "access_tokens"),
            vec!["token", "user_id", "expires_at"]
        );
        assert_eq!(
            table_columns(&db.conn, "time_entries"),
            vec!["id", "user_id", "date", "start_time", "end_time"]
        );
        assert!(index_names(&db.conn, "time_entries").contains("idx_time_entries_user_date"));
    }

    #[test]
    fn init_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("trkr.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.insert_user_record("alice", "salt$hash").unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.stats().unwrap().users, 1);
    }

    #[test]
    fn entries_roundtrip_through_storage() {
        let (mut db, alice, _) = db_with_users();
        let created = entry(day(1), (23, 0), (5, 30));
        let id = db.insert_entry(alice, &created).unwrap();

        let stored = db.get_entry(alice, id).unwrap().unwrap();
        assert_eq!(stored, StoredEntry::from_entry(id, alice, &created));

        let raw: (String, String) = db
            .conn
            .query_row(
                "SELECT start_time, end_time FROM time_entries WHERE id = ?",
                [id.get()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(raw, ("23:00".to_string(), "05:30".to_string()));
    }

    #[test]
    fn other_owners_cannot_see_or_touch_entries() {
        let (mut db, alice, bob) = db_with_users();
        let id = db.insert_entry(alice, &entry(day(1), (9, 0), (10, 0))).unwrap();

        assert!(db.get_entry(bob, id).unwrap().is_none());
        assert!(
            db.update_entry(bob, id, &entry(day(2), (9, 0), (10, 0)))
                .unwrap()
                .is_none()
        );
        assert!(!db.delete_entry(bob, id).unwrap());
        assert!(db.list_entries(bob, &EntryFilter::All).unwrap().is_empty());

        let stored = db.get_entry(alice, id).unwrap().unwrap();
        assert_eq!(stored.date, day(1));
    }

    #[test]
    fn update_replaces_all_fields() {
        let (mut db, alice, _) = db_with_users();
        let id = db.insert_entry(alice, &entry(day(1), (9, 0), (10, 0))).unwrap();

        let replacement = entry(day(3), (13, 0), (14, 45));
        let updated = db.update_entry(alice, id, &replacement).unwrap().unwrap();
        assert_eq!(updated, db.get_entry(alice, id).unwrap().unwrap());
        assert_eq!(updated.date, day(3));
        assert_eq!(updated.end_time, hm(14, 45));
    }

    #[test]
    fn delete_reports_whether_a_row_was_removed() {
        let (mut db, alice, _) = db_with_users();
        let id = db.insert_entry(alice, &entry(day(1), (9, 0), (10, 0))).unwrap();
        assert!(db.delete_entry(alice, id).unwrap());
        assert!(!db.delete_entry(alice, id).unwrap());
    }

    #[test]
    fn list_filters_and_orders_entries() {
        let (mut db, alice, _) = db_with_users();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let dec = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        db.insert_entry(alice, &entry(day(2), (13, 0), (14, 0))).unwrap();
        db.insert_entry(alice, &entry(day(2), (8, 0), (9, 0))).unwrap();
        db.insert_entry(alice, &entry(day(20), (8, 0), (9, 0))).unwrap();
        db.insert_entry(alice, &entry(feb, (8, 0), (9, 0))).unwrap();
        db.insert_entry(alice, &entry(dec, (8, 0), (9, 0))).unwrap();

        let all = db.list_entries(alice, &EntryFilter::All).unwrap();
        let dates: Vec<_> = all.iter().map(|e| (e.date, e.start_time)).collect();
        assert_eq!(
            dates,
            vec![
                (dec, hm(8, 0)),
                (day(2), hm(8, 0)),
                (day(2), hm(13, 0)),
                (day(20), hm(8, 0)),
                (feb, hm(8, 0)),
            ]
        );

        let on_day = db.list_entries(alice, &EntryFilter::Date(day(2))).unwrap();
        assert_eq!(on_day.len(), 2);

        let january = db
            .list_entries(alice, &EntryFilter::Month("2024-01".parse().unwrap()))
            .unwrap();
        assert_eq!(january.len(), 3);
        assert!(january.iter().all(|e| e.date.format("%Y-%m").to_string() == "2024-01"));

        let range = DateRange::new(day(2), feb).unwrap();
        let in_range = db.list_entries(alice, &EntryFilter::Range(range)).unwrap();
        assert_eq!(in_range.len(), 4);
    }

    #[test]
    fn legacy_rows_with_seconds_and_off_grid_minutes_are_readable() {
        let (db, alice, _) = db_with_users();
        db.conn
            .execute(
                "INSERT INTO time_entries (user_id, date, start_time, end_time) VALUES (?, '2024-01-01', '09:02:00', '09:59:00')",
                [alice.get()],
            )
            .unwrap();

        let entries = db.list_entries(alice, &EntryFilter::All).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].start_time, hm(9, 2));

        let range = DateRange::new(day(1), day(1)).unwrap();
        assert_eq!(summarize(&entries, &range).total_minutes, 57);
    }

    #[test]
    fn corrupt_rows_surface_as_errors() {
        let (db, alice, _) = db_with_users();
        db.conn
            .execute(
                "INSERT INTO time_entries (user_id, date, start_time, end_time) VALUES (?, 'yesterday', '09:00', '10:00')",
                [alice.get()],
            )
            .unwrap();

        let err = db.list_entries(alice, &EntryFilter::All).unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidEntryData { column: "date", .. }
        ));
    }

    #[test]
    fn users_are_unique_by_name() {
        let (mut db, alice, _) = db_with_users();
        let found = db.find_user_by_name("alice").unwrap().unwrap();
        assert_eq!(found.id, alice);
        assert_eq!(db.find_user_by_id(alice).unwrap().unwrap().username, "alice");
        assert!(db.find_user_by_name("carol").unwrap().is_none());
        assert!(matches!(
            db.insert_user_record("alice", "x$y"),
            Err(DbError::DuplicateUsername(name)) if name == "alice"
        ));
    }

    #[test]
    fn username_conflict_is_a_duplicate_store_error() {
        let (mut db, _, _) = db_with_users();
        let err = CredentialStore::insert_user(&mut db, "bob", "x$y").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(name) if name == "bob"));
        assert_eq!(db.stats().unwrap().users, 2);
    }

    #[test]
    fn tokens_roundtrip_and_purge() {
        let (mut db, alice, _) = db_with_users();
        let now = Utc::now();
        let live = TokenRecord {
            user_id: alice,
            expires_at: now + Duration::minutes(30),
        };
        let stale = TokenRecord {
            user_id: alice,
            expires_at: now - Duration::minutes(1),
        };
        db.insert_access_token("live", &live).unwrap();
        db.insert_access_token("stale", &stale).unwrap();

        let found = db.find_access_token("live").unwrap().unwrap();
        assert_eq!(found.user_id, alice);
        assert_eq!(
            found.expires_at.timestamp_millis(),
            live.expires_at.timestamp_millis()
        );

        assert_eq!(db.purge_expired_tokens(now).unwrap(), 1);
        assert!(db.find_access_token("stale").unwrap().is_none());
        assert!(db.delete_access_token("live").unwrap());
        assert!(db.find_access_token("live").unwrap().is_none());
    }

    #[test]
    fn stats_report_counts_and_date_span() {
        let (mut db, alice, _) = db_with_users();
        assert_eq!(
            db.stats().unwrap(),
            DbStats {
                users: 2,
                entries: 0,
                first_date: None,
                last_date: None,
            }
        );
        db.insert_entry(alice, &entry(day(5), (9, 0), (10, 0))).unwrap();
        db.insert_entry(alice, &entry(day(9), (9, 0), (10, 0))).unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.first_date.as_deref(), Some("2024-01-05"));
        assert_eq!(stats.last_date.as_deref(), Some("2024-01-09"));
    }

    #[test]
    fn entry_service_runs_on_sqlite() {
        let (mut db, alice, _) = db_with_users();
        let mut service = EntryService::new(&mut db);
        let created = service
            .create(
                alice,
                trkr_core::EntryInput {
                    date: day(1),
                    start_time: hm(9, 0),
                    end_time: hm(17, 0),
                },
            )
            .unwrap();
        let summary = service.summary(alice, day(1), day(31)).unwrap();
        assert_eq!(summary.total_minutes, 480);

        service.delete(alice, created.id).unwrap();
        assert!(matches!(
            service.get(alice, created.id),
            Err(TrackerError::NotFound(_))
        ));
    }
}
