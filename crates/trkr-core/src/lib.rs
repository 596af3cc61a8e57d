//! Core domain logic for trkr.
//!
//! This crate contains:
//! - Entry validation: five-minute boundaries and overnight rules
//! - Summary aggregation: total minutes, entry count, distinct days
//! - Collaborator traits for storage and credentials, plus an in-memory store
//! - Password and bearer-token authentication

pub mod auth;
pub mod entry;
mod error;
mod memory;
pub mod service;
pub mod store;
pub mod summary;

pub use auth::{AccessToken, Authenticator};
pub use entry::{EntryError, EntryInput, TimeEntry, TimeField, validate_entry};
pub use error::{AuthFailure, Result, TrackerError};
pub use memory::MemoryStore;
pub use service::{EntryService, SummaryReport};
pub use store::{
    CredentialStore, EntryFilter, EntryId, EntryStore, Identity, StoreError, StoredEntry,
    TokenRecord, UserId, UserRecord, YearMonth,
};
pub use summary::{DailyTotal, DateRange, InvalidRange, TimeSummary, WorkInterval, summarize};
