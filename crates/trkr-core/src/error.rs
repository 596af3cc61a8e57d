//! Errors surfaced to the transport layer.

use std::fmt;

use chrono::Duration;
use thiserror::Error;

use crate::entry::EntryError;
use crate::store::{EntryId, StoreError};
use crate::summary::InvalidRange;

/// Why an authentication attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Unknown username or wrong password.
    BadCredentials,
    /// The bearer token was never issued or has been revoked.
    InvalidToken,
    /// The bearer token is past its expiry.
    ExpiredToken,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BadCredentials => "incorrect username or password",
            Self::InvalidToken => "invalid token",
            Self::ExpiredToken => "token expired",
        };
        write!(f, "{s}")
    }
}

/// Every failure a tracker operation can report.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The candidate entry broke an entry rule.
    #[error(transparent)]
    Entry(#[from] EntryError),

    /// A summary was requested with start after end.
    #[error(transparent)]
    InvalidRange(#[from] InvalidRange),

    /// The entry does not exist or belongs to someone else.
    #[error("time entry not found: {0}")]
    NotFound(EntryId),

    #[error("authentication failed: {0}")]
    AuthFailure(AuthFailure),

    /// The username is already registered.
    #[error("username already registered: {0}")]
    DuplicateIdentity(String),

    /// The configured token lifetime pushes the expiry past the calendar range.
    #[error("token lifetime of {0} overflows the expiry timestamp")]
    TokenExpiryOverflow(Duration),

    #[error("failed to hash password: {0}")]
    PasswordHash(argon2::password_hash::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthFailure> for TrackerError {
    fn from(failure: AuthFailure) -> Self {
        Self::AuthFailure(failure)
    }
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
