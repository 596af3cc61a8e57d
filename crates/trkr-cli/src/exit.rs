//! Process exit codes by failure kind.
//!
//! Clap exits with 2 on usage errors (unknown flags, malformed dates), so the
//! domain codes start at 3.

use trkr_core::TrackerError;

/// Unclassified failure (I/O, storage, configuration).
pub const FAILURE: u8 = 1;
/// Entry rule violation or inverted summary range.
pub const INVALID_INPUT: u8 = 3;
/// Entry missing or owned by someone else.
pub const NOT_FOUND: u8 = 4;
/// Bad credentials, unknown token or expired token.
pub const AUTH_FAILURE: u8 = 5;
/// Username already registered.
pub const DUPLICATE_IDENTITY: u8 = 6;

/// Maps an error to the exit code for its kind.
///
/// Walks the context chain, so `.context(..)` wrappers keep the code of the
/// underlying [`TrackerError`].
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let Some(tracker) = err.chain().find_map(|e| e.downcast_ref::<TrackerError>()) else {
        return FAILURE;
    };
    match tracker {
        TrackerError::Entry(_) | TrackerError::InvalidRange(_) => INVALID_INPUT,
        TrackerError::NotFound(_) => NOT_FOUND,
        TrackerError::AuthFailure(_) => AUTH_FAILURE,
        TrackerError::DuplicateIdentity(_) => DUPLICATE_IDENTITY,
        TrackerError::TokenExpiryOverflow(_)
        | TrackerError::PasswordHash(_)
        | TrackerError::Store(_) => FAILURE,
    }
}
