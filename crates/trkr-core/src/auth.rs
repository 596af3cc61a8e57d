//! Password and bearer-token authentication.
//!
//! Passwords are stored as Argon2id PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`).
//! Tokens are random alphanumeric strings with a server-side expiry.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, distr::Alphanumeric};
use serde::Serialize;

use crate::error::{AuthFailure, Result, TrackerError};
use crate::store::{CredentialStore, Identity, StoreError, TokenRecord};

/// 22 base64 characters, about 16 bytes of entropy.
const SALT_LEN: usize = 22;
const TOKEN_LEN: usize = 32;

/// Default lifetime of an issued token.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// A freshly issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generates a random bearer token.
pub fn generate_token() -> String {
    random_string(TOKEN_LEN)
}

/// Hashes a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    // Alphanumeric characters are a subset of the PHC base64 alphabet.
    let salt =
        SaltString::from_b64(&random_string(SALT_LEN)).map_err(TrackerError::PasswordHash)?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(TrackerError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Checks a password against a stored PHC hash string.
///
/// A stored value that does not parse never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|hash| {
        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok()
    })
}

/// Authentication service over a [`CredentialStore`].
pub struct Authenticator<S> {
    store: S,
    token_ttl: Duration,
}

impl<S: CredentialStore> Authenticator<S> {
    pub const fn new(store: S, token_ttl: Duration) -> Self {
        Self { store, token_ttl }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Registers a new user, refusing a username that already exists.
    pub fn register(&mut self, username: &str, password: &str) -> Result<Identity> {
        if self.store.find_user(username)?.is_some() {
            tracing::warn!(username, "registration refused: username taken");
            return Err(TrackerError::DuplicateIdentity(username.to_string()));
        }
        let user_id = match self.store.insert_user(username, &hash_password(password)?) {
            Ok(user_id) => user_id,
            // Lost a race with a concurrent registration of the same name.
            Err(StoreError::Duplicate(_)) => {
                tracing::warn!(username, "registration refused: username taken");
                return Err(TrackerError::DuplicateIdentity(username.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(%user_id, username, "registered user");
        Ok(Identity {
            user_id,
            username: username.to_string(),
        })
    }

    /// Resolves a username and password to an identity.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Identity> {
        match self.store.find_user(username)? {
            Some(user) if verify_password(password, &user.password_hash) => Ok(user.identity()),
            _ => {
                tracing::warn!(username, "authentication failed");
                Err(AuthFailure::BadCredentials.into())
            }
        }
    }

    /// Issues a bearer token for an authenticated identity.
    pub fn issue_token(&mut self, identity: &Identity) -> Result<AccessToken> {
        self.issue_token_at(identity, Utc::now())
    }

    pub fn issue_token_at(&mut self, identity: &Identity, now: DateTime<Utc>) -> Result<AccessToken> {
        let expires_at = now
            .checked_add_signed(self.token_ttl)
            .ok_or(TrackerError::TokenExpiryOverflow(self.token_ttl))?;
        let token = generate_token();
        let record = TokenRecord {
            user_id: identity.user_id,
            expires_at,
        };
        self.store.insert_token(&token, &record)?;
        tracing::debug!(user_id = %identity.user_id, expires_at = %record.expires_at, "issued token");
        Ok(AccessToken {
            access_token: token,
            token_type: "bearer",
            expires_at: record.expires_at,
        })
    }

    /// Resolves a bearer token to the identity it was issued for.
    pub fn current_identity(&self, token: &str) -> Result<Identity> {
        self.current_identity_at(token, Utc::now())
    }

    pub fn current_identity_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity> {
        let record = self
            .store
            .find_token(token)?
            .ok_or(AuthFailure::InvalidToken)?;
        if record.expires_at <= now {
            return Err(AuthFailure::ExpiredToken.into());
        }
        // A token whose user has since disappeared is as good as unknown.
        let user = self
            .store
            .user_by_id(record.user_id)?
            .ok_or(AuthFailure::InvalidToken)?;
        Ok(user.identity())
    }

    /// Revokes a token. Returns whether it existed.
    pub fn revoke(&mut self, token: &str) -> Result<bool> {
        Ok(self.store.delete_token(token)?)
    }
}
