//! Shared utilities for CLI commands.

use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate, NaiveTime};
use trkr_core::entry::{parse_date, parse_time};
use trkr_core::{AuthFailure, Authenticator, Identity, TrackerError};
use trkr_db::Database;

use crate::{Config, session};

/// Clap value parser for `YYYY-MM-DD` dates.
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).map_err(|e| format!("invalid date {s:?} (expected YYYY-MM-DD): {e}"))
}

/// Clap value parser for `HH:MM` times (seconds are accepted and dropped later).
pub fn parse_time_arg(s: &str) -> Result<NaiveTime, String> {
    parse_time(s).map_err(|e| format!("invalid time {s:?} (expected HH:MM): {e}"))
}

/// Token lifetime from config, refusing non-positive values.
pub fn token_ttl(config: &Config) -> Result<Duration> {
    if config.token_ttl_minutes <= 0 {
        bail!(
            "token_ttl_minutes must be positive, got {}",
            config.token_ttl_minutes
        );
    }
    Duration::try_minutes(config.token_ttl_minutes).with_context(|| {
        format!(
            "token_ttl_minutes is out of range, got {}",
            config.token_ttl_minutes
        )
    })
}

/// Returns the password or fails with a hint on where to supply it.
pub fn require_password(password: Option<&str>) -> Result<&str> {
    match password {
        Some(p) if !p.is_empty() => Ok(p),
        _ => bail!("password required: pass --password or set TRKR_PASSWORD"),
    }
}

/// Resolves the caller's identity from `--token`/`TRKR_TOKEN` or the saved session.
pub fn current_identity(
    db: &mut Database,
    config: &Config,
    token: Option<&str>,
) -> Result<Identity> {
    let token = match token {
        Some(token) => token.to_string(),
        None => session::load(&config.session_path)?
            .map(|s| s.access_token)
            .ok_or(TrackerError::AuthFailure(AuthFailure::InvalidToken))
            .context("not logged in; run 'trkr login <username>'")?,
    };

    let identity = Authenticator::new(db, token_ttl(config)?).current_identity(&token)?;
    tracing::debug!(user_id = %identity.user_id, username = %identity.username, "resolved identity");
    Ok(identity)
}
