//! Saved login session.
//!
//! `trkr login` writes the issued bearer token to a small JSON file so later
//! commands can authenticate without repeating credentials.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session stored in the session file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Loads the saved session.
///
/// Returns `None` if the file doesn't exist.
/// Returns an error if the file exists but is unreadable/unparseable.
pub fn load(path: &Path) -> Result<Option<Session>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let session: Session =
                serde_json::from_str(&content).context("failed to parse session file")?;
            Ok(Some(session))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).context("failed to read session file"),
    }
}

/// Writes the session, creating parent directories as needed.
///
/// On Unix the file is readable by its owner only, since it holds a bearer token.
pub fn save(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create session directory")?;
    }
    let json = serde_json::to_string_pretty(session).context("failed to serialize session")?;
    write_private(path, json.as_bytes()).context("failed to write session file")?;
    Ok(())
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::fs::{OpenOptions, Permissions};
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation.
    file.set_permissions(Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

/// Removes the session file. Returns the session that was there, if any.
pub fn clear(path: &Path) -> Result<Option<Session>> {
    let existing = load(path)?;
    if existing.is_some() {
        std::fs::remove_file(path).context("failed to remove session file")?;
    }
    Ok(existing)
}
