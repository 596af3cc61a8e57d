//! Account commands: register, login, logout, whoami.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::Utc;
use trkr_core::Authenticator;
use trkr_db::Database;

use super::util::{current_identity, require_password, token_ttl};
use crate::cli::CredentialArgs;
use crate::session::{self, Session};
use crate::Config;

/// Creates a user account.
pub fn register<W: Write>(
    writer: &mut W,
    db: &mut Database,
    config: &Config,
    args: &CredentialArgs,
) -> Result<()> {
    let username = args.username.trim();
    if username.is_empty() {
        bail!("username cannot be empty");
    }
    let password = require_password(args.password.as_deref())?;

    let identity = Authenticator::new(db, token_ttl(config)?).register(username, password)?;
    writeln!(
        writer,
        "Registered user {} (id {})",
        identity.username, identity.user_id
    )?;
    Ok(())
}

/// Authenticates, issues a token and saves it as the current session.
pub fn login<W: Write>(
    writer: &mut W,
    db: &mut Database,
    config: &Config,
    args: &CredentialArgs,
    show_token: bool,
) -> Result<()> {
    let password = require_password(args.password.as_deref())?;
    db.purge_expired_tokens(Utc::now())?;

    let mut auth = Authenticator::new(db, token_ttl(config)?);
    let identity = auth.authenticate(args.username.trim(), password)?;
    let token = auth.issue_token(&identity)?;

    session::save(
        &config.session_path,
        &Session {
            username: identity.username.clone(),
            access_token: token.access_token.clone(),
            expires_at: token.expires_at,
        },
    )?;

    writeln!(
        writer,
        "Logged in as {} until {}",
        identity.username,
        token.expires_at.format("%Y-%m-%d %H:%M UTC")
    )?;
    if show_token {
        writeln!(writer, "{}", token.access_token)?;
    }
    Ok(())
}

/// Revokes the saved token and removes the session file.
pub fn logout<W: Write>(writer: &mut W, db: &mut Database, config: &Config) -> Result<()> {
    let Some(existing) = session::clear(&config.session_path)? else {
        writeln!(writer, "Not logged in.")?;
        return Ok(());
    };
    Authenticator::new(db, token_ttl(config)?).revoke(&existing.access_token)?;
    writeln!(writer, "Logged out {}.", existing.username)?;
    Ok(())
}

/// Prints the identity behind the current token.
pub fn whoami<W: Write>(
    writer: &mut W,
    db: &mut Database,
    config: &Config,
    token: Option<&str>,
) -> Result<()> {
    let identity = current_identity(db, config, token)?;
    writeln!(writer, "{} (id {})", identity.username, identity.user_id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use trkr_core::{AuthFailure, TrackerError};

    struct Fixture {
        _temp: tempfile::TempDir,
        db: Database,
        config: Config,
    }

    fn fixture() -> Fixture {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("trkr.db"),
            session_path: temp.path().join("session.json"),
            token_ttl_minutes: 30,
        };
        let db = Database::open(&config.database_path).unwrap();
        Fixture {
            _temp: temp,
            db,
            config,
        }
    }

    fn creds(username: &str, password: &str) -> CredentialArgs {
        CredentialArgs {
            username: username.to_string(),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn register_outputs_new_identity() {
        let mut fx = fixture();
        let mut output = Vec::new();
        register(&mut output, &mut fx.db, &fx.config, &creds("alice", "pw")).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"Registered user alice (id 1)");
    }

    #[test]
    fn register_twice_is_a_duplicate() {
        let mut fx = fixture();
        register(&mut Vec::new(), &mut fx.db, &fx.config, &creds("alice", "pw")).unwrap();
        let err = register(&mut Vec::new(), &mut fx.db, &fx.config, &creds("alice", "pw2"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::DuplicateIdentity(_))
        ));
    }

    #[test]
    fn register_rejects_blank_username() {
        let mut fx = fixture();
        let err = register(&mut Vec::new(), &mut fx.db, &fx.config, &creds("  ", "pw"))
            .unwrap_err();
        assert!(err.to_string().contains("username cannot be empty"));
    }

    #[test]
    fn login_saves_session_and_whoami_uses_it() {
        let mut fx = fixture();
        register(&mut Vec::new(), &mut fx.db, &fx.config, &creds("alice", "pw")).unwrap();

        let mut output = Vec::new();
        login(&mut output, &mut fx.db, &fx.config, &creds("alice", "pw"), true).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Logged in as alice until "));

        let saved = session::load(&fx.config.session_path).unwrap().unwrap();
        assert_eq!(saved.username, "alice");
        assert!(output.contains(&saved.access_token));

        let mut output = Vec::new();
        whoami(&mut output, &mut fx.db, &fx.config, None).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"alice (id 1)");
    }

    #[test]
    fn login_with_wrong_password_fails() {
        let mut fx = fixture();
        register(&mut Vec::new(), &mut fx.db, &fx.config, &creds("alice", "pw")).unwrap();
        let err = login(&mut Vec::new(), &mut fx.db, &fx.config, &creds("alice", "nope"), false)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::AuthFailure(AuthFailure::BadCredentials))
        ));
        assert!(session::load(&fx.config.session_path).unwrap().is_none());
    }

    #[test]
    fn logout_revokes_the_token() {
        let mut fx = fixture();
        register(&mut Vec::new(), &mut fx.db, &fx.config, &creds("alice", "pw")).unwrap();
        login(&mut Vec::new(), &mut fx.db, &fx.config, &creds("alice", "pw"), false).unwrap();
        let token = session::load(&fx.config.session_path)
            .unwrap()
            .unwrap()
            .access_token;

        let mut output = Vec::new();
        logout(&mut output, &mut fx.db, &fx.config).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"Logged out alice.");

        let err = whoami(&mut Vec::new(), &mut fx.db, &fx.config, Some(&token)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::AuthFailure(AuthFailure::InvalidToken))
        ));

        let mut output = Vec::new();
        logout(&mut output, &mut fx.db, &fx.config).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"Not logged in.");
    }
}
