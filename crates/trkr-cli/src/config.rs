//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use trkr_core::auth::DEFAULT_TOKEN_TTL_MINUTES;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Where `trkr login` keeps the issued token.
    pub session_path: PathBuf,

    /// Lifetime of issued tokens, in minutes.
    pub token_ttl_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let state_dir = dirs_state_path().unwrap_or_else(|| data_dir.clone());
        Self {
            database_path: data_dir.join("trkr.db"),
            session_path: state_dir.join("session.json"),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TRKR_*)
        figment = figment.merge(Env::prefixed("TRKR_").only(&[
            "database_path",
            "session_path",
            "token_ttl_minutes",
        ]));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for trkr.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("trkr"))
}

/// Returns the platform-specific data directory for trkr.
///
/// On Linux: `~/.local/share/trkr`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("trkr"))
}

/// Returns the platform-specific state directory for trkr.
///
/// On Linux: `~/.local/state/trkr`. Not available on every platform.
pub fn dirs_state_path() -> Option<PathBuf> {
    dirs::state_dir().map(|p| p.join("trkr"))
}
