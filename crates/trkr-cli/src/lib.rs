//! Time tracker CLI library.
//!
//! This crate provides the command-line interface over the entry validator,
//! the summary aggregator and the SQLite store.

mod cli;
pub mod commands;
mod config;
mod exit;
pub mod session;

pub use cli::{Cli, Commands, CredentialArgs, EntryArgs, ListArgs, SummaryArgs};
pub use config::Config;
pub use exit::exit_code;
