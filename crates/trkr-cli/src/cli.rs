//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use trkr_core::{EntryId, YearMonth};

use crate::commands::util::{parse_date_arg, parse_time_arg};

/// Personal time tracker.
///
/// Records daily work intervals on five-minute boundaries and reports totals
/// over date ranges.
#[derive(Debug, Parser)]
#[command(name = "trkr", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Bearer token to use instead of the saved session.
    #[arg(long, global = true, env = "TRKR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a user account.
    Register(CredentialArgs),

    /// Log in and save a session token.
    Login {
        #[command(flatten)]
        credentials: CredentialArgs,

        /// Print the issued token on stdout.
        #[arg(long)]
        show_token: bool,
    },

    /// Revoke and forget the saved session token.
    Logout,

    /// Show the logged-in user.
    Whoami,

    /// Record a time entry.
    Add(EntryArgs),

    /// List time entries.
    List(ListArgs),

    /// Show a single time entry.
    Show {
        /// Entry ID.
        id: EntryId,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Replace a time entry's date and times.
    Edit {
        /// Entry ID.
        id: EntryId,

        #[command(flatten)]
        entry: EntryArgs,
    },

    /// Delete a time entry.
    Delete {
        /// Entry ID.
        id: EntryId,
    },

    /// Summarize time over a date range.
    Summary(SummaryArgs),

    /// Show database location and row counts.
    Status,
}

/// Username and password.
#[derive(Debug, Args)]
pub struct CredentialArgs {
    /// Account username.
    pub username: String,

    /// Account password.
    #[arg(long, env = "TRKR_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// A candidate time entry.
#[derive(Debug, Clone, Copy, Args)]
pub struct EntryArgs {
    /// Date of the entry (YYYY-MM-DD).
    #[arg(value_parser = parse_date_arg)]
    pub date: NaiveDate,

    /// Start time (HH:MM).
    #[arg(value_parser = parse_time_arg)]
    pub start: NaiveTime,

    /// End time (HH:MM). An end at or before the start crosses midnight.
    #[arg(value_parser = parse_time_arg)]
    pub end: NaiveTime,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Filters for `trkr list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only entries on this date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date_arg, conflicts_with = "month")]
    pub date: Option<NaiveDate>,

    /// Only entries in this month (YYYY-MM).
    #[arg(long)]
    pub month: Option<YearMonth>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Range selection for `trkr summary`.
///
/// Without `--from`/`--to` the summary covers the current week, Monday to Sunday.
#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// First date of the range (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date_arg, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Last date of the range, inclusive (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date_arg, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Include per-day totals.
    #[arg(long)]
    pub daily: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}
