//! CLI subcommand implementations.

pub mod account;
pub mod entries;
pub mod status;
pub mod summary;
pub mod util;
