//! Status command for showing database location and contents.

use std::io::Write;

use anyhow::Result;

use trkr_db::Database;

use crate::Config;

/// Reports on `db`, which was opened from `config.database_path`.
pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config) -> Result<()> {
    let stats = db.stats()?;

    writeln!(writer, "Time tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Users:    {}", stats.users)?;
    writeln!(writer, "Entries:  {}", stats.entries)?;

    match (stats.first_date, stats.last_date) {
        (Some(first), Some(last)) => writeln!(writer, "Span:     {first} to {last}")?,
        _ => writeln!(writer, "No time entries recorded.")?,
    }

    Ok(())
}
