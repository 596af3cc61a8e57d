//! Summary command for totals over a date range.
//!
//! `trkr summary --from D --to D` reports total time, entry count and the
//! number of days with entries. Without a range it covers the current week,
//! Monday to Sunday.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use trkr_core::summary::format_minutes;
use trkr_core::{DailyTotal, DateRange, EntryService, Identity, TimeSummary};
use trkr_db::Database;

use crate::cli::SummaryArgs;

/// Resolves the requested bounds, defaulting to the week containing `today`.
fn bounds(args: &SummaryArgs, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match (args.from, args.to) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            let week = DateRange::week_of(today);
            (week.start(), week.end())
        }
    }
}

/// Formats a summary, with optional per-day lines.
pub fn format_summary(summary: &TimeSummary, days: Option<&[DailyTotal]>) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "Summary {} to {}",
        summary.start_date, summary.end_date
    )
    .unwrap();
    writeln!(output, "Total:    {}", format_minutes(summary.total_minutes)).unwrap();
    writeln!(output, "Entries:  {}", summary.entries_count).unwrap();
    writeln!(output, "Days:     {}", summary.days_with_entries).unwrap();

    if let Some(days) = days.filter(|d| !d.is_empty()) {
        writeln!(output).unwrap();
        for day in days {
            let noun = if day.entries_count == 1 { "entry" } else { "entries" };
            writeln!(
                output,
                "{}  {:>8}  ({} {noun})",
                day.date,
                format_minutes(day.total_minutes),
                day.entries_count
            )
            .unwrap();
        }
    }

    output
}

/// Runs the summary command.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    owner: &Identity,
    args: &SummaryArgs,
    today: NaiveDate,
) -> Result<()> {
    let (start, end) = bounds(args, today);
    let service = EntryService::new(db);

    if args.daily {
        let report = service.summary_report(owner.user_id, start, end)?;
        if args.json {
            let json =
                serde_json::to_string_pretty(&report).context("failed to serialize summary")?;
            writeln!(writer, "{json}")?;
        } else {
            write!(writer, "{}", format_summary(&report.summary, Some(&report.days)))?;
        }
    } else {
        let summary = service.summary(owner.user_id, start, end)?;
        if args.json {
            let json =
                serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
            writeln!(writer, "{json}")?;
        } else {
            write!(writer, "{}", format_summary(&summary, None))?;
        }
    }

    Ok(())
}
