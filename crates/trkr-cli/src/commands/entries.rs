//! Time entry commands: add, list, show, edit, delete.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use trkr_core::entry::{TIME_FORMAT, minute_of_day};
use trkr_core::summary::format_minutes;
use trkr_core::{
    EntryFilter, EntryId, EntryInput, EntryService, Identity, StoredEntry, WorkInterval,
};
use trkr_db::Database;

use crate::cli::{EntryArgs, ListArgs};

impl From<EntryArgs> for EntryInput {
    fn from(args: EntryArgs) -> Self {
        Self {
            date: args.date,
            start_time: args.start,
            end_time: args.end,
        }
    }
}

/// One-line description: `2024-01-01 09:00-17:30 (8h 30m)`.
pub fn describe_entry(entry: &StoredEntry) -> String {
    format!(
        "{} {}-{} ({}){}",
        entry.date,
        entry.start_time.format(TIME_FORMAT),
        entry.end_time.format(TIME_FORMAT),
        format_minutes(u64::from(entry.duration_minutes())),
        overnight_marker(entry)
    )
}

fn overnight_marker(entry: &StoredEntry) -> &'static str {
    if minute_of_day(entry.end_time) < minute_of_day(entry.start_time) {
        " +1d"
    } else {
        ""
    }
}

/// Formats entries as a table with a total line.
pub fn format_entries(entries: &[StoredEntry]) -> String {
    let mut output = String::new();

    if entries.is_empty() {
        writeln!(output, "No time entries.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<5} {:<10}  {:<5}  {:<5}  DURATION",
        "ID", "DATE", "START", "END"
    )
    .unwrap();

    let mut total = 0_u64;
    for entry in entries {
        let minutes = u64::from(entry.duration_minutes());
        total += minutes;
        writeln!(
            output,
            "{:<5} {:<10}  {:<5}  {:<5}  {}{}",
            entry.id.to_string(),
            entry.date.to_string(),
            entry.start_time.format(TIME_FORMAT).to_string(),
            entry.end_time.format(TIME_FORMAT).to_string(),
            format_minutes(minutes),
            overnight_marker(entry)
        )
        .unwrap();
    }

    let noun = if entries.len() == 1 { "entry" } else { "entries" };
    writeln!(output).unwrap();
    writeln!(
        output,
        "Total: {} across {} {noun}",
        format_minutes(total),
        entries.len()
    )
    .unwrap();

    output
}

fn write_entry<W: Write>(
    writer: &mut W,
    verb: &str,
    entry: &StoredEntry,
    json: bool,
) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(entry).context("failed to serialize entry")?;
        writeln!(writer, "{json}")?;
    } else {
        writeln!(writer, "{verb} entry {}: {}", entry.id, describe_entry(entry))?;
    }
    Ok(())
}

/// Validates and records a new entry.
pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    owner: &Identity,
    args: EntryArgs,
) -> Result<()> {
    let entry = EntryService::new(db).create(owner.user_id, args.into())?;
    write_entry(writer, "Created", &entry, args.json)
}

/// Lists entries, optionally for a single date or month.
pub fn list<W: Write>(
    writer: &mut W,
    db: &mut Database,
    owner: &Identity,
    args: &ListArgs,
) -> Result<()> {
    let filter = match (args.date, args.month) {
        (Some(date), _) => EntryFilter::Date(date),
        (None, Some(month)) => EntryFilter::Month(month),
        (None, None) => EntryFilter::All,
    };
    let entries = EntryService::new(db).list(owner.user_id, &filter)?;

    if args.json {
        let json = serde_json::to_string_pretty(&entries).context("failed to serialize entries")?;
        writeln!(writer, "{json}")?;
    } else {
        write!(writer, "{}", format_entries(&entries))?;
    }
    Ok(())
}

/// Prints a single entry.
pub fn show<W: Write>(
    writer: &mut W,
    db: &mut Database,
    owner: &Identity,
    id: EntryId,
    json: bool,
) -> Result<()> {
    let entry = EntryService::new(db).get(owner.user_id, id)?;
    write_entry(writer, "Time", &entry, json)
}

/// Replaces an entry's date and times.
pub fn edit<W: Write>(
    writer: &mut W,
    db: &mut Database,
    owner: &Identity,
    id: EntryId,
    args: EntryArgs,
) -> Result<()> {
    let entry = EntryService::new(db).update(owner.user_id, id, args.into())?;
    write_entry(writer, "Updated", &entry, args.json)
}

/// Deletes an entry.
pub fn delete<W: Write>(
    writer: &mut W,
    db: &mut Database,
    owner: &Identity,
    id: EntryId,
) -> Result<()> {
    EntryService::new(db).delete(owner.user_id, id)?;
    writeln!(writer, "Deleted entry {id}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{NaiveDate, NaiveTime};
    use insta::assert_snapshot;
    use trkr_core::{EntryError, TrackerError, UserId};

    fn setup() -> (Database, Identity, Identity) {
        let mut db = Database::open_in_memory().unwrap();
        let alice = db.insert_user_record("alice", "salt$hash").unwrap();
        let bob = db.insert_user_record("bob", "salt$hash").unwrap();
        let identity = |user_id: UserId, name: &str| Identity {
            user_id,
            username: name.to_string(),
        };
        (db, identity(alice, "alice"), identity(bob, "bob"))
    }

    fn args(date: &str, start: &str, end: &str) -> EntryArgs {
        EntryArgs {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            start: trkr_core::entry::parse_time(start).unwrap(),
            end: trkr_core::entry::parse_time(end).unwrap(),
            json: false,
        }
    }

    fn list_args() -> ListArgs {
        ListArgs {
            date: None,
            month: None,
            json: false,
        }
    }

    fn run_list(db: &mut Database, owner: &Identity, args: &ListArgs) -> String {
        let mut output = Vec::new();
        list(&mut output, db, owner, args).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn add_reports_created_entry() {
        let (mut db, alice, _) = setup();
        let mut output = Vec::new();
        add(&mut output, &mut db, &alice, args("2024-01-01", "09:00:45", "17:30")).unwrap();
        assert_snapshot!(
            String::from_utf8(output).unwrap(),
            @"Created entry 1: 2024-01-01 09:00-17:30 (8h 30m)"
        );
    }

    #[test]
    fn add_rejects_off_grid_time() {
        let (mut db, alice, _) = setup();
        let err = add(&mut Vec::new(), &mut db, &alice, args("2024-01-01", "09:07", "17:30"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::Entry(EntryError::NotFiveMinuteIncrement { .. }))
        ));
        assert_eq!(run_list(&mut db, &alice, &list_args()), "No time entries.\n");
    }

    #[test]
    fn add_rejects_late_overnight_end() {
        let (mut db, alice, _) = setup();
        let err = add(&mut Vec::new(), &mut db, &alice, args("2024-01-01", "23:00", "07:00"))
            .unwrap_err();
        assert!(err.to_string().contains("overnight entries must end before 06:00"));
    }

    #[test]
    fn list_formats_table_with_total() {
        let (mut db, alice, _) = setup();
        add(&mut Vec::new(), &mut db, &alice, args("2024-01-02", "23:00", "05:30")).unwrap();
        add(&mut Vec::new(), &mut db, &alice, args("2024-01-01", "09:00", "17:30")).unwrap();

        let output = run_list(&mut db, &alice, &list_args());
        assert_snapshot!(output, @r"
        ID    DATE        START  END    DURATION
        2     2024-01-01  09:00  17:30  8h 30m
        1     2024-01-02  23:00  05:30  6h 30m +1d

        Total: 15h 0m across 2 entries
        ");
    }

    #[test]
    fn list_filters_by_month_and_date() {
        let (mut db, alice, _) = setup();
        add(&mut Vec::new(), &mut db, &alice, args("2024-01-31", "09:00", "10:00")).unwrap();
        add(&mut Vec::new(), &mut db, &alice, args("2024-02-01", "09:00", "10:00")).unwrap();

        let january = run_list(
            &mut db,
            &alice,
            &ListArgs {
                month: Some("2024-01".parse().unwrap()),
                ..list_args()
            },
        );
        assert!(january.contains("2024-01-31"));
        assert!(!january.contains("2024-02-01"));

        let one_day = run_list(
            &mut db,
            &alice,
            &ListArgs {
                date: Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
                ..list_args()
            },
        );
        assert!(one_day.contains("Total: 1h 0m across 1 entry"));
    }

    #[test]
    fn list_json_uses_hours_and_minutes() {
        let (mut db, alice, _) = setup();
        add(&mut Vec::new(), &mut db, &alice, args("2024-01-01", "09:00", "17:30")).unwrap();

        let output = run_list(
            &mut db,
            &alice,
            &ListArgs {
                json: true,
                ..list_args()
            },
        );
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["start_time"], "09:00");
        assert_eq!(value[0]["end_time"], "17:30");
        assert_eq!(value[0]["date"], "2024-01-01");
    }

    #[test]
    fn edit_replaces_entry() {
        let (mut db, alice, _) = setup();
        add(&mut Vec::new(), &mut db, &alice, args("2024-01-01", "09:00", "17:30")).unwrap();

        let mut output = Vec::new();
        edit(
            &mut output,
            &mut db,
            &alice,
            EntryId::new(1),
            args("2024-01-03", "22:00", "02:00"),
        )
        .unwrap();
        assert_snapshot!(
            String::from_utf8(output).unwrap(),
            @"Updated entry 1: 2024-01-03 22:00-02:00 (4h 0m) +1d"
        );
    }

    #[test]
    fn other_users_entries_are_not_found() {
        let (mut db, alice, bob) = setup();
        add(&mut Vec::new(), &mut db, &alice, args("2024-01-01", "09:00", "17:30")).unwrap();
        let id = EntryId::new(1);

        let err = show(&mut Vec::new(), &mut db, &bob, id, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::NotFound(_))
        ));
        let replacement = args("2024-01-01", "09:00", "10:00");
        assert!(edit(&mut Vec::new(), &mut db, &bob, id, replacement).is_err());
        assert!(delete(&mut Vec::new(), &mut db, &bob, id).is_err());

        let mut output = Vec::new();
        show(&mut output, &mut db, &alice, id, false).unwrap();
        assert_snapshot!(
            String::from_utf8(output).unwrap(),
            @"Time entry 1: 2024-01-01 09:00-17:30 (8h 30m)"
        );
    }

    #[test]
    fn delete_removes_entry() {
        let (mut db, alice, _) = setup();
        add(&mut Vec::new(), &mut db, &alice, args("2024-01-01", "09:00", "17:30")).unwrap();

        let mut output = Vec::new();
        delete(&mut output, &mut db, &alice, EntryId::new(1)).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"Deleted entry 1");
        assert!(delete(&mut Vec::new(), &mut db, &alice, EntryId::new(1)).is_err());
    }

    #[test]
    fn describe_entry_marks_overnight() {
        let entry = StoredEntry {
            id: EntryId::new(3),
            owner: UserId::new(1),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
        };
        assert_eq!(describe_entry(&entry), "2024-01-01 23:00-05:00 (6h 0m) +1d");
    }
}
