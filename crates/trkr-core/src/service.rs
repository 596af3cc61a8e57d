//! Time entry operations on behalf of an authenticated owner.
//!
//! Ties the validator and aggregator to an [`EntryStore`]. Business failures
//! (rejected entries, unknown IDs, inverted ranges) come back as
//! [`TrackerError`] values.

use chrono::NaiveDate;
use serde::Serialize;

use crate::entry::{EntryInput, validate_entry};
use crate::error::{Result, TrackerError};
use crate::store::{EntryFilter, EntryId, EntryStore, StoredEntry, UserId};
use crate::summary::{DailyTotal, DateRange, TimeSummary, daily_totals, summarize};

/// A summary plus its per-day breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    #[serde(flatten)]
    pub summary: TimeSummary,
    pub days: Vec<DailyTotal>,
}

/// Entry operations over a store.
pub struct EntryService<S> {
    store: S,
}

impl<S: EntryStore> EntryService<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Validates a candidate entry and stores it for `owner`.
    pub fn create(&mut self, owner: UserId, input: EntryInput) -> Result<StoredEntry> {
        let entry = validate_entry(input.date, input.start_time, input.end_time)
            .inspect_err(|err| tracing::warn!(%owner, %err, "rejected new entry"))?;
        let id = self.store.create(owner, &entry)?;
        tracing::debug!(%owner, %id, date = %entry.date(), "created entry");
        Ok(StoredEntry::from_entry(id, owner, &entry))
    }

    pub fn list(&self, owner: UserId, filter: &EntryFilter) -> Result<Vec<StoredEntry>> {
        Ok(self.store.list(owner, filter)?)
    }

    pub fn get(&self, owner: UserId, id: EntryId) -> Result<StoredEntry> {
        self.store
            .get(owner, id)?
            .ok_or(TrackerError::NotFound(id))
    }

    /// Replaces an entry wholesale, re-running the same validation as creation.
    pub fn update(&mut self, owner: UserId, id: EntryId, input: EntryInput) -> Result<StoredEntry> {
        let entry = validate_entry(input.date, input.start_time, input.end_time)
            .inspect_err(|err| tracing::warn!(%owner, %id, %err, "rejected entry update"))?;
        let updated = self
            .store
            .update(owner, id, &entry)?
            .ok_or(TrackerError::NotFound(id))?;
        tracing::debug!(%owner, %id, "updated entry");
        Ok(updated)
    }

    pub fn delete(&mut self, owner: UserId, id: EntryId) -> Result<()> {
        if !self.store.delete(owner, id)? {
            return Err(TrackerError::NotFound(id));
        }
        tracing::debug!(%owner, %id, "deleted entry");
        Ok(())
    }

    /// Totals for `owner` between `start` and `end`, both inclusive.
    pub fn summary(&self, owner: UserId, start: NaiveDate, end: NaiveDate) -> Result<TimeSummary> {
        let range = DateRange::new(start, end)?;
        let entries = self.store.list(owner, &EntryFilter::Range(range))?;
        Ok(summarize(&entries, &range))
    }

    /// Like [`summary`](Self::summary), with per-day totals attached.
    pub fn summary_report(
        &self,
        owner: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SummaryReport> {
        let range = DateRange::new(start, end)?;
        let entries = self.store.list(owner, &EntryFilter::Range(range))?;
        Ok(SummaryReport {
            summary: summarize(&entries, &range),
            days: daily_totals(&entries),
        })
    }
}
