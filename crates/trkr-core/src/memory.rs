//! In-memory storage for tests and dry runs.

use std::collections::{BTreeMap, HashMap};

use crate::entry::TimeEntry;
use crate::store::{
    CredentialStore, EntryFilter, EntryId, EntryStore, StoreError, StoredEntry, TokenRecord,
    UserId, UserRecord,
};

/// Implements both store traits over plain maps.
///
/// Data lives only as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<EntryId, StoredEntry>,
    users: BTreeMap<UserId, UserRecord>,
    tokens: HashMap<String, TokenRecord>,
    next_entry_id: i64,
    next_user_id: i64,
}

impl MemoryStore {
    /// Inserts a row as-is, bypassing validation, the way a legacy row would
    /// already sit in storage.
    pub fn insert_raw(&mut self, entry: StoredEntry) {
        self.next_entry_id = self.next_entry_id.max(entry.id.get());
        self.entries.insert(entry.id, entry);
    }
}

impl EntryStore for MemoryStore {
    fn create(&mut self, owner: UserId, entry: &TimeEntry) -> Result<EntryId, StoreError> {
        self.next_entry_id += 1;
        let id = EntryId::new(self.next_entry_id);
        self.entries
            .insert(id, StoredEntry::from_entry(id, owner, entry));
        Ok(id)
    }

    fn list(&self, owner: UserId, filter: &EntryFilter) -> Result<Vec<StoredEntry>, StoreError> {
        let mut entries: Vec<StoredEntry> = self
            .entries
            .values()
            .filter(|e| e.owner == owner && filter.matches(e.date))
            .copied()
            .collect();
        entries.sort_by_key(|e| (e.date, e.start_time, e.id));
        Ok(entries)
    }

    fn get(&self, owner: UserId, id: EntryId) -> Result<Option<StoredEntry>, StoreError> {
        Ok(self.entries.get(&id).filter(|e| e.owner == owner).copied())
    }

    fn update(
        &mut self,
        owner: UserId,
        id: EntryId,
        entry: &TimeEntry,
    ) -> Result<Option<StoredEntry>, StoreError> {
        match self.entries.get_mut(&id) {
            Some(stored) if stored.owner == owner => {
                *stored = StoredEntry::from_entry(id, owner, entry);
                Ok(Some(*stored))
            }
            _ => Ok(None),
        }
    }

    fn delete(&mut self, owner: UserId, id: EntryId) -> Result<bool, StoreError> {
        if self.get(owner, id)?.is_none() {
            return Ok(false);
        }
        Ok(self.entries.remove(&id).is_some())
    }
}

impl CredentialStore for MemoryStore {
    fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    fn user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(&id).cloned())
    }

    fn insert_user(&mut self, username: &str, password_hash: &str) -> Result<UserId, StoreError> {
        if self.users.values().any(|u| u.username == username) {
            return Err(StoreError::Duplicate(username.to_string()));
        }
        self.next_user_id += 1;
        let id = UserId::new(self.next_user_id);
        self.users.insert(
            id,
            UserRecord {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(id)
    }

    fn insert_token(&mut self, token: &str, record: &TokenRecord) -> Result<(), StoreError> {
        self.tokens.insert(token.to_string(), *record);
        Ok(())
    }

    fn find_token(&self, token: &str) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self.tokens.get(token).copied())
    }

    fn delete_token(&mut self, token: &str) -> Result<bool, StoreError> {
        Ok(self.tokens.remove(token).is_some())
    }
}
