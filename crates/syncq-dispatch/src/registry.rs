//! Pending registry
//!
//! Authoritative map of in-flight items keyed by [`ItemId`]. At most one
//! [`PendingEntry`] exists per id; a second insert for the same id is
//! rejected so that bursts of edits collapse into a single push.

use std::collections::HashMap;
use std::time::Instant;

use syncq_core::domain::{ItemId, PendingEntry, Priority, SyncItem};

#[derive(Debug, Default)]
pub struct PendingRegistry {
    entries: HashMap<ItemId, PendingEntry>,
    next_sequence: u64,
}

impl PendingRegistry {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &ItemId) -> Option<&PendingEntry> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &ItemId) -> Option<&mut PendingEntry> {
        self.entries.get_mut(id)
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<PendingEntry> {
        self.entries.remove(id)
    }

    /// Hands out the next enqueue sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    /// Inserts a fresh entry unless the id is already pending
    ///
    /// Returns false (and leaves the existing entry untouched, including its
    /// priority) when the id is already present.
    pub fn insert_new(&mut self, item: SyncItem, priority: Priority, now: Instant) -> bool {
        if self.entries.contains_key(item.id()) {
            return false;
        }
        let sequence = self.next_sequence();
        let id = item.id().clone();
        self.entries
            .insert(id, PendingEntry::new(item, priority, now, sequence));
        true
    }

    /// Inserts a prepared entry, e.g. one revived from quarantine
    pub fn insert_entry(&mut self, entry: PendingEntry) -> bool {
        if self.entries.contains_key(entry.item.id()) {
            return false;
        }
        self.entries.insert(entry.item.id().clone(), entry);
        true
    }

    /// Items ready at `now`, in dispatch order
    ///
    /// Order is priority first, then enqueue time, then enqueue sequence.
    pub fn ready_batch(&self, now: Instant) -> Vec<SyncItem> {
        let mut ready: Vec<&PendingEntry> =
            self.entries.values().filter(|e| e.is_ready(now)).collect();
        ready.sort_by_key(|e| e.dispatch_key());
        ready.into_iter().map(|e| e.item.clone()).collect()
    }

    /// Number of entries still waiting out a backoff at `now`
    pub fn waiting_count(&self, now: Instant) -> usize {
        self.entries.values().filter(|e| e.is_waiting(now)).count()
    }

    /// Earliest future retry instant among waiting entries
    pub fn earliest_retry_at(&self, now: Instant) -> Option<Instant> {
        self.entries
            .values()
            .filter(|e| e.is_waiting(now))
            .filter_map(|e| e.next_retry_at)
            .min()
    }

    /// Entries in dispatch order, for inspection
    pub fn snapshot(&self) -> Vec<PendingEntry> {
        let mut entries: Vec<PendingEntry> = self.entries.values().cloned().collect();
        entries.sort_by_key(|e| e.dispatch_key());
        entries
    }
}
