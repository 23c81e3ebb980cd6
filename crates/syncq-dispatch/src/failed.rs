//! Failed partition
//!
//! Quarantine for items that exhausted their retry budget. Nothing here is
//! retried automatically; entries leave only through replay, a fresh
//! enqueue of the same id, or an explicit discard.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use syncq_core::domain::{FailedEntry, ItemId, ItemKind, Priority};

/// Read-only view of a quarantined item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub priority: Priority,
    pub last_error: String,
    pub retry_count: u32,
    pub failed_at: DateTime<Utc>,
}

impl From<&FailedEntry> for FailedItem {
    fn from(entry: &FailedEntry) -> Self {
        Self {
            id: entry.item.id().clone(),
            kind: entry.item.kind(),
            priority: entry.priority,
            last_error: entry.last_error.clone(),
            retry_count: entry.retry_count,
            failed_at: entry.failed_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct FailedPartition {
    entries: HashMap<ItemId, FailedEntry>,
}

impl FailedPartition {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, entry: FailedEntry) {
        self.entries.insert(entry.item.id().clone(), entry);
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<FailedEntry> {
        self.entries.remove(id)
    }

    /// Removes every entry, oldest failure first
    pub fn take_all(&mut self) -> Vec<FailedEntry> {
        let mut entries: Vec<FailedEntry> = self.entries.drain().map(|(_, e)| e).collect();
        entries.sort_by(|a, b| {
            a.failed_at
                .cmp(&b.failed_at)
                .then_with(|| a.item.id().cmp(b.item.id()))
        });
        entries
    }

    /// Discards every entry and returns how many were dropped
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Quarantined items, oldest failure first
    pub fn list(&self) -> Vec<FailedItem> {
        let mut items: Vec<FailedItem> = self.entries.values().map(FailedItem::from).collect();
        items.sort_by(|a, b| a.failed_at.cmp(&b.failed_at).then_with(|| a.id.cmp(&b.id)));
        items
    }
}
