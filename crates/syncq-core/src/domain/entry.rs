//! Queue entries
//!
//! A [`PendingEntry`] is the mutable retry record for an item that is waiting
//! to be pushed (or waiting out a backoff). A [`FailedEntry`] is the same
//! record after it exhausted its retry budget and was quarantined.
//!
//! ## Lifecycle
//!
//! ```text
//!   enqueue ──► Pending ──push ok──► (removed)
//!                 │  ▲
//!          fail   │  │ backoff elapsed
//!                 ▼  │
//!              Pending(waiting) ──retries exhausted──► Failed
//!                                                        │
//!   Pending(retry_count = 0) ◄──── replay / re-enqueue ──┘
//! ```
//!
//! Timestamps used for scheduling are monotonic [`Instant`]s supplied by the
//! caller, so that the dispatch layer can drive them from a pausable clock.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::sync_item::{Priority, SyncItem};

// ============================================================================
// PendingEntry
// ============================================================================

/// In-flight record for a single item id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub item: SyncItem,
    /// Priority assigned on first enqueue; never escalated
    pub priority: Priority,
    /// Number of failed push attempts so far
    pub retry_count: u32,
    /// Description of the most recent push failure
    pub last_error: Option<String>,
    /// When the entry entered the pending set
    pub enqueued_at: Instant,
    /// Strictly increasing enqueue counter, final FIFO tie-break
    pub sequence: u64,
    /// Earliest instant at which the next attempt may run
    pub next_retry_at: Option<Instant>,
}

impl PendingEntry {
    /// Create a fresh entry with no retry history
    #[must_use]
    pub fn new(item: SyncItem, priority: Priority, now: Instant, sequence: u64) -> Self {
        Self {
            item,
            priority,
            retry_count: 0,
            last_error: None,
            enqueued_at: now,
            sequence,
            next_retry_at: None,
        }
    }

    /// Returns true if the entry may be attempted at `now`
    #[must_use]
    pub fn is_ready(&self, now: Instant) -> bool {
        match self.next_retry_at {
            None => true,
            Some(at) => now >= at,
        }
    }

    /// Returns true if the entry is waiting for a backoff that ends after `now`
    #[must_use]
    pub fn is_waiting(&self, now: Instant) -> bool {
        !self.is_ready(now)
    }

    /// Time left until the entry becomes ready (zero if ready)
    #[must_use]
    pub fn remaining_backoff(&self, now: Instant) -> Duration {
        self.next_retry_at
            .map(|at| at.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Records a failed attempt and returns the new retry count
    pub fn record_failure(&mut self, error: impl Into<String>) -> u32 {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_error = Some(error.into());
        self.retry_count
    }

    /// Defers the next attempt until `now + delay`
    pub fn schedule_retry(&mut self, now: Instant, delay: Duration) {
        self.next_retry_at = Some(now + delay);
    }

    /// Ordering key used by the drain loop
    #[must_use]
    pub fn dispatch_key(&self) -> (Priority, Instant, u64) {
        (self.priority, self.enqueued_at, self.sequence)
    }

    /// Moves the entry into quarantine
    #[must_use]
    pub fn into_failed(self, failed_at: DateTime<Utc>) -> FailedEntry {
        FailedEntry {
            item: self.item,
            priority: self.priority,
            retry_count: self.retry_count,
            last_error: self
                .last_error
                .unwrap_or_else(|| "unknown error".to_string()),
            failed_at,
        }
    }
}

// ============================================================================
// FailedEntry
// ============================================================================

/// Quarantined record of an item that exhausted its retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntry {
    pub item: SyncItem,
    pub priority: Priority,
    pub retry_count: u32,
    pub last_error: String,
    pub failed_at: DateTime<Utc>,
}

impl FailedEntry {
    /// Revives the entry as a fresh pending record
    ///
    /// Retry history is dropped; the original priority is kept.
    #[must_use]
    pub fn into_pending(self, now: Instant, sequence: u64) -> PendingEntry {
        PendingEntry::new(self.item, self.priority, now, sequence)
    }
}
