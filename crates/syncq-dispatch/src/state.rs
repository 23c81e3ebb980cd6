//! Queue state
//!
//! [`QueueState`] owns the pending registry, the failed partition and the
//! counters, and is the only place where an item moves between them. It is
//! kept behind a single mutex by the queue; every method here is
//! synchronous so the lock is never held across an `.await`.
//!
//! An id is in at most one of {pending, failed} at any time.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use syncq_core::domain::{ItemId, PendingEntry, Priority, SyncItem};

use crate::failed::{FailedItem, FailedPartition};
use crate::registry::PendingRegistry;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::stats::{Counters, QueueStats};

/// Result of an enqueue request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A new pending entry was created
    Created,
    /// The id was quarantined; it was removed from there and re-created
    Revived,
    /// The id was already pending; nothing changed
    AlreadyPending,
}

impl EnqueueOutcome {
    pub fn is_new_entry(self) -> bool {
        !matches!(self, EnqueueOutcome::AlreadyPending)
    }
}

/// Result of applying a push attempt to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The entry was removed from pending
    Succeeded,
    /// The entry stays pending and waits `delay` before the next attempt
    Retrying { retry_count: u32, delay: Duration },
    /// The entry moved to the failed partition
    Quarantined { retry_count: u32 },
    /// The entry vanished while its push was in flight
    Missing,
}

#[derive(Debug, Default)]
pub struct QueueState {
    pending: PendingRegistry,
    failed: FailedPartition,
    counters: Counters,
    last_push_duration: Option<Duration>,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Enqueue
    // ========================================================================

    pub fn enqueue(&mut self, item: SyncItem, priority: Priority, now: Instant) -> EnqueueOutcome {
        if self.pending.contains(item.id()) {
            return EnqueueOutcome::AlreadyPending;
        }

        let revived = self.failed.remove(item.id()).is_some();
        self.pending.insert_new(item, priority, now);
        self.counters.enqueued += 1;

        if revived {
            EnqueueOutcome::Revived
        } else {
            EnqueueOutcome::Created
        }
    }

    // ========================================================================
    // Drain support
    // ========================================================================

    /// Items ready at `now`, in dispatch order
    pub fn ready_batch(&self, now: Instant) -> Vec<SyncItem> {
        self.pending.ready_batch(now)
    }

    pub fn record_success(&mut self, id: &ItemId, elapsed: Duration) -> AttemptOutcome {
        self.last_push_duration = Some(elapsed);
        if self.pending.remove(id).is_none() {
            return AttemptOutcome::Missing;
        }
        self.counters.succeeded += 1;
        AttemptOutcome::Succeeded
    }

    pub fn record_failure(
        &mut self,
        id: &ItemId,
        error: String,
        elapsed: Duration,
        now: Instant,
        failed_at: DateTime<Utc>,
        policy: &RetryPolicy,
    ) -> AttemptOutcome {
        self.last_push_duration = Some(elapsed);
        let Some(entry) = self.pending.get_mut(id) else {
            return AttemptOutcome::Missing;
        };

        let retry_count = entry.record_failure(error);
        match policy.decide(retry_count) {
            RetryDecision::RetryAfter(delay) => {
                entry.schedule_retry(now, delay);
                self.counters.retries += 1;
                AttemptOutcome::Retrying { retry_count, delay }
            }
            RetryDecision::Quarantine => {
                if let Some(entry) = self.pending.remove(id) {
                    self.failed.insert(entry.into_failed(failed_at));
                }
                self.counters.failed += 1;
                AttemptOutcome::Quarantined { retry_count }
            }
        }
    }

    pub fn waiting_count(&self, now: Instant) -> usize {
        self.pending.waiting_count(now)
    }

    pub fn earliest_retry_at(&self, now: Instant) -> Option<Instant> {
        self.pending.earliest_retry_at(now)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn pending_entry(&self, id: &ItemId) -> Option<&PendingEntry> {
        self.pending.get(id)
    }

    pub fn is_failed(&self, id: &ItemId) -> bool {
        self.failed.contains(id)
    }

    // ========================================================================
    // Failed partition control
    // ========================================================================

    /// Moves every quarantined entry back to pending with a clean retry state
    pub fn replay_all(&mut self, now: Instant) -> usize {
        let mut replayed = 0;
        for entry in self.failed.take_all() {
            let sequence = self.pending.next_sequence();
            if self.pending.insert_entry(entry.into_pending(now, sequence)) {
                replayed += 1;
            }
        }
        replayed
    }

    pub fn replay(&mut self, id: &ItemId, now: Instant) -> bool {
        let Some(entry) = self.failed.remove(id) else {
            return false;
        };
        let sequence = self.pending.next_sequence();
        self.pending.insert_entry(entry.into_pending(now, sequence))
    }

    pub fn clear_failed(&mut self) -> usize {
        self.failed.clear()
    }

    pub fn discard(&mut self, id: &ItemId) -> bool {
        self.failed.remove(id).is_some()
    }

    pub fn list_failed(&self) -> Vec<FailedItem> {
        self.failed.list()
    }

    // ========================================================================
    // Observability
    // ========================================================================

    pub fn stats(&self, now: Instant, is_draining: bool) -> QueueStats {
        QueueStats::new(
            self.counters,
            self.pending.len(),
            self.failed.len(),
            self.pending.waiting_count(now),
            is_draining,
            self.last_push_duration,
        )
    }

    /// Human-readable dump of counters, pending entries and failures
    pub fn report(&self, now: Instant, is_draining: bool) -> String {
        let c = self.counters;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "sync queue: pending={} failed={} draining={}",
            self.pending.len(),
            self.failed.len(),
            is_draining
        );
        let _ = writeln!(
            out,
            "  totals: enqueued={} succeeded={} failed={} retries={}",
            c.enqueued, c.succeeded, c.failed, c.retries
        );

        let pending = self.pending.snapshot();
        if !pending.is_empty() {
            let _ = writeln!(out, "  pending:");
            for entry in pending {
                let _ = write!(
                    out,
                    "    - [{}] {} retry_count={}",
                    entry.priority, entry.item, entry.retry_count
                );
                if entry.is_waiting(now) {
                    let _ = write!(
                        out,
                        " next_retry_in={}ms",
                        entry.remaining_backoff(now).as_millis()
                    );
                }
                if let Some(err) = &entry.last_error {
                    let _ = write!(out, " last_error={err:?}");
                }
                out.push('\n');
            }
        }

        let failed = self.failed.list();
        if !failed.is_empty() {
            let _ = writeln!(out, "  failed:");
            for item in failed {
                let _ = writeln!(
                    out,
                    "    - {}:{} retry_count={} failed_at={} last_error={:?}",
                    item.kind,
                    item.id,
                    item.retry_count,
                    item.failed_at.to_rfc3339(),
                    item.last_error
                );
            }
        }
        out
    }
}
