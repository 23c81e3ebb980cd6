//! Queue statistics
//!
//! Monotonic counters plus a point-in-time [`QueueStats`] snapshot.

use std::time::Duration;

use serde::Serialize;

/// Running totals since the queue was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Pending entries created (fresh enqueues and revivals by enqueue)
    pub enqueued: u64,
    /// Items pushed successfully
    pub succeeded: u64,
    /// Items quarantined after exhausting retries
    pub failed: u64,
    /// Failed attempts that were not terminal
    pub retries: u64,
}

/// Snapshot returned by `SyncQueue::stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total_enqueued: u64,
    pub total_succeeded: u64,
    pub total_failed: u64,
    pub total_retries: u64,
    pub pending_count: usize,
    pub failed_count: usize,
    /// Pending entries currently waiting out a backoff
    pub waiting_count: usize,
    pub is_draining: bool,
    /// Duration of the most recent push attempt, in milliseconds
    pub last_push_duration_ms: Option<u64>,
}

impl QueueStats {
    pub(crate) fn new(
        counters: Counters,
        pending_count: usize,
        failed_count: usize,
        waiting_count: usize,
        is_draining: bool,
        last_push_duration: Option<Duration>,
    ) -> Self {
        Self {
            total_enqueued: counters.enqueued,
            total_succeeded: counters.succeeded,
            total_failed: counters.failed,
            total_retries: counters.retries,
            pending_count,
            failed_count,
            waiting_count,
            is_draining,
            last_push_duration_ms: last_push_duration.map(|d| d.as_millis() as u64),
        }
    }

    /// True when nothing is pending (quarantined items do not count)
    pub fn is_idle(&self) -> bool {
        self.pending_count == 0 && !self.is_draining
    }
}
