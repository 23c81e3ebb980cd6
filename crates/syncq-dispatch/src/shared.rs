//! State shared between queue handles and the worker

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use syncq_telemetry::MetricsRegistry;

use crate::state::QueueState;

/// Current instant on the tokio clock (pausable in tests)
pub(crate) fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

pub(crate) struct Shared {
    state: Mutex<QueueState>,
    draining: AtomicBool,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Shared {
    pub(crate) fn new(metrics: Option<Arc<MetricsRegistry>>) -> Self {
        Self {
            state: Mutex::new(QueueState::new()),
            draining: AtomicBool::new(false),
            metrics,
        }
    }

    /// Locks the queue state
    ///
    /// No code path panics while holding the guard, so a poisoned lock
    /// still holds consistent maps and is recovered.
    pub(crate) fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    pub(crate) fn set_draining(&self, draining: bool) {
        self.draining.store(draining, Ordering::Release);
    }

    pub(crate) fn metrics(&self) -> Option<&MetricsRegistry> {
        self.metrics.as_deref()
    }

    /// Pushes pending/failed sizes into the gauges, if metrics are attached
    pub(crate) fn publish_sizes(&self, state: &QueueState) {
        if let Some(metrics) = self.metrics() {
            metrics.set_queue_sizes(state.pending_count(), state.failed_count());
        }
    }
}
