//! Sync queue handle
//!
//! [`SyncQueue`] is the cloneable front door of the dispatch queue. Every
//! method is synchronous and non-blocking except [`SyncQueue::flush`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   enqueue (lock, insert)   ┌───────────────┐
//! │  SyncQueue  │ ─────────────────────────► │  QueueState   │
//! │  (handles)  │                            │ (Mutex)       │
//! └─────────────┘                            └───────────────┘
//!       │  Command::Trigger / Flush                 ▲
//!       ▼                                           │ snapshot / outcomes
//! ┌─────────────────┐    push (no lock held)  ┌───────────┐
//! │ DispatchWorker  │ ──────────────────────► │ IRemotePush│
//! └─────────────────┘                         └───────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let (queue, worker) = SyncQueue::builder(push).config(config.queue).build()?;
//! tokio::spawn(worker.run());
//!
//! queue.entity_edited(memo_id);
//! queue.flush().await?;
//! ```

use std::sync::Arc;

use syncq_core::config::QueueConfig;
use syncq_core::domain::{ItemId, PendingEntry, Priority, SyncItem};
use syncq_core::ports::IRemotePush;
use syncq_telemetry::MetricsRegistry;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::executor::Executor;
use crate::failed::FailedItem;
use crate::retry::RetryPolicy;
use crate::scheduler::{Command, DispatchWorker};
use crate::shared::{now, Shared};
use crate::state::EnqueueOutcome;
use crate::stats::QueueStats;
use crate::QueueError;

// ============================================================================
// SyncQueueBuilder
// ============================================================================

/// Builder for a [`SyncQueue`] and its [`DispatchWorker`]
pub struct SyncQueueBuilder {
    push: Arc<dyn IRemotePush>,
    config: QueueConfig,
    metrics: Option<Arc<MetricsRegistry>>,
    shutdown: CancellationToken,
}

impl SyncQueueBuilder {
    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// Report queue activity into a Prometheus registry
    pub fn metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Stop the worker when `token` is cancelled
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Creates the handle and the worker; the caller spawns the worker
    ///
    /// # Errors
    /// Returns [`QueueError::InvalidConfig`] when [`QueueConfig::validate`]
    /// reports any error.
    pub fn build(self) -> Result<(SyncQueue, DispatchWorker), QueueError> {
        validate(&self.config)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::new(self.metrics));
        let executor = Executor::new(
            Arc::clone(&shared),
            self.push,
            RetryPolicy::from(&self.config),
        );
        let worker = DispatchWorker::new(
            rx,
            executor,
            Arc::clone(&shared),
            &self.config,
            self.shutdown,
        );

        Ok((SyncQueue { tx, shared }, worker))
    }

    /// Builds and spawns the worker on the current tokio runtime
    pub fn spawn(self) -> Result<(SyncQueue, JoinHandle<()>), QueueError> {
        let (queue, worker) = self.build()?;
        let handle = tokio::spawn(worker.run());
        Ok((queue, handle))
    }
}

fn validate(config: &QueueConfig) -> Result<(), QueueError> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    Err(QueueError::InvalidConfig(message))
}

// ============================================================================
// SyncQueue
// ============================================================================

/// Handle to the dispatch queue
///
/// Cheap to clone. The worker stops once every handle is dropped.
#[derive(Clone)]
pub struct SyncQueue {
    tx: mpsc::UnboundedSender<Command>,
    shared: Arc<Shared>,
}

impl SyncQueue {
    pub fn builder(push: Arc<dyn IRemotePush>) -> SyncQueueBuilder {
        SyncQueueBuilder {
            push,
            config: QueueConfig::default(),
            metrics: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Builds a queue with `config` and spawns its worker
    pub fn spawn(
        push: Arc<dyn IRemotePush>,
        config: QueueConfig,
    ) -> Result<(Self, JoinHandle<()>), QueueError> {
        Self::builder(push).config(config).spawn()
    }

    // ========================================================================
    // Enqueue
    // ========================================================================

    /// Queues `item` for pushing and returns immediately
    ///
    /// An id that is already pending is left untouched, including its
    /// priority. An id sitting in quarantine is revived with a clean retry
    /// state.
    pub fn enqueue(&self, item: SyncItem, priority: Priority) -> EnqueueOutcome {
        let outcome = self.insert(item, priority);
        self.trigger(priority == Priority::Immediate && outcome.is_new_entry());
        outcome
    }

    /// Queues several items at one priority with a single scheduler trigger
    ///
    /// Input order only matters as a FIFO hint within the priority tier.
    pub fn enqueue_all<I>(&self, items: I, priority: Priority) -> usize
    where
        I: IntoIterator<Item = SyncItem>,
    {
        let created = items
            .into_iter()
            .map(|item| self.insert(item, priority))
            .filter(|outcome| outcome.is_new_entry())
            .count();
        self.trigger(priority == Priority::Immediate && created > 0);
        created
    }

    fn insert(&self, item: SyncItem, priority: Priority) -> EnqueueOutcome {
        let id = item.id().clone();
        let kind = item.kind();

        let outcome = {
            let mut state = self.shared.state();
            let outcome = state.enqueue(item, priority, now());
            if outcome.is_new_entry() {
                if let Some(metrics) = self.shared.metrics() {
                    metrics.record_enqueued(priority);
                }
                self.shared.publish_sizes(&state);
            }
            outcome
        };

        match outcome {
            EnqueueOutcome::Created => {
                debug!(id = %id, kind = %kind, priority = %priority, "Item enqueued");
            }
            EnqueueOutcome::Revived => {
                info!(id = %id, kind = %kind, priority = %priority, "Quarantined item re-enqueued");
            }
            EnqueueOutcome::AlreadyPending => {
                debug!(id = %id, kind = %kind, priority = %priority, "Item already pending, ignoring");
            }
        }
        outcome
    }

    fn trigger(&self, urgent: bool) {
        if self.tx.send(Command::Trigger { urgent }).is_err() {
            warn!("Dispatch worker is not running, items stay pending");
        }
    }

    // ========================================================================
    // Control surface
    // ========================================================================

    /// Drains until nothing is pending
    ///
    /// Waits for an in-flight pass first. Quarantined items stay where they
    /// are, including those quarantined during the flush. Meant for shutdown
    /// and tests.
    ///
    /// # Errors
    /// Returns [`QueueError::WorkerStopped`] if the worker is not running.
    pub async fn flush(&self) -> Result<(), QueueError> {
        let (reply, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply))
            .map_err(|_| QueueError::WorkerStopped)?;
        done.await.map_err(|_| QueueError::WorkerStopped)
    }

    /// Moves every quarantined item back to pending with `retry_count = 0`
    pub fn replay_all(&self) -> usize {
        let replayed = {
            let mut state = self.shared.state();
            let replayed = state.replay_all(now());
            self.shared.publish_sizes(&state);
            replayed
        };
        info!(replayed, "Replaying quarantined items");
        if replayed > 0 {
            self.trigger(false);
        }
        replayed
    }

    /// Replays a single quarantined item; false if `id` is not quarantined
    pub fn replay(&self, id: &ItemId) -> bool {
        let replayed = {
            let mut state = self.shared.state();
            let replayed = state.replay(id, now());
            self.shared.publish_sizes(&state);
            replayed
        };
        if replayed {
            info!(id = %id, "Replaying quarantined item");
            self.trigger(false);
        }
        replayed
    }

    /// Permanently drops every quarantined item
    pub fn clear_all(&self) -> usize {
        let cleared = {
            let mut state = self.shared.state();
            let cleared = state.clear_failed();
            self.shared.publish_sizes(&state);
            cleared
        };
        info!(cleared, "Cleared quarantined items");
        cleared
    }

    /// Drops one quarantined item; false if `id` is not quarantined
    pub fn discard(&self, id: &ItemId) -> bool {
        let mut state = self.shared.state();
        let discarded = state.discard(id);
        self.shared.publish_sizes(&state);
        discarded
    }

    // ========================================================================
    // Observability
    // ========================================================================

    pub fn stats(&self) -> QueueStats {
        self.shared.state().stats(now(), self.shared.is_draining())
    }

    pub fn list_failed(&self) -> Vec<FailedItem> {
        self.shared.state().list_failed()
    }

    /// Copy of the pending entry for `id`, if any
    pub fn pending_entry(&self, id: &ItemId) -> Option<PendingEntry> {
        self.shared.state().pending_entry(id).cloned()
    }

    pub fn is_pending(&self, id: &ItemId) -> bool {
        self.shared.state().pending_entry(id).is_some()
    }

    pub fn is_failed(&self, id: &ItemId) -> bool {
        self.shared.state().is_failed(id)
    }

    /// Human-readable dump of counters, pending entries and failures
    pub fn state_report(&self) -> String {
        self.shared.state().report(now(), self.shared.is_draining())
    }

    /// Emits [`state_report`](Self::state_report) through `tracing`
    pub fn log_state(&self) {
        let report = self.state_report();
        for line in report.lines() {
            info!("{line}");
        }
    }
}
