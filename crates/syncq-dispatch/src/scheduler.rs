//! Dispatch scheduler - decides when drain passes run
//!
//! The [`DispatchWorker`] is the single task that owns draining. Queue
//! handles post [`Command`]s to it over an unbounded channel and return
//! immediately; the worker turns them into drain passes.
//!
//! ## Flow
//!
//! ```text
//! SyncQueue::enqueue ──→ mpsc (Trigger) ──→ DispatchWorker ──→ debounce ──→ drain pass
//!                                               │                              │
//!                                           recheck timer ◄── items waiting ───┘
//! ```
//!
//! Only one pass runs at a time because passes execute inside the worker's
//! own loop. Triggers that arrive during a pass are read after it finishes
//! and schedule the next one.

use std::sync::Arc;
use std::time::Duration;

use syncq_core::config::QueueConfig;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::executor::Executor;
use crate::shared::{now, Shared};
use crate::timer::DelayedTrigger;

/// Messages from queue handles to the worker
#[derive(Debug)]
pub(crate) enum Command {
    /// New work was enqueued; `urgent` skips the batching delay
    Trigger { urgent: bool },
    /// Drain until nothing is pending, then reply
    Flush(oneshot::Sender<()>),
}

/// Background task that schedules and runs drain passes
///
/// Created by [`SyncQueueBuilder::build`](crate::SyncQueueBuilder::build);
/// the caller spawns [`run`](Self::run).
pub struct DispatchWorker {
    rx: mpsc::UnboundedReceiver<Command>,
    executor: Executor,
    shared: Arc<Shared>,
    batch_delay: Duration,
    recheck_interval: Duration,
    debounce: DelayedTrigger,
    recheck: DelayedTrigger,
    shutdown: CancellationToken,
}

impl DispatchWorker {
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<Command>,
        executor: Executor,
        shared: Arc<Shared>,
        config: &QueueConfig,
        shutdown: CancellationToken,
    ) -> Self {
        info!(
            batch_delay_ms = config.batch_delay_ms,
            recheck_ms = config.recheck_interval_ms,
            max_retries = config.max_retries,
            "Creating dispatch worker"
        );

        Self {
            rx,
            executor,
            shared,
            batch_delay: config.batch_delay(),
            recheck_interval: config.recheck_interval(),
            debounce: DelayedTrigger::new("debounce"),
            recheck: DelayedTrigger::new("recheck"),
            shutdown,
        }
    }

    /// Main event loop
    ///
    /// Runs until every queue handle is dropped or the shutdown token is
    /// cancelled. Pending items are not persisted; they are reported and
    /// dropped.
    pub async fn run(mut self) {
        info!("Dispatch worker starting");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, dispatch worker stopping");
                    break;
                }

                command = self.rx.recv() => {
                    match command {
                        Some(Command::Trigger { urgent }) => self.schedule_drain(urgent),
                        Some(Command::Flush(reply)) => {
                            self.flush().await;
                            let _ = reply.send(());
                        }
                        None => {
                            info!("All queue handles dropped, dispatch worker stopping");
                            break;
                        }
                    }
                }

                _ = self.debounce.fired() => self.run_pass().await,

                _ = self.recheck.fired() => {
                    debug!("Backoff recheck fired");
                    self.run_pass().await;
                }
            }
        }

        let pending = self.shared.state().pending_count();
        if pending > 0 {
            info!(pending, "Dispatch worker stopped with items still pending");
        } else {
            info!("Dispatch worker stopped");
        }
    }

    /// Arms the debounce timer for the next pass
    ///
    /// Urgent work fires at once; everything else waits for the batching
    /// delay so bursts of edits land in one pass. An armed earlier deadline
    /// is never postponed.
    fn schedule_drain(&mut self, urgent: bool) {
        let delay = if urgent {
            Duration::ZERO
        } else {
            self.batch_delay
        };
        debug!(
            urgent,
            delay_ms = delay.as_millis() as u64,
            timer = self.debounce.name(),
            "Drain scheduled"
        );
        self.debounce.arm_no_later(delay);
    }

    async fn run_pass(&mut self) {
        self.executor.drain_pass().await;
        self.rearm_recheck();
    }

    /// Keeps exactly one recheck alive while items wait out a backoff
    fn rearm_recheck(&mut self) {
        let waiting = self.shared.state().waiting_count(now());
        if waiting > 0 {
            debug!(
                waiting,
                interval_ms = self.recheck_interval.as_millis() as u64,
                timer = self.recheck.name(),
                "Re-arming backoff recheck"
            );
            self.recheck.arm(self.recheck_interval);
        } else {
            self.recheck.cancel();
        }
    }

    /// Drains until the pending set is empty
    ///
    /// When nothing is ready the worker sleeps until the earliest backoff
    /// expires. Quarantined items are left alone.
    async fn flush(&mut self) {
        info!("Flushing dispatch queue");
        self.debounce.cancel();

        let mut attempted = 0;
        loop {
            attempted += self.executor.drain_pass().await.attempted;

            let (pending, next_retry_at) = {
                let state = self.shared.state();
                (state.pending_count(), state.earliest_retry_at(now()))
            };
            if pending == 0 {
                break;
            }
            if let Some(at) = next_retry_at {
                debug!(pending, "Flush waiting for backoff to expire");
                tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await;
            }
        }

        self.rearm_recheck();
        info!(attempted, "Flush complete");
    }
}
