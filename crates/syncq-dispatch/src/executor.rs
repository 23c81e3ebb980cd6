//! Drain executor
//!
//! One drain pass takes every ready pending item, sorts it by
//! `(priority, enqueued_at, sequence)` and pushes the items one at a time.
//! The state lock is taken only to snapshot the batch and to apply each
//! outcome; it is never held while the remote push runs.
//!
//! A failing push never stops the pass. Its error text is recorded on the
//! entry and the retry policy decides between a backoff and quarantine.

use std::sync::Arc;

use chrono::Utc;
use syncq_core::ports::IRemotePush;
use syncq_telemetry::PushOutcome;
use tracing::{debug, info, warn};

use crate::retry::RetryPolicy;
use crate::shared::{now, Shared};
use crate::state::AttemptOutcome;

/// Summary of a single drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DrainReport {
    /// Items attempted during the pass
    pub attempted: usize,
    pub succeeded: usize,
    /// Failed attempts that will be retried
    pub retried: usize,
    pub quarantined: usize,
}

pub(crate) struct Executor {
    shared: Arc<Shared>,
    push: Arc<dyn IRemotePush>,
    policy: RetryPolicy,
}

impl Executor {
    pub(crate) fn new(shared: Arc<Shared>, push: Arc<dyn IRemotePush>, policy: RetryPolicy) -> Self {
        Self {
            shared,
            push,
            policy,
        }
    }

    /// Runs one ordered pass over the items that are ready now
    pub(crate) async fn drain_pass(&self) -> DrainReport {
        let batch = self.shared.state().ready_batch(now());
        let mut report = DrainReport::default();
        if batch.is_empty() {
            return report;
        }

        self.shared.set_draining(true);
        debug!(count = batch.len(), "Starting drain pass");

        for item in batch {
            let started = tokio::time::Instant::now();
            let result = self.push.push(&item).await;
            let elapsed = started.elapsed();
            report.attempted += 1;

            let error = result.err().map(|err| format!("{err:#}"));
            let outcome = {
                let mut state = self.shared.state();
                let outcome = match &error {
                    None => state.record_success(item.id(), elapsed),
                    Some(message) => state.record_failure(
                        item.id(),
                        message.clone(),
                        elapsed,
                        now(),
                        Utc::now(),
                        &self.policy,
                    ),
                };
                self.shared.publish_sizes(&state);
                outcome
            };

            let label = match outcome {
                AttemptOutcome::Succeeded => {
                    report.succeeded += 1;
                    debug!(
                        id = %item.id(),
                        kind = %item.kind(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Item pushed"
                    );
                    Some(PushOutcome::Success)
                }
                AttemptOutcome::Retrying { retry_count, delay } => {
                    report.retried += 1;
                    info!(
                        id = %item.id(),
                        kind = %item.kind(),
                        retry_count,
                        delay_secs = delay.as_secs(),
                        error = error.as_deref().unwrap_or_default(),
                        "Push failed, retry scheduled"
                    );
                    Some(PushOutcome::Retry)
                }
                AttemptOutcome::Quarantined { retry_count } => {
                    report.quarantined += 1;
                    warn!(
                        id = %item.id(),
                        kind = %item.kind(),
                        retry_count,
                        error = error.as_deref().unwrap_or_default(),
                        "Push failed permanently, item quarantined"
                    );
                    Some(PushOutcome::Quarantined)
                }
                AttemptOutcome::Missing => {
                    debug!(id = %item.id(), "Entry vanished during push, outcome dropped");
                    None
                }
            };

            if let (Some(label), Some(metrics)) = (label, self.shared.metrics()) {
                metrics.record_push(item.kind(), label, elapsed.as_secs_f64());
            }
        }

        self.shared.set_draining(false);
        debug!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            retried = report.retried,
            quarantined = report.quarantined,
            "Drain pass finished"
        );
        report
    }
}
