//! Simulated workload against an unreliable in-process remote
//!
//! [`FlakyPush`] fails a seeded, reproducible share of attempts. The
//! workload cycles through the four domain events so every priority tier
//! and item kind shows up in a run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use syncq_core::config::QueueConfig;
use syncq_core::domain::{ItemId, SyncItem};
use syncq_core::ports::IRemotePush;
use syncq_dispatch::SyncQueue;
use syncq_telemetry::MetricsRegistry;
use tokio::task::JoinHandle;
use tracing::{debug, info};

// ============================================================================
// FlakyPush
// ============================================================================

struct Dice {
    rng: StdRng,
    failure_rate: f64,
}

/// Remote that rejects a seeded fraction of pushes
pub struct FlakyPush {
    dice: Mutex<Dice>,
    attempts: AtomicU64,
}

impl FlakyPush {
    pub fn new(seed: u64, failure_rate: f64) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&failure_rate),
            "failure rate must be between 0.0 and 1.0, got {failure_rate}"
        );
        Ok(Self {
            dice: Mutex::new(Dice {
                rng: StdRng::seed_from_u64(seed),
                failure_rate,
            }),
            attempts: AtomicU64::new(0),
        })
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Makes every later push succeed
    pub fn heal(&self) {
        if let Ok(mut dice) = self.dice.lock() {
            dice.failure_rate = 0.0;
        }
    }

    fn roll_failure(&self) -> bool {
        match self.dice.lock() {
            Ok(mut dice) => {
                let rate = dice.failure_rate;
                dice.rng.gen_bool(rate)
            }
            Err(_) => false,
        }
    }
}

#[async_trait]
impl IRemotePush for FlakyPush {
    async fn push(&self, item: &SyncItem) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if self.roll_failure() {
            anyhow::bail!("simulated remote failure for {item}");
        }
        debug!(item = %item, "Simulated push accepted");
        Ok(())
    }
}

// ============================================================================
// Workload
// ============================================================================

/// A local change that feeds the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Edited(ItemId),
    WorkflowCompleted { workflow: ItemId, parent: ItemId },
    SubResourceChanged { sub: ItemId, parent: ItemId },
    Deleted(ItemId),
}

fn item_id(prefix: &str, n: usize) -> Result<ItemId> {
    ItemId::new(format!("{prefix}-{n}")).context("Failed to build simulated item id")
}

/// Builds `count` events cycling through every event type
///
/// Workflow and sub-resource events point at entities edited earlier, so
/// some enqueues hit ids that are still pending.
pub fn workload(count: usize) -> Result<Vec<Event>> {
    (0..count)
        .map(|i| {
            let event = match i % 4 {
                0 => Event::Edited(item_id("memo", i)?),
                1 => Event::WorkflowCompleted {
                    workflow: item_id("wf", i)?,
                    parent: item_id("memo", i - 1)?,
                },
                2 => Event::SubResourceChanged {
                    sub: item_id("att", i)?,
                    parent: item_id("memo", i - 2)?,
                },
                _ => Event::Deleted(item_id("old", i)?),
            };
            Ok(event)
        })
        .collect()
}

fn apply(queue: &SyncQueue, event: Event) {
    match event {
        Event::Edited(id) => queue.entity_edited(id),
        Event::WorkflowCompleted { workflow, parent } => queue.workflow_completed(workflow, parent),
        Event::SubResourceChanged { sub, parent } => queue.sub_resource_changed(sub, parent),
        Event::Deleted(id) => queue.entity_deleted(id),
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// A running queue wired to a [`FlakyPush`]
pub struct Simulation {
    queue: SyncQueue,
    push: Arc<FlakyPush>,
    worker: JoinHandle<()>,
}

impl Simulation {
    pub fn start(
        config: QueueConfig,
        seed: u64,
        failure_rate: f64,
        metrics: Option<Arc<MetricsRegistry>>,
    ) -> Result<Self> {
        let push = Arc::new(FlakyPush::new(seed, failure_rate)?);
        let remote: Arc<dyn IRemotePush> = push.clone();

        let mut builder = SyncQueue::builder(remote).config(config);
        if let Some(metrics) = metrics {
            builder = builder.metrics(metrics);
        }
        let (queue, worker) = builder.spawn()?;

        info!(seed, failure_rate, "Simulation started");
        Ok(Self {
            queue,
            push,
            worker,
        })
    }

    pub fn queue(&self) -> &SyncQueue {
        &self.queue
    }

    pub fn push(&self) -> &FlakyPush {
        &self.push
    }

    /// Enqueues `count` generated events
    pub fn feed(&self, count: usize) -> Result<()> {
        for event in workload(count)? {
            apply(&self.queue, event);
        }
        Ok(())
    }

    /// Waits until nothing is pending
    pub async fn settle(&self) -> Result<()> {
        self.queue.flush().await?;
        Ok(())
    }

    /// Stops the worker and waits for it to exit
    pub async fn shutdown(self) -> Result<()> {
        let Self { queue, worker, .. } = self;
        drop(queue);
        worker.await.context("Dispatch worker panicked")?;
        Ok(())
    }
}
