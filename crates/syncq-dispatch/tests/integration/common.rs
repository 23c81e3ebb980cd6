//! Shared test helpers: a scripted remote and queue constructors

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use syncq_core::config::QueueConfig;
use syncq_core::domain::{ItemId, ItemKind, SyncItem};
use syncq_core::ports::IRemotePush;
use syncq_dispatch::SyncQueue;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One observed push attempt
#[derive(Debug, Clone)]
pub struct Attempt {
    pub id: String,
    pub kind: ItemKind,
    pub at: Instant,
}

/// Remote that records every attempt and fails on request
///
/// Failures are configured per id: a fixed number of failures before
/// succeeding, or failing forever.
#[derive(Default)]
pub struct ScriptedPush {
    attempts: Mutex<Vec<Attempt>>,
    failures: Mutex<HashMap<String, u32>>,
    latency: Mutex<Duration>,
}

impl ScriptedPush {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_times(&self, id: &str, times: u32) {
        self.failures.lock().unwrap().insert(id.to_string(), times);
    }

    pub fn fail_always(&self, id: &str) {
        self.fail_times(id, u32::MAX);
    }

    /// Every push takes `latency` before it resolves
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn heal(&self, id: &str) {
        self.failures.lock().unwrap().remove(id);
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }

    /// Ids in the order they were pushed
    pub fn order(&self) -> Vec<String> {
        self.attempts().into_iter().map(|a| a.id).collect()
    }

    pub fn attempts_for(&self, id: &str) -> Vec<Instant> {
        self.attempts()
            .into_iter()
            .filter(|a| a.id == id)
            .map(|a| a.at)
            .collect()
    }

    /// Gaps between consecutive attempts for `id`
    pub fn gaps_for(&self, id: &str) -> Vec<Duration> {
        self.attempts_for(id)
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }
}

#[async_trait]
impl IRemotePush for ScriptedPush {
    async fn push(&self, item: &SyncItem) -> anyhow::Result<()> {
        self.attempts.lock().unwrap().push(Attempt {
            id: item.id().to_string(),
            kind: item.kind(),
            at: Instant::now(),
        });

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut failures = self.failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(item.id().as_str()) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                anyhow::bail!("remote rejected {}", item.id());
            }
        }
        Ok(())
    }
}

pub fn id(s: &str) -> ItemId {
    ItemId::new(s.to_string()).unwrap()
}

pub fn entity(s: &str) -> SyncItem {
    SyncItem::Entity(id(s))
}

pub fn spawn_queue(push: &Arc<ScriptedPush>) -> (SyncQueue, JoinHandle<()>) {
    spawn_queue_with(push, QueueConfig::default())
}

pub fn spawn_queue_with(
    push: &Arc<ScriptedPush>,
    config: QueueConfig,
) -> (SyncQueue, JoinHandle<()>) {
    let push: Arc<dyn IRemotePush> = push.clone();
    SyncQueue::spawn(push, config).unwrap()
}

/// Config with a small retry budget so quarantine happens quickly
pub fn quick_quarantine(max_retries: u32) -> QueueConfig {
    QueueConfig {
        max_retries,
        ..QueueConfig::default()
    }
}
