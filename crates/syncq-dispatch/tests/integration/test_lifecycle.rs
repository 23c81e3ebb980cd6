//! Worker lifecycle, observability and metrics wiring

use std::sync::Arc;

use syncq_core::config::QueueConfig;
use syncq_core::domain::Priority;
use syncq_core::ports::IRemotePush;
use syncq_dispatch::{EnqueueOutcome, QueueError, SyncQueue};
use syncq_telemetry::MetricsRegistry;
use tokio_util::sync::CancellationToken;

use crate::common::{self, entity, id, ScriptedPush};

#[tokio::test(start_paused = true)]
async fn test_worker_stops_when_handles_drop() {
    let push = ScriptedPush::new();
    let (queue, worker) = common::spawn_queue(&push);
    let clone = queue.clone();

    drop(queue);
    clone.entity_edited(id("a"));
    clone.flush().await.unwrap();
    drop(clone);

    worker.await.unwrap();
    assert_eq!(push.order(), vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_token_stops_worker() {
    let push = ScriptedPush::new();
    let token = CancellationToken::new();
    let remote: Arc<dyn IRemotePush> = push.clone();
    let (queue, worker) = SyncQueue::builder(remote)
        .shutdown_token(token.clone())
        .spawn()
        .unwrap();

    token.cancel();
    worker.await.unwrap();

    assert_eq!(
        queue.enqueue(entity("a"), Priority::Normal),
        EnqueueOutcome::Created
    );
    assert!(matches!(queue.flush().await, Err(QueueError::WorkerStopped)));
    assert!(push.attempts().is_empty());
    assert_eq!(queue.stats().pending_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_stats_start_empty() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);

    let stats = queue.stats();
    assert!(stats.is_idle());
    assert_eq!(stats.total_enqueued, 0);
    assert!(stats.last_push_duration_ms.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_state_report_lists_failures() {
    let push = ScriptedPush::new();
    push.fail_always("a");
    let (queue, _worker) = common::spawn_queue_with(&push, common::quick_quarantine(1));

    queue.entity_edited(id("a"));
    queue.flush().await.unwrap();
    queue.log_state();

    let report = queue.state_report();
    assert!(report.starts_with("sync queue: pending=0 failed=1"));
    assert!(report.contains("entity:a retry_count=1"));
    assert!(report.contains("remote rejected a"));
    assert!(queue.stats().last_push_duration_ms.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_metrics_follow_queue_activity() {
    let push = ScriptedPush::new();
    push.fail_times("a", 1);
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let remote: Arc<dyn IRemotePush> = push.clone();
    let (queue, _worker) = SyncQueue::builder(remote)
        .config(QueueConfig::default())
        .metrics(Arc::clone(&metrics))
        .spawn()
        .unwrap();

    queue.entity_edited(id("a"));
    queue.entity_deleted(id("b"));
    queue.flush().await.unwrap();

    assert_eq!(
        metrics
            .items_enqueued_total
            .with_label_values(&["normal"])
            .get(),
        1
    );
    assert_eq!(
        metrics
            .push_attempts_total
            .with_label_values(&["entity", "retry"])
            .get(),
        1
    );
    assert_eq!(
        metrics
            .push_attempts_total
            .with_label_values(&["deletion", "success"])
            .get(),
        1
    );
    assert_eq!(metrics.pending_items.get(), 0);

    let text = metrics.encode().unwrap();
    assert!(text.contains("syncq_push_attempts_total"));
}
