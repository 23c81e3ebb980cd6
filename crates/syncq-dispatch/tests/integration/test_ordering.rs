//! Dispatch ordering, deduplication and batching

use std::time::Duration;

use syncq_core::domain::{ItemKind, Priority, SyncItem};
use syncq_dispatch::EnqueueOutcome;
use tokio::time::{sleep, Instant};

use crate::common::{self, entity, id, ScriptedPush};

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_drain_follows_priority_order() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);

    queue.enqueue(entity("bg"), Priority::Background);
    queue.enqueue(entity("normal"), Priority::Normal);
    queue.enqueue(entity("high"), Priority::High);
    queue.enqueue(entity("now"), Priority::Immediate);
    queue.flush().await.unwrap();

    assert_eq!(push.order(), vec!["now", "high", "normal", "bg"]);
    assert_eq!(queue.stats().total_succeeded, 4);
}

#[tokio::test(start_paused = true)]
async fn test_same_priority_is_fifo() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);

    for name in ["c", "a", "d", "b"] {
        queue.enqueue(entity(name), Priority::Normal);
    }
    queue.flush().await.unwrap();

    assert_eq!(push.order(), vec!["c", "a", "d", "b"]);
}

#[tokio::test(start_paused = true)]
async fn test_mixed_kinds_share_the_same_ordering() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);

    queue.entity_deleted(id("gone"));
    queue.entity_edited(id("memo"));
    queue.workflow_completed(id("wf"), id("parent"));
    queue.flush().await.unwrap();

    let attempts = push.attempts();
    let kinds: Vec<ItemKind> = attempts.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ItemKind::WorkflowResult,
            ItemKind::Entity,
            ItemKind::Deletion,
            ItemKind::Entity,
        ]
    );
    assert_eq!(push.order(), vec!["wf", "parent", "gone", "memo"]);
}

// ============================================================================
// Deduplication
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_duplicate_enqueues_push_once() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);

    assert_eq!(
        queue.enqueue(entity("a"), Priority::Normal),
        EnqueueOutcome::Created
    );
    assert_eq!(
        queue.enqueue(entity("a"), Priority::Normal),
        EnqueueOutcome::AlreadyPending
    );
    queue.entity_edited(id("a"));
    assert_eq!(queue.stats().pending_count, 1);

    queue.flush().await.unwrap();
    assert_eq!(push.order(), vec!["a"]);
    assert_eq!(queue.stats().total_enqueued, 1);
}

#[tokio::test(start_paused = true)]
async fn test_pending_priority_is_not_escalated() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);

    queue.enqueue(entity("a"), Priority::Background);
    queue.enqueue(entity("a"), Priority::Immediate);
    queue.enqueue(entity("b"), Priority::Normal);

    assert_eq!(
        queue.pending_entry(&id("a")).unwrap().priority,
        Priority::Background
    );
    queue.flush().await.unwrap();
    assert_eq!(push.order(), vec!["b", "a"]);
}

#[tokio::test(start_paused = true)]
async fn test_dedup_is_by_id_across_kinds() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);

    queue.entity_edited(id("memo"));
    let outcome = queue.enqueue(SyncItem::Deletion(id("memo")), Priority::High);
    assert_eq!(outcome, EnqueueOutcome::AlreadyPending);

    queue.flush().await.unwrap();
    let attempts = push.attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].kind, ItemKind::Entity);
}

#[tokio::test(start_paused = true)]
async fn test_enqueue_after_success_creates_new_entry() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);

    queue.entity_edited(id("a"));
    queue.flush().await.unwrap();
    queue.entity_edited(id("a"));
    queue.flush().await.unwrap();

    assert_eq!(push.order(), vec!["a", "a"]);
    assert_eq!(queue.stats().total_enqueued, 2);
}

// ============================================================================
// Batching
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_immediate_skips_batch_delay() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);
    let start = Instant::now();

    queue.enqueue(entity("a"), Priority::Immediate);
    sleep(Duration::from_millis(20)).await;

    let attempts = push.attempts_for("a");
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0] - start < Duration::from_millis(5));
}

#[tokio::test(start_paused = true)]
async fn test_normal_waits_for_batch_delay() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);
    let start = Instant::now();

    queue.enqueue(entity("a"), Priority::Normal);
    sleep(Duration::from_millis(20)).await;
    assert!(push.attempts().is_empty());

    sleep(Duration::from_millis(100)).await;
    let attempts = push.attempts_for("a");
    assert_eq!(attempts.len(), 1);
    let waited = attempts[0] - start;
    assert!(waited >= Duration::from_millis(50), "waited {waited:?}");
    assert!(waited < Duration::from_millis(60), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn test_burst_is_coalesced_into_one_pass() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);

    queue.entity_edited(id("a"));
    sleep(Duration::from_millis(20)).await;
    queue.entity_edited(id("b"));
    sleep(Duration::from_millis(20)).await;
    queue.entity_edited(id("c"));
    sleep(Duration::from_millis(200)).await;

    let attempts = push.attempts();
    assert_eq!(attempts.len(), 3);
    // The first trigger's deadline is kept, so all three land together.
    assert!(attempts.iter().all(|a| a.at == attempts[0].at));
}

#[tokio::test(start_paused = true)]
async fn test_immediate_pulls_pending_batch_forward() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);
    let start = Instant::now();

    queue.entity_edited(id("slow"));
    sleep(Duration::from_millis(10)).await;
    queue.enqueue(entity("fast"), Priority::Immediate);
    sleep(Duration::from_millis(5)).await;

    assert_eq!(push.order(), vec!["fast", "slow"]);
    let attempts = push.attempts();
    assert!(attempts[1].at - start < Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_immediate_keeps_batch_delay() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);
    let start = Instant::now();

    queue.enqueue(entity("a"), Priority::Normal);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(
        queue.enqueue(entity("a"), Priority::Immediate),
        EnqueueOutcome::AlreadyPending
    );
    sleep(Duration::from_millis(10)).await;
    assert!(push.attempts().is_empty());

    sleep(Duration::from_millis(100)).await;
    let attempts = push.attempts_for("a");
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0] - start >= Duration::from_millis(50));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_enqueue_during_drain_waits_for_next_pass() {
    let push = ScriptedPush::new();
    push.set_latency(Duration::from_millis(500));
    let (queue, _worker) = common::spawn_queue(&push);

    queue.enqueue(entity("a"), Priority::Normal);
    queue.enqueue(entity("b"), Priority::Background);
    sleep(Duration::from_millis(100)).await;
    assert!(queue.stats().is_draining);
    assert_eq!(push.order(), vec!["a"]);

    // Immediate work arriving mid-pass does not cut in line.
    queue.enqueue(entity("c"), Priority::Immediate);
    queue.flush().await.unwrap();

    assert_eq!(push.order(), vec!["a", "b", "c"]);
    let b = push.attempts_for("b")[0];
    let c = push.attempts_for("c")[0];
    assert!(c - b >= Duration::from_millis(500));

    let stats = queue.stats();
    assert_eq!(stats.pending_count, 0);
    assert_eq!(stats.total_succeeded, 3);
}
