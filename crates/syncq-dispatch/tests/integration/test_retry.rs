//! Backoff, quarantine and flush convergence

use std::time::Duration;

use syncq_core::config::QueueConfig;
use syncq_core::domain::Priority;
use tokio::time::sleep;

use crate::common::{self, entity, id, ScriptedPush};

/// Asserts each gap lies in `[expected, expected + slack]`
fn assert_gaps(gaps: &[Duration], expected_secs: &[u64], slack: Duration) {
    assert_eq!(gaps.len(), expected_secs.len(), "gaps: {gaps:?}");
    for (gap, secs) in gaps.iter().zip(expected_secs) {
        let expected = Duration::from_secs(*secs);
        assert!(
            *gap >= expected && *gap <= expected + slack,
            "gap {gap:?} outside [{expected:?}, {:?}]",
            expected + slack
        );
    }
}

// ============================================================================
// Backoff
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_transient_failures_back_off_then_succeed() {
    let push = ScriptedPush::new();
    push.fail_times("memo", 3);
    let (queue, _worker) = common::spawn_queue(&push);

    queue.entity_edited(id("memo"));
    sleep(Duration::from_secs(30)).await;

    assert_gaps(&push.gaps_for("memo"), &[2, 4, 8], Duration::from_millis(10));

    let stats = queue.stats();
    assert_eq!(stats.total_retries, 3);
    assert_eq!(stats.total_succeeded, 1);
    assert_eq!(stats.total_failed, 0);
    assert_eq!(stats.pending_count, 0);
    assert_eq!(stats.waiting_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_item_waits_with_error_recorded() {
    let push = ScriptedPush::new();
    push.fail_always("memo");
    let (queue, _worker) = common::spawn_queue(&push);

    queue.entity_edited(id("memo"));
    sleep(Duration::from_millis(100)).await;

    let entry = queue.pending_entry(&id("memo")).unwrap();
    assert_eq!(entry.retry_count, 1);
    assert_eq!(entry.last_error.as_deref(), Some("remote rejected memo"));
    assert!(entry.next_retry_at.is_some());

    let stats = queue.stats();
    assert_eq!(stats.pending_count, 1);
    assert_eq!(stats.waiting_count, 1);
    assert!(queue.state_report().contains("next_retry_in="));
}

#[tokio::test(start_paused = true)]
async fn test_backoff_is_capped() {
    let push = ScriptedPush::new();
    push.fail_always("memo");
    let config = QueueConfig {
        max_retries: 6,
        max_backoff_secs: 4,
        ..QueueConfig::default()
    };
    let (queue, _worker) = common::spawn_queue_with(&push, config);

    queue.entity_edited(id("memo"));
    queue.flush().await.unwrap();

    assert_gaps(
        &push.gaps_for("memo"),
        &[2, 4, 4, 4, 4],
        Duration::from_millis(10),
    );
    assert!(queue.is_failed(&id("memo")));
}

#[tokio::test(start_paused = true)]
async fn test_failure_does_not_block_other_items() {
    let push = ScriptedPush::new();
    push.fail_always("broken");
    let (queue, _worker) = common::spawn_queue(&push);

    queue.enqueue(entity("broken"), Priority::High);
    queue.enqueue(entity("fine"), Priority::Normal);
    sleep(Duration::from_millis(100)).await;

    assert_eq!(push.order(), vec!["broken", "fine"]);
    assert!(!queue.is_pending(&id("fine")));
    assert!(queue.is_pending(&id("broken")));
}

// ============================================================================
// Quarantine
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_quarantine_after_max_retries() {
    let push = ScriptedPush::new();
    push.fail_always("memo");
    let (queue, _worker) = common::spawn_queue(&push);

    queue.entity_edited(id("memo"));
    sleep(Duration::from_secs(60)).await;

    assert_eq!(push.attempts_for("memo").len(), 5);
    assert_gaps(
        &push.gaps_for("memo"),
        &[2, 4, 8, 16],
        Duration::from_millis(10),
    );

    let stats = queue.stats();
    assert_eq!(stats.total_retries, 4);
    assert_eq!(stats.total_failed, 1);
    assert_eq!(stats.pending_count, 0);
    assert_eq!(stats.failed_count, 1);

    let failed = queue.list_failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, id("memo"));
    assert_eq!(failed[0].retry_count, 5);
    assert_eq!(failed[0].priority, Priority::Normal);
    assert_eq!(failed[0].last_error, "remote rejected memo");
}

#[tokio::test(start_paused = true)]
async fn test_quarantined_item_is_not_retried() {
    let push = ScriptedPush::new();
    push.fail_always("memo");
    let (queue, _worker) = common::spawn_queue_with(&push, common::quick_quarantine(1));

    queue.entity_edited(id("memo"));
    sleep(Duration::from_secs(120)).await;

    assert_eq!(push.attempts_for("memo").len(), 1);
    assert!(queue.is_failed(&id("memo")));
    assert!(!queue.is_pending(&id("memo")));
}

// ============================================================================
// Flush
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_flush_converges_through_backoff() {
    let push = ScriptedPush::new();
    push.fail_times("a", 2);
    push.fail_times("b", 1);
    let (queue, _worker) = common::spawn_queue(&push);

    queue.entity_edited(id("a"));
    queue.entity_edited(id("b"));
    queue.entity_edited(id("c"));
    queue.flush().await.unwrap();

    let stats = queue.stats();
    assert_eq!(stats.pending_count, 0);
    assert_eq!(stats.total_succeeded, 3);
    assert_eq!(stats.total_retries, 3);
    assert_eq!(stats.total_failed, 0);
    assert!(stats.is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_flush_leaves_quarantined_items() {
    let push = ScriptedPush::new();
    push.fail_always("bad");
    let (queue, _worker) = common::spawn_queue_with(&push, common::quick_quarantine(2));

    queue.entity_edited(id("bad"));
    queue.entity_edited(id("good"));
    queue.flush().await.unwrap();

    let stats = queue.stats();
    assert_eq!(stats.pending_count, 0);
    assert_eq!(stats.failed_count, 1);
    assert_eq!(stats.total_succeeded, 1);
    assert!(queue.is_failed(&id("bad")));
}

#[tokio::test(start_paused = true)]
async fn test_flush_on_empty_queue_returns() {
    let push = ScriptedPush::new();
    let (queue, _worker) = common::spawn_queue(&push);

    queue.flush().await.unwrap();
    assert!(push.attempts().is_empty());
}
