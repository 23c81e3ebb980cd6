//! Remote push port (driven/secondary port)
//!
//! This module defines the operation that propagates a single local change
//! to the remote store. The dispatch queue calls it once per attempt and
//! does not know how the push is carried out.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific; the queue only records their display text.
//! - Uses `#[async_trait]` for async trait methods.
//! - Implementations must tolerate being called repeatedly for the same item
//!   (at-least-once delivery).

use std::future::Future;

use crate::domain::sync_item::SyncItem;

// ============================================================================
// IRemotePush trait
// ============================================================================

/// Port trait for pushing a changed item to the remote store
///
/// ## Implementation Notes
///
/// - Calls are sequential; an implementation never sees two concurrent
///   pushes from the same queue.
/// - Latency is expected to be sub-second. There is no timeout or
///   cancellation on the queue side.
/// - Every error is treated as retryable.
#[async_trait::async_trait]
pub trait IRemotePush: Send + Sync {
    /// Pushes the current state of `item` to the remote store
    async fn push(&self, item: &SyncItem) -> anyhow::Result<()>;
}

// ============================================================================
// FnPush adapter
// ============================================================================

/// Adapts an async closure into an [`IRemotePush`]
///
/// ```ignore
/// let push = FnPush::new(|item: SyncItem| async move {
///     store.export(item.id()).await
/// });
/// ```
pub struct FnPush<F> {
    f: F,
}

impl<F> FnPush<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait::async_trait]
impl<F, Fut> IRemotePush for FnPush<F>
where
    F: Fn(SyncItem) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn push(&self, item: &SyncItem) -> anyhow::Result<()> {
        (self.f)(item.clone()).await
    }
}
