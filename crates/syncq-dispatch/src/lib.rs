//! syncq Dispatch - Priority-aware retry dispatch queue
//!
//! Provides:
//! - Deduplicated pending set keyed by item id
//! - Priority-ordered drain passes with FIFO inside a tier
//! - Exponential backoff and quarantine after repeated failures
//! - Replay and clearing of quarantined items
//!
//! ## Modules
//!
//! - [`queue`] - Cloneable [`SyncQueue`] handle and its builder
//! - [`scheduler`] - [`DispatchWorker`] loop deciding when passes run
//! - [`retry`] - Backoff and quarantine policy
//! - [`triggers`] - Convenience entry points for common domain events

mod executor;
mod failed;
mod registry;
mod shared;
mod state;
mod stats;
mod timer;

pub mod queue;
pub mod retry;
pub mod scheduler;
pub mod triggers;

use thiserror::Error;

pub use failed::FailedItem;
pub use queue::{SyncQueue, SyncQueueBuilder};
pub use retry::{RetryDecision, RetryPolicy};
pub use scheduler::DispatchWorker;
pub use state::EnqueueOutcome;
pub use stats::QueueStats;

/// Errors returned by the queue control surface
#[derive(Debug, Error)]
pub enum QueueError {
    /// The dispatch worker has exited or was never spawned
    #[error("Dispatch worker is not running")]
    WorkerStopped,

    /// The queue configuration cannot be used
    #[error("Invalid queue configuration: {0}")]
    InvalidConfig(String),
}
