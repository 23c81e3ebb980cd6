//! Domain entities
//!
//! This module contains the core domain types for syncq:
//! - Sync items (what changed) and their identifiers
//! - Priority tiers governing processing order
//! - Pending and quarantined queue entries
//! - Domain-specific error types

pub mod entry;
pub mod errors;
pub mod sync_item;

// Re-export commonly used types
pub use entry::{FailedEntry, PendingEntry};
pub use errors::DomainError;
pub use sync_item::{ItemId, ItemKind, Priority, SyncItem};
