//! SyncItem domain entity
//!
//! A [`SyncItem`] identifies *what* changed locally and needs to be
//! propagated to the remote store. It carries no payload: the remote push
//! operation looks the entity up by id and exports whatever is current.
//!
//! Items are keyed by [`ItemId`] alone. Two items of different kinds that
//! share an id are the same queue entry.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// ItemId
// ============================================================================

/// Opaque, comparable identity of a changed entity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Create a new ItemId
    ///
    /// # Errors
    /// Returns error if the ID is empty or only whitespace
    pub fn new(id: String) -> Result<Self, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::InvalidId(
                "Item ID cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for ItemId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

// ============================================================================
// Priority
// ============================================================================

/// Urgency tier of a queued item
///
/// Lower discriminant means more urgent; the derived `Ord` sorts
/// `Immediate` first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// User is waiting on the result (dispatched without batching delay)
    Immediate = 0,
    /// Visible soon, e.g. attachments of an entity being viewed
    High = 1,
    /// Ordinary edits
    #[default]
    Normal = 2,
    /// Bulk or maintenance work
    Background = 3,
}

impl Priority {
    /// Lowercase label used in logs, metrics and configuration
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Immediate => "immediate",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Background => "background",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(Priority::Immediate),
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "background" => Ok(Priority::Background),
            other => Err(DomainError::InvalidPriority(other.to_string())),
        }
    }
}

// ============================================================================
// ItemKind
// ============================================================================

/// Kind label of a [`SyncItem`], without its identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Entity,
    WorkflowResult,
    SubResource,
    Deletion,
}

impl ItemKind {
    /// Human-readable label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ItemKind::Entity => "entity",
            ItemKind::WorkflowResult => "workflow_result",
            ItemKind::SubResource => "sub_resource",
            ItemKind::Deletion => "deletion",
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entity" => Ok(ItemKind::Entity),
            "workflow_result" => Ok(ItemKind::WorkflowResult),
            "sub_resource" => Ok(ItemKind::SubResource),
            "deletion" => Ok(ItemKind::Deletion),
            other => Err(DomainError::InvalidKind(other.to_string())),
        }
    }
}

// ============================================================================
// SyncItem
// ============================================================================

/// A typed reference to a local change awaiting remote propagation
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SyncItem {
    /// A top-level entity was created or edited
    Entity(ItemId),
    /// A workflow run produced a result attached to an entity
    WorkflowResult(ItemId),
    /// A child resource of an entity changed
    SubResource(ItemId),
    /// An entity was deleted locally
    Deletion(ItemId),
}

impl SyncItem {
    /// Build an item of the given kind
    #[must_use]
    pub fn new(kind: ItemKind, id: ItemId) -> Self {
        match kind {
            ItemKind::Entity => SyncItem::Entity(id),
            ItemKind::WorkflowResult => SyncItem::WorkflowResult(id),
            ItemKind::SubResource => SyncItem::SubResource(id),
            ItemKind::Deletion => SyncItem::Deletion(id),
        }
    }

    /// Stable identity used for deduplication
    #[must_use]
    pub fn id(&self) -> &ItemId {
        match self {
            SyncItem::Entity(id)
            | SyncItem::WorkflowResult(id)
            | SyncItem::SubResource(id)
            | SyncItem::Deletion(id) => id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self {
            SyncItem::Entity(_) => ItemKind::Entity,
            SyncItem::WorkflowResult(_) => ItemKind::WorkflowResult,
            SyncItem::SubResource(_) => ItemKind::SubResource,
            SyncItem::Deletion(_) => ItemKind::Deletion,
        }
    }
}

impl Display for SyncItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}
