//! Convenience entry points for domain events
//!
//! Each method maps an event to the items it touches and the priority
//! those items deserve:
//!
//! | Event                  | Items                           | Priority  |
//! |------------------------|---------------------------------|-----------|
//! | workflow completed     | workflow result, parent entity  | Immediate |
//! | entity edited          | entity                          | Normal    |
//! | sub-resource changed   | sub-resource, parent entity     | High      |
//! | entity deleted         | deletion                        | High      |

use syncq_core::domain::{ItemId, Priority, SyncItem};

use crate::SyncQueue;

impl SyncQueue {
    /// A workflow finished; its result and the parent entity go out first
    pub fn workflow_completed(&self, workflow_id: ItemId, parent_id: ItemId) {
        self.enqueue_all(
            [
                SyncItem::WorkflowResult(workflow_id),
                SyncItem::Entity(parent_id),
            ],
            Priority::Immediate,
        );
    }

    pub fn entity_edited(&self, id: ItemId) {
        self.enqueue(SyncItem::Entity(id), Priority::Normal);
    }

    /// A sub-resource changed; the parent entity is re-pushed with it
    pub fn sub_resource_changed(&self, sub_id: ItemId, parent_id: ItemId) {
        self.enqueue_all(
            [SyncItem::SubResource(sub_id), SyncItem::Entity(parent_id)],
            Priority::High,
        );
    }

    pub fn entity_deleted(&self, id: ItemId) {
        self.enqueue(SyncItem::Deletion(id), Priority::High);
    }
}
