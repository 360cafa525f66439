//! Mutation observation facility.
//!
//! Observers subscribe once over a root node with a kind filter and drain
//! ordered batches of [`MutationRecord`]s. Records never cross a shadow
//! boundary: a mutation inside a shadow subtree is only visible to
//! observers rooted inside that scope, because scope membership is decided
//! by the parent chain and a shadow root has no parent.

use serde::{Deserialize, Serialize};

use crate::document::{Document, NodeId};

/// Handle for a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserverId(pub(crate) u64);

/// What happened at a record's target node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationKind {
    /// Children were inserted under or removed from the target.
    ChildList {
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// The target text node's content changed.
    CharacterData,
    /// An attribute-level write (includes class list and inline style).
    Attributes { name: String },
}

/// One delivered mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

/// Which mutation kinds an observer receives, and whether the whole
/// subtree under its root is watched or only the root itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationFilter {
    pub child_list: bool,
    pub character_data: bool,
    pub attributes: bool,
    pub subtree: bool,
}

impl MutationFilter {
    /// Child-list and character-data changes anywhere under the root.
    /// This is the filter a content-correction pass subscribes with.
    pub fn content() -> Self {
        Self {
            child_list: true,
            character_data: true,
            attributes: false,
            subtree: true,
        }
    }

    /// Everything, at any depth.
    pub fn all() -> Self {
        Self {
            child_list: true,
            character_data: true,
            attributes: true,
            subtree: true,
        }
    }

    pub(crate) fn accepts(&self, kind: &MutationKind) -> bool {
        match kind {
            MutationKind::ChildList { .. } => self.child_list,
            MutationKind::CharacterData => self.character_data,
            MutationKind::Attributes { .. } => self.attributes,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ObserverState {
    pub(crate) id: ObserverId,
    pub(crate) root: NodeId,
    pub(crate) filter: MutationFilter,
    pub(crate) queue: Vec<MutationRecord>,
}

impl Document {
    /// Register an observer over `root`. Records accumulate until drained
    /// with [`Document::take_records`].
    pub fn observe(&mut self, root: NodeId, filter: MutationFilter) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(ObserverState {
            id,
            root,
            filter,
            queue: Vec::new(),
        });
        id
    }

    /// Drain the pending records for an observer, in delivery order.
    /// Unknown (e.g. disconnected) observers yield an empty batch.
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .iter_mut()
            .find(|obs| obs.id == observer)
            .map(|obs| std::mem::take(&mut obs.queue))
            .unwrap_or_default()
    }

    /// Remove an observer. Returns whether it existed.
    pub fn disconnect(&mut self, observer: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|obs| obs.id != observer);
        self.observers.len() != before
    }
}
