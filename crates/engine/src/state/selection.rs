use shared::ObjectId;

use crate::scene::NodeKey;

/// What is currently selected: a scene node plus the object it belongs to
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedNode {
    pub node: NodeKey,
    pub object_id: ObjectId,
}

/// Single-node selection plus hover target
#[derive(Default)]
pub struct SelectionState {
    selected: Option<SelectedNode>,
    /// Node under the pointer (highlight feedback only)
    hovered: Option<NodeKey>,
    /// Version counter for selection changes (consumers re-sync when it moves)
    version: u64,
}

impl SelectionState {
    pub fn primary(&self) -> Option<&SelectedNode> {
        self.selected.as_ref()
    }

    pub fn node(&self) -> Option<NodeKey> {
        self.selected.as_ref().map(|s| s.node)
    }

    pub fn is_selected(&self, node: NodeKey) -> bool {
        self.node() == Some(node)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Select a node (replaces the previous selection)
    pub fn select(&mut self, node: NodeKey, object_id: impl Into<ObjectId>) {
        let next = SelectedNode {
            node,
            object_id: object_id.into(),
        };
        if self.selected.as_ref() != Some(&next) {
            self.selected = Some(next);
            self.version += 1;
        }
    }

    /// Clear selection. Returns true if something was selected.
    pub fn clear(&mut self) -> bool {
        if self.selected.take().is_some() {
            self.version += 1;
            true
        } else {
            false
        }
    }

    pub fn hovered(&self) -> Option<NodeKey> {
        self.hovered
    }

    /// Set hover target. Returns true if it changed.
    pub fn set_hovered(&mut self, node: Option<NodeKey>) -> bool {
        if self.hovered == node {
            return false;
        }
        self.hovered = node;
        true
    }
}
