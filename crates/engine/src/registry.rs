//! Object registry: stable object ids → live scene nodes.
//!
//! The registry never owns nodes. It only remembers which [`NodeKey`] an id
//! was last mounted at; callers must still check the key against the scene
//! graph, and treat a miss as "skip this update" rather than an error.

use std::collections::HashMap;

use shared::ObjectId;

use crate::scene::NodeKey;

#[derive(Default)]
pub struct ObjectRegistry {
    entries: HashMap<ObjectId, NodeKey>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `id` with `node`, replacing any previous association
    pub fn register(&mut self, id: impl Into<ObjectId>, node: NodeKey) {
        self.entries.insert(id.into(), node);
    }

    /// Remove the association for `id`. Returns the node it pointed at.
    pub fn unregister(&mut self, id: &str) -> Option<NodeKey> {
        self.entries.remove(id)
    }

    /// Mount/unmount callback form: `None` unregisters
    pub fn set(&mut self, id: impl Into<ObjectId>, node: Option<NodeKey>) {
        let id = id.into();
        match node {
            Some(node) => {
                self.entries.insert(id, node);
            }
            None => {
                self.entries.remove(&id);
            }
        }
    }

    pub fn resolve(&self, id: &str) -> Option<NodeKey> {
        self.entries.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, NodeKey)> {
        self.entries.iter().map(|(id, k)| (id, *k))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
