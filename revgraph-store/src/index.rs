// Copyright 2025 Revgraph (https://github.com/revgraph)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Version index
//!
//! Arena of graph nodes keyed by version id. The index is the single
//! owner of every node; links between nodes are ids resolved through it.

use crate::node::GraphNode;
use std::collections::HashMap;
use uuid::Uuid;

/// Map from version id to the node carrying that revision.
#[derive(Debug, Default)]
pub struct VersionIndex {
    nodes: HashMap<Uuid, GraphNode>,
}

impl VersionIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of revisions indexed.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the index holds no revisions.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a revision is present.
    pub fn contains(&self, version: &Uuid) -> bool {
        self.nodes.contains_key(version)
    }

    /// Look up a node by version id.
    pub fn get(&self, version: &Uuid) -> Option<&GraphNode> {
        self.nodes.get(version)
    }

    /// Mutable lookup, for linking under the container's write lock.
    pub(crate) fn get_mut(&mut self, version: &Uuid) -> Option<&mut GraphNode> {
        self.nodes.get_mut(version)
    }

    /// Insert a node keyed by its own version id, unless that version is
    /// already present. Returns whether the node was inserted.
    pub(crate) fn insert_if_absent(&mut self, node: GraphNode) -> bool {
        use std::collections::hash_map::Entry;
        match self.nodes.entry(node.version()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(node);
                true
            }
        }
    }

    /// Iterate all nodes in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }
}
