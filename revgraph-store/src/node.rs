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

//! Version graph nodes
//!
//! Nodes live in an arena keyed by version id; parent and child links are
//! stored as version ids, never as owning references.

use revgraph_core::SealedRevision;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Maximum inline children before the list spills to the heap.
/// Typical revisions have one or two children; eight covers deep fan-out.
const MAX_INLINE_CHILDREN: usize = 8;

/// Child list type: inline storage for the common case.
pub(crate) type ChildList = SmallVec<[Uuid; MAX_INLINE_CHILDREN]>;

/// One revision in a container's version graph.
///
/// `version`, `previous` and `merges` restate the header's declarations so
/// linking never re-reads the message. `parent` is the computed link: it
/// is written exactly once, under the container's write lock, when the
/// declared parent is present in the graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    msg: SealedRevision,
    version: Uuid,
    previous: Option<Uuid>,
    merges: BTreeSet<Uuid>,
    parent: Option<Uuid>,
    children: ChildList,
}

impl GraphNode {
    /// Wrap a sealed message into an unlinked node.
    pub(crate) fn new(msg: SealedRevision) -> Self {
        let header = msg.header();
        let version = header.version;
        let previous = header.previous;
        let merges = header.merges.clone();
        Self {
            msg,
            version,
            previous,
            merges,
            parent: None,
            children: ChildList::new(),
        }
    }

    /// The sealed message this node carries.
    pub fn msg(&self) -> &SealedRevision {
        &self.msg
    }

    /// Version id of this revision.
    pub fn version(&self) -> Uuid {
        self.version
    }

    /// Declared parent version, if any.
    pub fn previous(&self) -> Option<Uuid> {
        self.previous
    }

    /// Declared merge parents.
    pub fn merges(&self) -> &BTreeSet<Uuid> {
        &self.merges
    }

    /// Computed parent link; `None` until the declared parent is present.
    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    /// Children that declared this node as their parent, in arrival order.
    pub fn children(&self) -> &[Uuid] {
        &self.children
    }

    /// Record the computed parent link. Write-once.
    pub(crate) fn set_parent(&mut self, parent: Uuid) {
        debug_assert!(self.parent.is_none(), "parent link written twice");
        self.parent = Some(parent);
    }

    /// Append a child link; duplicate declarations are ignored.
    pub(crate) fn attach_child(&mut self, child: Uuid) {
        if self.children.contains(&child) {
            return;
        }
        self.children.push(child);
    }
}
