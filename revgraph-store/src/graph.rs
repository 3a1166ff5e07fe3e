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

//! Per-object version graph container
//!
//! A [`VersionGraph`] ingests the arbitrary-order stream of revisions the
//! commit log delivers for one logical object, reconstructs the version
//! lineage, and tracks the frontier: the revisions no later revision has
//! claimed as a parent.
//!
//! ```text
//!        v0 ◄── v1 ◄── v2 ◄── v3a        frontier = {v3a, v3b}
//!                        ▲
//!                        └──── v3b
//! ```
//!
//! All graph state sits behind one reader/writer lock. `add` takes the
//! writer side; every query takes the reader side and returns a snapshot,
//! so no lock is held while callers iterate. Merged views snapshot the
//! frontier, release the lock, then hand the snapshot to the merge driver.

use crate::index::VersionIndex;
use crate::merge::MergeDriver;
use crate::node::GraphNode;
use parking_lot::RwLock;
use revgraph_core::{
    short_version, Lineage, LogMeta, PartitionKey, RevisionHeader, RevisionMessage, SealedRevision,
};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

use crate::error::MergeResult;

/// One frontier revision paired with its linked ancestor, cloned out of
/// the graph under the read lock.
#[derive(Debug, Clone)]
pub(crate) struct FrontierEntry {
    pub version: Uuid,
    pub msg: SealedRevision,
    pub parent_version: Option<Uuid>,
    pub parent_msg: Option<SealedRevision>,
}

#[derive(Debug, Default)]
struct GraphState {
    index: VersionIndex,
    /// Insertion order of every revision, duplicates excluded.
    timeline: Vec<Uuid>,
    /// Frontier in insertion order of the surviving revisions.
    leaves: Vec<Uuid>,
    /// Declared-but-absent version -> versions that declared it.
    waiting: HashMap<Uuid, SmallVec<[Uuid; 2]>>,
}

impl GraphState {
    fn remove_leaf(&mut self, version: &Uuid) {
        self.leaves.retain(|leaf| leaf != version);
    }

    /// Link a new node into the graph. The caller has already rejected
    /// duplicate versions and frozen the meta.
    fn link(&mut self, mut node: GraphNode) {
        let version = node.version();

        // Attach under the declared parent when it is already present;
        // otherwise leave a claim so a late parent never joins the frontier.
        if let Some(prev) = node.previous() {
            if self.index.contains(&prev) {
                node.set_parent(prev);
                if let Some(parent) = self.index.get_mut(&prev) {
                    parent.attach_child(version);
                }
                self.remove_leaf(&prev);
            } else {
                self.waiting.entry(prev).or_default().push(version);
            }
        }

        // Merge parents lose frontier status the same way; absent ones may
        // still arrive later.
        for &merge in node.merges() {
            if self.index.contains(&merge) {
                self.remove_leaf(&merge);
            } else {
                self.waiting.entry(merge).or_default().push(version);
            }
        }

        // Revisions that declared this version before it arrived claim it
        // now: they gain their parent link, and they keep the new node off
        // the frontier.
        let waiters = self.waiting.remove(&version).unwrap_or_default();
        let is_leaf = waiters.is_empty();
        for waiter in waiters {
            if let Some(child) = self.index.get_mut(&waiter) {
                if child.previous() == Some(version) && child.parent().is_none() {
                    child.set_parent(version);
                    node.attach_child(waiter);
                }
            }
        }

        self.index.insert_if_absent(node);
        self.timeline.push(version);
        if is_leaf {
            self.leaves.push(version);
        }
    }
}

/// Concurrent version graph for one logical object on one partition.
pub struct VersionGraph<R: Lineage> {
    partition_key: PartitionKey,
    driver: Arc<MergeDriver<R>>,
    state: RwLock<GraphState>,
}

impl<R: Lineage> VersionGraph<R> {
    /// Create an empty container for the given partition.
    pub fn new(partition_key: PartitionKey, driver: Arc<MergeDriver<R>>) -> Self {
        Self {
            partition_key,
            driver,
            state: RwLock::new(GraphState::default()),
        }
    }

    /// Partition this object lives on.
    pub fn partition_key(&self) -> &PartitionKey {
        &self.partition_key
    }

    /// Ingest one revision. Idempotent on the version id: re-adding an
    /// already-present revision changes nothing. Freezes the meta once
    /// the revision is owned by the graph.
    pub fn add(&self, data: RevisionMessage, mut meta: LogMeta) -> &Self {
        let version = data.header.version;
        let mut state = self.state.write();
        if state.index.contains(&version) {
            return self;
        }
        meta.freeze();
        trace!(
            partition = %self.partition_key,
            version = %short_version(version),
            "revision linked"
        );
        state.link(GraphNode::new(SealedRevision::new(data, meta)));
        self
    }

    /// Last-inserted revision, or `None` on an empty graph.
    pub fn last(&self) -> Option<SealedRevision> {
        let state = self.state.read();
        let version = state.timeline.last()?;
        state.index.get(version).map(|node| node.msg().clone())
    }

    /// Header of the last-inserted revision.
    pub fn last_header(&self) -> Option<RevisionHeader> {
        self.last().map(|msg| msg.header().clone())
    }

    /// Log offset of the last-inserted revision.
    pub fn last_offset(&self) -> Option<i64> {
        self.last().map(|msg| msg.meta().offset())
    }

    /// Message of the last-inserted revision.
    pub fn last_data(&self) -> Option<RevisionMessage> {
        self.last().map(|msg| msg.data().clone())
    }

    /// Whether the last-inserted revision carries payload bytes.
    pub fn has_payload(&self) -> bool {
        self.last()
            .map(|msg| msg.data().has_payload())
            .unwrap_or(false)
    }

    /// Whether the object can no longer be written: write inheritance is
    /// off and no direct write grants remain.
    pub fn is_immutable(&self) -> bool {
        self.last_header()
            .map(|header| !header.inherit_write && header.allow_write.is_empty())
            .unwrap_or(false)
    }

    /// Payload type tag of the last revision, or `"[null]"` when empty.
    pub fn payload_kind(&self) -> String {
        self.last_header()
            .map(|header| header.payload_kind)
            .unwrap_or_else(|| "[null]".to_string())
    }

    /// Placement metadata of every revision, in insertion order.
    pub fn history(&self) -> Vec<LogMeta> {
        let state = self.state.read();
        state
            .timeline
            .iter()
            .filter_map(|version| state.index.get(version))
            .map(|node| node.msg().meta().clone())
            .collect()
    }

    /// Frontier versions, in insertion order of the surviving revisions.
    pub fn leaves(&self) -> Vec<Uuid> {
        self.state.read().leaves.clone()
    }

    /// Number of revisions ingested.
    pub fn timeline_len(&self) -> usize {
        self.state.read().timeline.len()
    }

    /// Whether the graph holds no revisions.
    pub fn is_empty(&self) -> bool {
        self.state.read().index.is_empty()
    }

    /// Whether a revision is present.
    pub fn contains(&self, version: &Uuid) -> bool {
        self.state.read().index.contains(version)
    }

    /// Computed parent link of a revision.
    pub fn parent_of(&self, version: &Uuid) -> Option<Uuid> {
        self.state.read().index.get(version)?.parent()
    }

    /// Children of a revision, in arrival order.
    pub fn children_of(&self, version: &Uuid) -> Vec<Uuid> {
        self.state
            .read()
            .index
            .get(version)
            .map(|node| node.children().to_vec())
            .unwrap_or_default()
    }

    /// Merged header across the current frontier.
    pub fn merged_header(&self) -> MergeResult<RevisionHeader> {
        let frontier = self.frontier();
        self.driver.merge_headers(frontier)
    }

    /// Merged typed record across the current frontier. A diverged
    /// frontier may emit a reconciling write-back through the log bridge.
    pub fn merged_data(&self) -> MergeResult<R> {
        let frontier = self.frontier();
        self.driver.merge_records(&self.partition_key, frontier)
    }

    /// Snapshot the frontier with linked ancestors. The read lock is
    /// released before the snapshot is handed to the merge driver.
    fn frontier(&self) -> Vec<FrontierEntry> {
        let state = self.state.read();
        state
            .leaves
            .iter()
            .filter_map(|version| state.index.get(version))
            .map(|node| {
                let parent = node.parent().and_then(|p| state.index.get(&p));
                FrontierEntry {
                    version: node.version(),
                    msg: node.msg().clone(),
                    parent_version: parent.map(|p| p.version()),
                    parent_msg: parent.map(|p| p.msg().clone()),
                }
            })
            .collect()
    }
}
