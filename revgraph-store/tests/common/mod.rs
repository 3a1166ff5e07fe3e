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

//! Shared fixtures for integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use revgraph_core::{
    Lineage, PartitionKey, RevisionHeader, RevisionMessage, SealedRevision,
};
use revgraph_store::{
    Authorizer, GraphRegistry, MemoryLogBridge, MergeDriver, MergePair, Merger,
    PartitionResolver, Permissions, RecordSerializer, Rights, SerializerError, StoreConfig,
    VersionGraph,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// A small versioned domain record: one named account with a balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub version: Uuid,
    pub previous: Option<Uuid>,
    pub merges: BTreeSet<Uuid>,
    pub name: String,
    pub balance: i64,
}

impl Lineage for TestRecord {
    fn id(&self) -> Uuid {
        self.id
    }
    fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }
    fn version(&self) -> Uuid {
        self.version
    }
    fn set_version(&mut self, version: Uuid) {
        self.version = version;
    }
    fn previous(&self) -> Option<Uuid> {
        self.previous
    }
    fn set_previous(&mut self, previous: Option<Uuid>) {
        self.previous = previous;
    }
    fn merges(&self) -> &BTreeSet<Uuid> {
        &self.merges
    }
    fn set_merges(&mut self, merges: BTreeSet<Uuid>) {
        self.merges = merges;
    }
}

/// JSON payload serializer; the header stays authoritative for lineage.
pub struct JsonSerializer;

impl RecordSerializer<TestRecord> for JsonSerializer {
    fn from_message(
        &self,
        _key: &PartitionKey,
        msg: &SealedRevision,
        _deep: bool,
    ) -> Result<TestRecord, SerializerError> {
        let payload = msg
            .data()
            .payload
            .as_ref()
            .ok_or_else(|| SerializerError("no payload to deserialize".to_string()))?;
        let mut record: TestRecord =
            serde_json::from_slice(payload).map_err(|err| SerializerError(err.to_string()))?;
        let header = msg.header();
        record.id = header.object_id;
        record.version = header.version;
        record.previous = header.previous;
        record.merges = header.merges.clone();
        Ok(record)
    }

    fn to_message(
        &self,
        _key: &PartitionKey,
        record: &TestRecord,
    ) -> Result<RevisionMessage, SerializerError> {
        let payload =
            serde_json::to_vec(record).map_err(|err| SerializerError(err.to_string()))?;
        let mut header =
            RevisionHeader::new(record.id, record.version, record.previous, "TestRecord");
        header.merges = record.merges.clone();
        Ok(RevisionMessage::new(header, Some(payload)))
    }
}

/// Three-way numeric merge: fold each tip's delta against its ancestor.
pub struct DeltaMerger;

impl Merger<TestRecord> for DeltaMerger {
    fn merge(&self, pairs: Vec<MergePair<TestRecord>>) -> Option<TestRecord> {
        let mut iter = pairs.into_iter();
        let first = iter.next()?;
        let base = first.ancestor.as_ref().map(|a| a.balance).unwrap_or(0);
        let mut merged = first.tip;
        for pair in iter {
            let ancestor = pair.ancestor.map(|a| a.balance).unwrap_or(base);
            merged.balance += pair.tip.balance - ancestor;
        }
        Some(merged)
    }
}

/// Header merger that records the lineage of every call it sees.
#[derive(Default)]
pub struct RecordingHeaderMerger {
    /// One entry per call: `(ancestor version, tip version)` pairs in the
    /// order they were handed over.
    pub seen: Mutex<Vec<Vec<(Option<Uuid>, Uuid)>>>,
}

impl Merger<RevisionHeader> for RecordingHeaderMerger {
    fn merge(&self, pairs: Vec<MergePair<RevisionHeader>>) -> Option<RevisionHeader> {
        self.seen.lock().push(
            pairs
                .iter()
                .map(|pair| (pair.ancestor.as_ref().map(|a| a.version), pair.tip.version))
                .collect(),
        );
        pairs.into_iter().next().map(|pair| pair.tip)
    }
}

/// Authorization oracle with a fixed answer.
pub struct StaticAuth {
    pub granted: bool,
}

impl Authorizer for StaticAuth {
    fn perms(
        &self,
        _key: &PartitionKey,
        _object_id: Uuid,
        _parent_id: Option<Uuid>,
        _compute_children: bool,
    ) -> Permissions {
        let mut perms = Permissions::default();
        if self.granted {
            perms.write.insert("role.tester".to_string());
        }
        perms
    }
}

/// Resolver that pins every record to one partition.
pub struct KeyResolver(pub PartitionKey);

impl PartitionResolver<TestRecord> for KeyResolver {
    fn resolve(&self, _record: &TestRecord) -> PartitionKey {
        self.0.clone()
    }
}

/// A fully wired store over the in-memory log bridge.
pub struct Harness {
    pub key: PartitionKey,
    pub bridge: Arc<MemoryLogBridge<TestRecord>>,
    pub registry: Arc<GraphRegistry<TestRecord>>,
    pub header_merger: Arc<RecordingHeaderMerger>,
}

/// Wire serializer, mergers, authorization, resolver, bridge and registry.
pub fn harness(granted: bool) -> Harness {
    let key = PartitionKey::new("accounts", 0);
    let serializer = Arc::new(JsonSerializer);
    let bridge = Arc::new(MemoryLogBridge::new(serializer.clone()));
    let header_merger = Arc::new(RecordingHeaderMerger::default());
    let driver = Arc::new(MergeDriver::new(
        serializer,
        header_merger.clone(),
        Arc::new(DeltaMerger),
        Arc::new(StaticAuth { granted }),
        Arc::new(KeyResolver(key.clone())),
        bridge.clone(),
        Rights::with_write(["role.tester"]),
        StoreConfig::default(),
    ));
    let registry = Arc::new(GraphRegistry::new(driver));
    bridge.attach(&registry);
    Harness {
        key,
        bridge,
        registry,
        header_merger,
    }
}

/// A message carrying a JSON-encoded [`TestRecord`] payload.
pub fn record_message(
    object: Uuid,
    version: Uuid,
    previous: Option<Uuid>,
    balance: i64,
) -> RevisionMessage {
    let record = TestRecord {
        id: object,
        parent_id: None,
        version,
        previous,
        merges: BTreeSet::new(),
        name: "account".to_string(),
        balance,
    };
    let header = RevisionHeader::new(object, version, previous, "TestRecord");
    RevisionMessage::new(header, Some(serde_json::to_vec(&record).unwrap()))
}

/// A payload-less (tombstone-like) message.
pub fn bare_message(object: Uuid, version: Uuid, previous: Option<Uuid>) -> RevisionMessage {
    RevisionMessage::new(
        RevisionHeader::new(object, version, previous, "TestRecord"),
        None,
    )
}

/// Re-derive the frontier from the inserted headers alone and check it
/// against the graph: a version is a leaf exactly when no inserted header
/// declares it as previous or as a merge parent.
pub fn assert_frontier_invariant(graph: &VersionGraph<TestRecord>, inserted: &[RevisionHeader]) {
    let mut referenced: HashSet<Uuid> = HashSet::new();
    for header in inserted {
        if let Some(previous) = header.previous {
            referenced.insert(previous);
        }
        referenced.extend(header.merges.iter().copied());
    }
    let expected: HashSet<Uuid> = inserted
        .iter()
        .map(|header| header.version)
        .filter(|version| !referenced.contains(version))
        .collect();
    let actual: HashSet<Uuid> = graph.leaves().into_iter().collect();
    assert_eq!(actual, expected, "frontier diverged from declarations");
}
