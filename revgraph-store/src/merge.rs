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

//! Three-way merge orchestration
//!
//! The merge driver reduces a diverged frontier to a single view. Each
//! tip is paired with its linked ancestor and the pairs are handed to the
//! merge policy, in frontier order. A successful multi-parent merge is
//! reconciled: it gets a fresh version id, no single parent, and the full
//! set of collapsed leaf versions, and then it is offered back to the
//! commit log so the divergence collapses on every replica.
//!
//! The driver only ever works on frontier snapshots; it never runs while
//! a container lock is held.

use crate::config::StoreConfig;
use crate::error::{MergeError, MergeResult};
use crate::graph::FrontierEntry;
use crate::traits::{
    Authorizer, LogBridge, MergePair, Merger, PartitionResolver, RecordSerializer, Rights,
};
use revgraph_core::{short_version, Lineage, PartitionKey, RevisionHeader, SealedRevision};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Orchestrates merged views across a container's frontier.
pub struct MergeDriver<R: Lineage> {
    serializer: Arc<dyn RecordSerializer<R>>,
    header_merger: Arc<dyn Merger<RevisionHeader>>,
    record_merger: Arc<dyn Merger<R>>,
    authorizer: Arc<dyn Authorizer>,
    resolver: Arc<dyn PartitionResolver<R>>,
    bridge: Arc<dyn LogBridge<R>>,
    rights: Rights,
    config: StoreConfig,
}

impl<R: Lineage> MergeDriver<R> {
    /// Wire a driver to its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        serializer: Arc<dyn RecordSerializer<R>>,
        header_merger: Arc<dyn Merger<RevisionHeader>>,
        record_merger: Arc<dyn Merger<R>>,
        authorizer: Arc<dyn Authorizer>,
        resolver: Arc<dyn PartitionResolver<R>>,
        bridge: Arc<dyn LogBridge<R>>,
        rights: Rights,
        config: StoreConfig,
    ) -> Self {
        Self {
            serializer,
            header_merger,
            record_merger,
            authorizer,
            resolver,
            bridge,
            rights,
            config,
        }
    }

    /// Merge the frontier's headers into one.
    pub(crate) fn merge_headers(
        &self,
        frontier: Vec<FrontierEntry>,
    ) -> MergeResult<RevisionHeader> {
        if frontier.is_empty() {
            return Err(MergeError::EmptyGraph);
        }
        if let [only] = frontier.as_slice() {
            return Ok(only.msg.header().clone());
        }

        let pairs = frontier
            .iter()
            .map(|entry| MergePair {
                ancestor: entry.parent_msg.as_ref().map(|msg| msg.header().clone()),
                tip: entry.msg.header().clone(),
            })
            .collect();
        self.header_merger
            .merge(pairs)
            .ok_or(MergeError::Unmergeable)
    }

    /// Merge the frontier's records into one, reconciling lineage and
    /// offering a multi-parent result back to the log.
    pub(crate) fn merge_records(
        &self,
        key: &PartitionKey,
        frontier: Vec<FrontierEntry>,
    ) -> MergeResult<R> {
        if frontier.is_empty() {
            return Err(MergeError::EmptyGraph);
        }
        if let [only] = frontier.as_slice() {
            return Ok(self.materialize_uncached(key, &only.msg)?);
        }

        // Leaves can share an ancestor; each node deserializes once.
        let mut cache: HashMap<Uuid, R> = HashMap::new();
        let mut pairs = Vec::with_capacity(frontier.len());
        for entry in &frontier {
            let ancestor = match (entry.parent_version, &entry.parent_msg) {
                (Some(parent_version), Some(parent_msg)) => {
                    Some(self.materialize(key, &mut cache, parent_version, parent_msg)?)
                }
                _ => None,
            };
            let tip = self.materialize(key, &mut cache, entry.version, &entry.msg)?;
            pairs.push(MergePair { ancestor, tip });
        }

        let merged = self
            .record_merger
            .merge(pairs)
            .ok_or(MergeError::Unmergeable)?;
        Ok(self.reconcile(merged, &frontier))
    }

    fn materialize_uncached(
        &self,
        key: &PartitionKey,
        msg: &SealedRevision,
    ) -> Result<R, MergeError> {
        Ok(self
            .serializer
            .from_message(key, msg, self.config.deep_deserialize)?)
    }

    fn materialize(
        &self,
        key: &PartitionKey,
        cache: &mut HashMap<Uuid, R>,
        version: Uuid,
        msg: &SealedRevision,
    ) -> Result<R, MergeError> {
        if let Some(hit) = cache.get(&version) {
            return Ok(hit.clone());
        }
        let record = self
            .serializer
            .from_message(key, msg, self.config.deep_deserialize)?;
        cache.insert(version, record.clone());
        Ok(record)
    }

    /// Rewrite the merged record's lineage so it supersedes the frontier
    /// it collapsed.
    fn reconcile(&self, mut merged: R, frontier: &[FrontierEntry]) -> R {
        if let [only] = frontier {
            merged.set_previous(Some(only.version));
            return merged;
        }

        merged.set_previous(None);
        merged.set_version(Uuid::new_v4());
        merged.set_merges(frontier.iter().map(|entry| entry.version).collect());

        // A reconciling merge re-enters the log so that compaction cannot
        // drop the only copy of the collapsed state. Failure here never
        // fails the read: the in-memory view stays authoritative and the
        // next read retries.
        if self.config.reconcile_write_back {
            let key = self.resolver.resolve(&merged);
            let perms = self
                .authorizer
                .perms(&key, merged.id(), merged.parent_id(), false);
            if perms.can_write(&self.rights) {
                debug!(
                    partition = %key,
                    version = %short_version(merged.version()),
                    collapsed = frontier.len(),
                    "writing reconciling merge back to the log"
                );
                if let Err(err) = self.bridge.merge_unchecked(&key, merged.clone()) {
                    warn!(partition = %key, error = %err, "reconciling write-back failed");
                }
            }
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SerializerError;
    use crate::traits::{Permissions, SyncBridge};
    use crate::BridgeError;
    use parking_lot::Mutex;
    use revgraph_core::{LogMeta, RevisionMessage, SyncToken};
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        id: Uuid,
        version: Uuid,
        previous: Option<Uuid>,
        merges: BTreeSet<Uuid>,
        balance: i64,
    }

    impl Lineage for Account {
        fn id(&self) -> Uuid {
            self.id
        }
        fn parent_id(&self) -> Option<Uuid> {
            None
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

    /// Decodes the payload's first byte as the account balance and counts
    /// how often it runs, so memoization is observable.
    struct ByteSerializer {
        calls: AtomicUsize,
    }

    impl ByteSerializer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RecordSerializer<Account> for ByteSerializer {
        fn from_message(
            &self,
            _key: &PartitionKey,
            msg: &SealedRevision,
            _deep: bool,
        ) -> Result<Account, SerializerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let balance = msg
                .data()
                .payload
                .as_ref()
                .and_then(|bytes| bytes.first())
                .copied()
                .ok_or_else(|| SerializerError("missing payload".to_string()))?;
            Ok(Account {
                id: msg.header().object_id,
                version: msg.version(),
                previous: msg.header().previous,
                merges: msg.header().merges.clone(),
                balance: balance as i64,
            })
        }

        fn to_message(
            &self,
            _key: &PartitionKey,
            _record: &Account,
        ) -> Result<RevisionMessage, SerializerError> {
            Err(SerializerError("write path not under test".to_string()))
        }
    }

    /// Classic three-way numeric merge: fold each tip's delta against its
    /// ancestor into the first tip.
    struct DeltaMerger;

    impl Merger<Account> for DeltaMerger {
        fn merge(&self, pairs: Vec<MergePair<Account>>) -> Option<Account> {
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

    struct RefusingMerger;

    impl Merger<Account> for RefusingMerger {
        fn merge(&self, _pairs: Vec<MergePair<Account>>) -> Option<Account> {
            None
        }
    }

    impl Merger<RevisionHeader> for RefusingMerger {
        fn merge(&self, _pairs: Vec<MergePair<RevisionHeader>>) -> Option<RevisionHeader> {
            None
        }
    }

    /// Keeps the newest header and unions the write grants.
    struct HeaderMerger;

    impl Merger<RevisionHeader> for HeaderMerger {
        fn merge(&self, pairs: Vec<MergePair<RevisionHeader>>) -> Option<RevisionHeader> {
            let mut iter = pairs.into_iter();
            let mut merged = iter.next()?.tip;
            for pair in iter {
                for role in pair.tip.allow_write {
                    if !merged.allow_write.contains(&role) {
                        merged.allow_write.push(role);
                    }
                }
            }
            Some(merged)
        }
    }

    struct FixedAuth {
        granted: bool,
    }

    impl Authorizer for FixedAuth {
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

    struct FixedResolver(PartitionKey);

    impl PartitionResolver<Account> for FixedResolver {
        fn resolve(&self, _record: &Account) -> PartitionKey {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct RecordingBridge {
        written: Mutex<Vec<Account>>,
        fail: bool,
    }

    impl SyncBridge for RecordingBridge {
        fn sync(&self, _key: &PartitionKey, _token: &SyncToken) -> Result<(), BridgeError> {
            Ok(())
        }
    }

    impl LogBridge<Account> for RecordingBridge {
        fn merge_unchecked(
            &self,
            _key: &PartitionKey,
            record: Account,
        ) -> Result<(), BridgeError> {
            if self.fail {
                return Err(BridgeError::Unavailable("bridge down".to_string()));
            }
            self.written.lock().push(record);
            Ok(())
        }
    }

    struct Fixture {
        driver: MergeDriver<Account>,
        serializer: Arc<ByteSerializer>,
        bridge: Arc<RecordingBridge>,
        key: PartitionKey,
    }

    fn fixture_with(granted: bool, bridge_fails: bool, config: StoreConfig) -> Fixture {
        let key = PartitionKey::new("accounts", 0);
        let serializer = Arc::new(ByteSerializer::new());
        let bridge = Arc::new(RecordingBridge {
            written: Mutex::new(Vec::new()),
            fail: bridge_fails,
        });
        let driver = MergeDriver::new(
            serializer.clone(),
            Arc::new(HeaderMerger),
            Arc::new(DeltaMerger),
            Arc::new(FixedAuth { granted }),
            Arc::new(FixedResolver(key.clone())),
            bridge.clone(),
            Rights::with_write(["role.tester"]),
            config,
        );
        Fixture {
            driver,
            serializer,
            bridge,
            key,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(true, false, StoreConfig::default())
    }

    fn entry(balance: u8, parent: Option<&FrontierEntry>) -> FrontierEntry {
        let version = Uuid::new_v4();
        let header = RevisionHeader::new(
            Uuid::new_v4(),
            version,
            parent.map(|p| p.version),
            "Account",
        );
        let msg = SealedRevision::new(
            RevisionMessage::new(header, Some(vec![balance])),
            LogMeta::new(0, 0, 0),
        );
        FrontierEntry {
            version,
            msg,
            parent_version: parent.map(|p| p.version),
            parent_msg: parent.map(|p| p.msg.clone()),
        }
    }

    #[test]
    fn test_empty_frontier_is_empty_graph() {
        let f = fixture();
        assert!(matches!(
            f.driver.merge_records(&f.key, Vec::new()),
            Err(MergeError::EmptyGraph)
        ));
        assert!(matches!(
            f.driver.merge_headers(Vec::new()),
            Err(MergeError::EmptyGraph)
        ));
    }

    #[test]
    fn test_single_leaf_returns_record_untouched() {
        let f = fixture();
        let tip = entry(42, None);
        let record = f.driver.merge_records(&f.key, vec![tip.clone()]).unwrap();

        assert_eq!(record.balance, 42);
        assert_eq!(record.version, tip.version);
        // No reconciliation and no write-back on a converged frontier.
        assert!(record.merges.is_empty());
        assert!(f.bridge.written.lock().is_empty());
    }

    #[test]
    fn test_diverged_frontier_merges_deltas_and_reconciles() {
        let f = fixture();
        let base = entry(10, None);
        let left = entry(17, Some(&base)); // +7
        let right = entry(13, Some(&base)); // +3
        let leaves = vec![left.clone(), right.clone()];

        let merged = f.driver.merge_records(&f.key, leaves).unwrap();

        assert_eq!(merged.balance, 20);
        assert_eq!(merged.previous, None);
        assert_ne!(merged.version, left.version);
        assert_ne!(merged.version, right.version);
        assert_eq!(
            merged.merges,
            [left.version, right.version].into_iter().collect()
        );
    }

    #[test]
    fn test_shared_ancestor_deserializes_once() {
        let f = fixture();
        let base = entry(10, None);
        let left = entry(11, Some(&base));
        let right = entry(12, Some(&base));

        f.driver
            .merge_records(&f.key, vec![left, right])
            .unwrap();

        // Two tips plus one shared ancestor.
        assert_eq!(f.serializer.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_write_back_goes_through_bridge_when_authorized() {
        let f = fixture();
        let base = entry(10, None);
        let leaves = vec![entry(11, Some(&base)), entry(12, Some(&base))];

        let merged = f.driver.merge_records(&f.key, leaves).unwrap();

        let written = f.bridge.written.lock();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0], merged);
    }

    #[test]
    fn test_write_back_suppressed_without_write_rights() {
        let f = fixture_with(false, false, StoreConfig::default());
        let base = entry(10, None);
        let leaves = vec![entry(11, Some(&base)), entry(12, Some(&base))];

        let merged = f.driver.merge_records(&f.key, leaves).unwrap();

        // Denied authorization suppresses the write-back, not the read.
        assert_eq!(merged.balance, 13);
        assert!(f.bridge.written.lock().is_empty());
    }

    #[test]
    fn test_write_back_suppressed_by_config() {
        let config = StoreConfig {
            reconcile_write_back: false,
            ..StoreConfig::default()
        };
        let f = fixture_with(true, false, config);
        let base = entry(10, None);
        let leaves = vec![entry(11, Some(&base)), entry(12, Some(&base))];

        f.driver.merge_records(&f.key, leaves).unwrap();
        assert!(f.bridge.written.lock().is_empty());
    }

    #[test]
    fn test_bridge_failure_never_fails_the_read() {
        let f = fixture_with(true, true, StoreConfig::default());
        let base = entry(10, None);
        let leaves = vec![entry(11, Some(&base)), entry(12, Some(&base))];

        let merged = f.driver.merge_records(&f.key, leaves).unwrap();
        assert_eq!(merged.balance, 13);
    }

    #[test]
    fn test_unmergeable_frontier_is_an_error() {
        let key = PartitionKey::new("accounts", 0);
        let serializer = Arc::new(ByteSerializer::new());
        let bridge = Arc::new(RecordingBridge::default());
        let driver: MergeDriver<Account> = MergeDriver::new(
            serializer,
            Arc::new(RefusingMerger),
            Arc::new(RefusingMerger),
            Arc::new(FixedAuth { granted: true }),
            Arc::new(FixedResolver(key.clone())),
            bridge.clone(),
            Rights::with_write(["role.tester"]),
            StoreConfig::default(),
        );

        let base = entry(10, None);
        let leaves = vec![entry(11, Some(&base)), entry(12, Some(&base))];
        assert!(matches!(
            driver.merge_records(&key, leaves),
            Err(MergeError::Unmergeable)
        ));
        assert!(bridge.written.lock().is_empty());
    }

    #[test]
    fn test_serializer_failure_propagates() {
        let f = fixture();
        let mut tip = entry(10, None);
        // Strip the payload so deserialization fails.
        let header = tip.msg.header().clone();
        tip.msg = SealedRevision::new(RevisionMessage::new(header, None), LogMeta::new(0, 0, 0));

        assert!(matches!(
            f.driver.merge_records(&f.key, vec![tip]),
            Err(MergeError::Serializer(_))
        ));
    }

    #[test]
    fn test_orphan_tip_merges_with_null_ancestor() {
        let f = fixture();
        let base = entry(10, None);
        let linked = entry(17, Some(&base)); // +7 against 10
        let orphan = entry(5, None); // no ancestor ever arrived

        let merged = f
            .driver
            .merge_records(&f.key, vec![linked.clone(), orphan.clone()])
            .unwrap();

        // The orphan's ancestor defaults to the first tip's base.
        assert_eq!(merged.balance, 17 + (5 - 10));
        assert_eq!(
            merged.merges,
            [linked.version, orphan.version].into_iter().collect()
        );
    }

    #[test]
    fn test_header_merge_unions_grants_in_frontier_order() {
        let f = fixture();
        let base = entry(1, None);
        let mut left = entry(2, Some(&base));
        let mut right = entry(3, Some(&base));

        let mut header = left.msg.header().clone();
        header.allow_write.push("role.alice".to_string());
        left.msg = SealedRevision::new(
            RevisionMessage::new(header, Some(vec![2])),
            LogMeta::new(0, 0, 0),
        );
        let mut header = right.msg.header().clone();
        header.allow_write.push("role.bob".to_string());
        right.msg = SealedRevision::new(
            RevisionMessage::new(header, Some(vec![3])),
            LogMeta::new(0, 0, 0),
        );

        let merged = f
            .driver
            .merge_headers(vec![left.clone(), right])
            .unwrap();
        assert_eq!(merged.version, left.version);
        assert_eq!(
            merged.allow_write,
            vec!["role.alice".to_string(), "role.bob".to_string()]
        );
    }
}
