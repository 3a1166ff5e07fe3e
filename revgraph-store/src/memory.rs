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

//! In-memory log bridge
//!
//! A single-process stand-in for the partitioned commit log: an ordered,
//! append-only message list per partition. Offsets are list positions and
//! `sync` is an immediate barrier. Useful as the integration-test
//! transport and for single-process deployments; replaying a partition
//! into a fresh registry reconstructs every container deterministically.

use crate::error::BridgeError;
use crate::registry::GraphRegistry;
use crate::traits::{LogBridge, RecordSerializer, SyncBridge};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use revgraph_core::{
    Lineage, LogMeta, PartitionKey, RevisionMessage, SealedRevision, SyncToken,
};
use std::sync::{Arc, Weak};

/// In-process commit log keyed by partition.
pub struct MemoryLogBridge<R: Lineage> {
    serializer: Arc<dyn RecordSerializer<R>>,
    partitions: DashMap<PartitionKey, Vec<SealedRevision>>,
    synced: Mutex<Vec<(PartitionKey, SyncToken)>>,
    registry: RwLock<Option<Weak<GraphRegistry<R>>>>,
}

impl<R: Lineage> MemoryLogBridge<R> {
    /// Create an empty log. Reconciling merges are rendered back into
    /// messages through the given serializer.
    pub fn new(serializer: Arc<dyn RecordSerializer<R>>) -> Self {
        Self {
            serializer,
            partitions: DashMap::new(),
            synced: Mutex::new(Vec::new()),
            registry: RwLock::new(None),
        }
    }

    /// Deliver every published message to the registry's containers from
    /// now on. The bridge holds the registry weakly; the caller keeps it
    /// alive.
    pub fn attach(&self, registry: &Arc<GraphRegistry<R>>) {
        *self.registry.write() = Some(Arc::downgrade(registry));
    }

    /// Append a message to a partition, assigning the next offset.
    /// Returns the placement the log chose.
    pub fn publish(&self, key: &PartitionKey, data: RevisionMessage) -> LogMeta {
        let mut meta = LogMeta::new(key.index as i64, 0, current_timestamp_ms());
        {
            let mut log = self.partitions.entry(key.clone()).or_default();
            meta.set_offset(log.len() as i64);
            let mut sealed = meta.clone();
            sealed.freeze();
            log.push(SealedRevision::new(data.clone(), sealed));
        }

        // Delivery happens outside the partition shard lock: registry,
        // then container, never the reverse.
        let registry = self.registry.read().as_ref().and_then(Weak::upgrade);
        if let Some(registry) = registry {
            registry
                .get_or_create(key, data.header.object_id)
                .add(data, meta.clone());
        }
        meta
    }

    /// Snapshot of one partition's log, in offset order.
    pub fn log(&self, key: &PartitionKey) -> Vec<SealedRevision> {
        self.partitions
            .get(key)
            .map(|log| log.value().clone())
            .unwrap_or_default()
    }

    /// Replay every partition into a registry, reconstructing container
    /// state from the log alone.
    pub fn replay_into(&self, registry: &GraphRegistry<R>) {
        let partitions: Vec<(PartitionKey, Vec<SealedRevision>)> = self
            .partitions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        for (key, log) in partitions {
            for sealed in log {
                registry
                    .get_or_create(&key, sealed.header().object_id)
                    .add(sealed.data().clone(), sealed.meta().clone());
            }
        }
    }

    /// Barriers acknowledged so far, in arrival order.
    pub fn synced(&self) -> Vec<(PartitionKey, SyncToken)> {
        self.synced.lock().clone()
    }
}

impl<R: Lineage> SyncBridge for MemoryLogBridge<R> {
    fn sync(&self, key: &PartitionKey, token: &SyncToken) -> Result<(), BridgeError> {
        // Appends are immediate here, so the barrier just acknowledges.
        self.synced.lock().push((key.clone(), *token));
        Ok(())
    }
}

impl<R: Lineage> LogBridge<R> for MemoryLogBridge<R> {
    fn merge_unchecked(&self, key: &PartitionKey, record: R) -> Result<(), BridgeError> {
        let msg = self.serializer.to_message(key, &record)?;
        self.publish(key, msg);
        Ok(())
    }
}

/// Current wall-clock time in milliseconds since the epoch.
fn current_timestamp_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
