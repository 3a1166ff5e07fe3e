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

//! Container registry
//!
//! Concurrent map from `(partition, object)` to the object's version
//! graph. The registry owns the containers; a container lives as long as
//! its registry entry. Lock ordering is registry shard, then container;
//! the registry never takes a container lock itself.

use crate::graph::VersionGraph;
use crate::merge::MergeDriver;
use dashmap::DashMap;
use revgraph_core::{Lineage, PartitionKey};
use std::sync::Arc;
use uuid::Uuid;

/// Registry of per-object containers.
pub struct GraphRegistry<R: Lineage> {
    driver: Arc<MergeDriver<R>>,
    containers: DashMap<(PartitionKey, Uuid), Arc<VersionGraph<R>>>,
}

impl<R: Lineage> GraphRegistry<R> {
    /// Create an empty registry; new containers share the given driver.
    pub fn new(driver: Arc<MergeDriver<R>>) -> Self {
        Self {
            driver,
            containers: DashMap::new(),
        }
    }

    /// The container for an object, created empty on first use.
    pub fn get_or_create(&self, key: &PartitionKey, object_id: Uuid) -> Arc<VersionGraph<R>> {
        self.containers
            .entry((key.clone(), object_id))
            .or_insert_with(|| {
                Arc::new(VersionGraph::new(key.clone(), self.driver.clone()))
            })
            .value()
            .clone()
    }

    /// The container for an object, if one exists.
    pub fn get(&self, key: &PartitionKey, object_id: Uuid) -> Option<Arc<VersionGraph<R>>> {
        self.containers
            .get(&(key.clone(), object_id))
            .map(|entry| entry.value().clone())
    }

    /// Number of containers held.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Whether the registry holds no containers.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}
