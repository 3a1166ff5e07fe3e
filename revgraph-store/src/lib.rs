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

//! Revgraph Store
//!
//! Concurrent per-object version graph store backing a partitioned,
//! append-only commit log. Each logical object is a UUID-keyed DAG of
//! revisions; containers ingest revisions in whatever order the log
//! delivers them, track the diverged frontier, and produce merged views
//! on demand.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  commit log (partitioned, at-least-once)                       │
//! └───────┬────────────────────────────────────────────▲───────────┘
//!         │ (message, meta)                            │ reconciling
//!         ▼                                            │ write-back
//! ┌───────────────┐     ┌───────────────┐     ┌────────┴────────┐
//! │ GraphRegistry │────►│ VersionGraph  │────►│  MergeDriver    │
//! │ (partition,   │     │ index/leaves/ │     │ serializer ·    │
//! │  object) map  │     │ timeline, one │     │ merger · auth · │
//! └───────────────┘     │ rwlock each   │     │ resolver·bridge │
//!                       └───────────────┘     └─────────────────┘
//! ```
//!
//! Queries return snapshots taken under a container's read lock; the
//! merge driver and the log bridge only ever run against snapshots, so
//! no lock is held across collaborator calls.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod graph;
pub mod index;
pub mod memory;
pub mod merge;
pub mod node;
pub mod registry;
pub mod traits;

pub use config::StoreConfig;
pub use coordinator::{SessionEvent, SyncCoordinator};
pub use error::{BridgeError, MergeError, MergeResult, SerializerError};
pub use graph::VersionGraph;
pub use index::VersionIndex;
pub use memory::MemoryLogBridge;
pub use merge::MergeDriver;
pub use node::GraphNode;
pub use registry::GraphRegistry;
pub use traits::{
    Authorizer, LogBridge, MergePair, Merger, PartitionResolver, Permissions, RecordSerializer,
    Rights, SyncBridge,
};
