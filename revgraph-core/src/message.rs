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

//! Log messages and placement metadata
//!
//! A [`RevisionMessage`] is the unit the commit log delivers: a header plus
//! optional payload bytes (a header with no payload still participates in
//! the version graph). [`LogMeta`] records where the log placed the message;
//! it is mutable while the message is in flight and frozen once a container
//! takes ownership.

use crate::header::RevisionHeader;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single data message as delivered by the commit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMessage {
    /// Lineage and authorization header.
    pub header: RevisionHeader,
    /// Opaque payload bytes; absent for tombstone-like messages.
    pub payload: Option<Vec<u8>>,
}

impl RevisionMessage {
    /// Create a new message.
    pub fn new(header: RevisionHeader, payload: Option<Vec<u8>>) -> Self {
        Self { header, payload }
    }

    /// Whether the message carries payload bytes.
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

/// Placement metadata for a message on the commit log.
///
/// Mutators check the freeze flag in debug builds only; release builds do
/// not pay for the check. Once [`LogMeta::freeze`] has been called the
/// value must be treated as read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMeta {
    partition: i64,
    offset: i64,
    timestamp: i64,
    #[serde(skip)]
    frozen: bool,
}

impl LogMeta {
    /// Create metadata for a message placed at the given log position.
    pub fn new(partition: i64, offset: i64, timestamp: i64) -> Self {
        Self {
            partition,
            offset,
            timestamp,
            frozen: false,
        }
    }

    /// Partition the message landed on.
    pub fn partition(&self) -> i64 {
        self.partition
    }

    /// Offset within the partition.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Broker timestamp in milliseconds since the epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Update the partition; forbidden after freeze.
    pub fn set_partition(&mut self, partition: i64) {
        debug_assert!(!self.frozen, "meta mutated after freeze");
        self.partition = partition;
    }

    /// Update the offset; forbidden after freeze.
    pub fn set_offset(&mut self, offset: i64) {
        debug_assert!(!self.frozen, "meta mutated after freeze");
        self.offset = offset;
    }

    /// Update the timestamp; forbidden after freeze.
    pub fn set_timestamp(&mut self, timestamp: i64) {
        debug_assert!(!self.frozen, "meta mutated after freeze");
        self.timestamp = timestamp;
    }

    /// Mark the metadata read-only.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether the metadata has been frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

/// A message sealed into a container together with its frozen metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRevision {
    data: RevisionMessage,
    meta: LogMeta,
}

impl SealedRevision {
    /// Pair a message with its placement metadata.
    pub fn new(data: RevisionMessage, meta: LogMeta) -> Self {
        Self { data, meta }
    }

    /// The message itself.
    pub fn data(&self) -> &RevisionMessage {
        &self.data
    }

    /// Placement metadata.
    pub fn meta(&self) -> &LogMeta {
        &self.meta
    }

    /// The message header.
    pub fn header(&self) -> &RevisionHeader {
        &self.data.header
    }

    /// Version id declared by the header.
    pub fn version(&self) -> Uuid {
        self.data.header.version
    }
}
