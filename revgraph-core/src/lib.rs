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

//! Revgraph Core
//!
//! Fundamental data structures for the revgraph commit-log store: revision
//! headers, log messages and their placement metadata, partition addressing,
//! the lineage contract for typed records, and the binary wire framing.
//!
//! Everything here is plain data. The concurrent version-graph machinery
//! that consumes these types lives in `revgraph-store`.

pub mod error;
pub mod header;
pub mod key;
pub mod lineage;
pub mod message;
pub mod sync;
pub mod wire;

pub use error::{CoreError, CoreResult};
pub use header::{short_version, RevisionHeader};
pub use key::PartitionKey;
pub use lineage::Lineage;
pub use message::{LogMeta, RevisionMessage, SealedRevision};
pub use sync::SyncToken;
pub use wire::{
    decode_message, decode_meta, encode_message, encode_meta, FRAME_MAGIC, FRAME_VERSION,
};
