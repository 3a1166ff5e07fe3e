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

//! Store error types

use thiserror::Error;

/// Result type for merged-view reads
pub type MergeResult<T> = Result<T, MergeError>;

/// Serializer failure while converting between messages and typed records
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("serializer failed: {0}")]
pub struct SerializerError(pub String);

/// Errors surfaced by the merged-view read path
#[derive(Debug, Error)]
pub enum MergeError {
    /// Merged view requested on a container with no revisions
    #[error("version graph has no revisions to merge")]
    EmptyGraph,

    /// The merge policy could not reduce a diverged frontier to one value
    #[error("merge policy returned no result for a diverged frontier")]
    Unmergeable,

    /// The serializer failed while materializing a revision
    #[error(transparent)]
    Serializer(#[from] SerializerError),
}

/// Errors raised by log bridge operations
///
/// Bridge errors never propagate out of a merged-view read; the driver
/// logs and swallows them on the write-back path.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The log transport rejected or could not accept the operation
    #[error("log unavailable: {0}")]
    Unavailable(String),

    /// The record could not be serialized for the log
    #[error(transparent)]
    Serializer(#[from] SerializerError),
}
