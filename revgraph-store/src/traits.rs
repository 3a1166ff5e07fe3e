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

//! Collaborator contracts
//!
//! The store orchestrates the version graph and the merge protocol; the
//! decisions it cannot make itself are delegated through these traits.
//! Every collaborator is handed in explicitly at construction time.

use crate::error::{BridgeError, SerializerError};
use revgraph_core::{Lineage, PartitionKey, RevisionMessage, SealedRevision, SyncToken};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Converts between log messages and typed records.
pub trait RecordSerializer<R: Lineage>: Send + Sync {
    /// Materialize a typed record from a sealed log message.
    ///
    /// `deep` asks for nested objects to be resolved as well. Failure is
    /// exceptional and propagates unchanged to the caller.
    fn from_message(
        &self,
        key: &PartitionKey,
        msg: &SealedRevision,
        deep: bool,
    ) -> Result<R, SerializerError>;

    /// Render a typed record back into a log message.
    fn to_message(&self, key: &PartitionKey, record: &R) -> Result<RevisionMessage, SerializerError>;
}

/// Ancestor/tip pairing handed to the merge policy.
///
/// The ancestor is `None` when a tip's parent revision never arrived on
/// this replica.
#[derive(Debug, Clone)]
pub struct MergePair<T> {
    /// Most recent common ancestor known for the tip.
    pub ancestor: Option<T>,
    /// The diverged tip itself.
    pub tip: T,
}

/// Field-level merge policy.
///
/// Reduces a list of ancestor/tip pairs to a single value; `None` means
/// the inputs could not be merged.
pub trait Merger<T>: Send + Sync {
    /// Merge the pairs, in frontier order.
    fn merge(&self, pairs: Vec<MergePair<T>>) -> Option<T>;
}

/// Write rights held by the current principal.
#[derive(Debug, Clone, Default)]
pub struct Rights {
    /// Role keys the principal can sign writes with.
    pub write: BTreeSet<String>,
}

impl Rights {
    /// Rights over the given role keys.
    pub fn with_write<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            write: roles.into_iter().map(Into::into).collect(),
        }
    }
}

/// Effective permissions computed for one object in one partition.
#[derive(Debug, Clone, Default)]
pub struct Permissions {
    /// Role keys that may write the object.
    pub write: BTreeSet<String>,
}

impl Permissions {
    /// Whether any of the principal's rights grant a write.
    pub fn can_write(&self, rights: &Rights) -> bool {
        self.write.iter().any(|role| rights.write.contains(role))
    }
}

/// Authorization oracle consulted before a reconciling write-back.
pub trait Authorizer: Send + Sync {
    /// Effective permissions for the object in the partition.
    ///
    /// `compute_children` asks for child-object grants to be resolved as
    /// well; the merge driver never needs them.
    fn perms(
        &self,
        key: &PartitionKey,
        object_id: Uuid,
        parent_id: Option<Uuid>,
        compute_children: bool,
    ) -> Permissions;
}

/// Maps a record to the partition its object lives on. Total and pure.
pub trait PartitionResolver<R: Lineage>: Send + Sync {
    /// Partition key for the record's object.
    fn resolve(&self, record: &R) -> PartitionKey;
}

/// Synchronous write barrier into the log.
pub trait SyncBridge: Send + Sync {
    /// Block until every write issued before the token has landed.
    fn sync(&self, key: &PartitionKey, token: &SyncToken) -> Result<(), BridgeError>;
}

/// Write path into the log for reconciling merges.
pub trait LogBridge<R: Lineage>: SyncBridge {
    /// Persist a reconciling merge without re-running validation.
    ///
    /// Fire-and-forget: implementations must not block the caller on log
    /// I/O, and callers treat failure as advisory.
    fn merge_unchecked(&self, key: &PartitionKey, record: R) -> Result<(), BridgeError>;
}
