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

//! Lineage contract for typed records

use std::collections::BTreeSet;
use uuid::Uuid;

/// Version lineage carried by every typed record.
///
/// The merge driver rewrites these fields when it reconciles a diverged
/// frontier: a true multi-parent merge gets a fresh version id, no single
/// parent, and the full set of leaf versions it collapses.
pub trait Lineage: Clone + Send + Sync + 'static {
    /// Identity of the logical object.
    fn id(&self) -> Uuid;

    /// Identity of the object's parent in the ownership tree, if any.
    fn parent_id(&self) -> Option<Uuid>;

    /// Version id of this record instance.
    fn version(&self) -> Uuid;

    /// Replace the version id.
    fn set_version(&mut self, version: Uuid);

    /// The single declared parent version, if any.
    fn previous(&self) -> Option<Uuid>;

    /// Replace the declared parent version.
    fn set_previous(&mut self, previous: Option<Uuid>);

    /// Additional parent versions when this record is a merge result.
    fn merges(&self) -> &BTreeSet<Uuid>;

    /// Replace the merge parent set.
    fn set_merges(&mut self, merges: BTreeSet<Uuid>);
}
