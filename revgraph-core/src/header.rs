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

//! Revision headers
//!
//! A header names one revision of one logical object and declares its place
//! in the object's version lineage: the single prior revision it descends
//! from, plus any additional parents when the revision was itself produced
//! by a merge.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Header of a single data message on the commit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionHeader {
    /// Logical object this revision belongs to.
    pub object_id: Uuid,
    /// Identity of this revision; globally unique.
    pub version: Uuid,
    /// The single declared parent revision, if any.
    pub previous: Option<Uuid>,
    /// Additional parent revisions when this revision is a merge result.
    pub merges: BTreeSet<Uuid>,
    /// Logical type tag of the payload.
    pub payload_kind: String,
    /// Whether write rights are inherited from the object's parent.
    pub inherit_write: bool,
    /// Role keys granted direct write access on this object.
    pub allow_write: Vec<String>,
}

impl RevisionHeader {
    /// Create a header for a fresh revision with no merge parents.
    pub fn new(
        object_id: Uuid,
        version: Uuid,
        previous: Option<Uuid>,
        payload_kind: impl Into<String>,
    ) -> Self {
        Self {
            object_id,
            version,
            previous,
            merges: BTreeSet::new(),
            payload_kind: payload_kind.into(),
            inherit_write: true,
            allow_write: Vec::new(),
        }
    }

    /// Add a merge parent declaration.
    pub fn with_merge(mut self, parent: Uuid) -> Self {
        self.merges.insert(parent);
        self
    }
}

/// Render a version id as a short lowercase-hex tag for log lines.
pub fn short_version(version: Uuid) -> String {
    let mut hex = version.simple().to_string();
    hex.truncate(14);
    hex
}
