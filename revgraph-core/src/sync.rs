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

//! Write barrier tokens

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token flushed through the log to confirm that earlier writes landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncToken {
    /// Caller-chosen ticket identifying the barrier.
    pub ticket: u64,
    /// Random discriminator so tickets never collide across sessions.
    pub nonce: u64,
}

impl SyncToken {
    /// Create a token with a random identity.
    pub fn fresh() -> Self {
        let bits = Uuid::new_v4().as_u128();
        Self {
            ticket: (bits >> 64) as u64,
            nonce: bits as u64,
        }
    }
}
