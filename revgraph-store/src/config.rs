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

//! Store configuration

/// Tuning switches for the merge driver.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Write a reconciling merge back to the log when the frontier has
    /// diverged and the caller holds write rights.
    pub reconcile_write_back: bool,
    /// Ask the serializer for deep deserialization when materializing
    /// merge inputs.
    pub deep_deserialize: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            reconcile_write_back: true,
            deep_deserialize: true,
        }
    }
}
