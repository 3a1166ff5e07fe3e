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

//! Session-scoped sync coordination
//!
//! Writers enqueue a barrier token per partition they touched; `finish`
//! drains the queue through the log bridge so every in-flight write has
//! landed before the session crosses a boundary. One coordinator lives
//! per session and dies with it.

use crate::error::BridgeError;
use crate::traits::SyncBridge;
use crossbeam::queue::SegQueue;
use revgraph_core::{PartitionKey, SyncToken};
use std::sync::Arc;
use tracing::warn;

/// Session lifecycle transitions observed by the owning runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session's token was replaced or re-scoped.
    TokenChanged,
    /// The session ended.
    Closed,
}

/// Queues pending write barriers for one session.
///
/// `add` may be called from any number of writer threads; the queue is
/// lock-free. `finish` is safe to call concurrently with `add`: tokens
/// enqueued during a drain are either flushed by it or left for the next.
pub struct SyncCoordinator {
    bridge: Arc<dyn SyncBridge>,
    pending: SegQueue<(PartitionKey, SyncToken)>,
}

impl SyncCoordinator {
    /// Create a coordinator draining into the given bridge.
    pub fn new(bridge: Arc<dyn SyncBridge>) -> Self {
        Self {
            bridge,
            pending: SegQueue::new(),
        }
    }

    /// Enqueue a barrier for the partition.
    pub fn add(&self, key: PartitionKey, token: SyncToken) {
        self.pending.push((key, token));
    }

    /// Number of barriers still queued.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drain the queue, forwarding each barrier to the log in FIFO order.
    pub fn finish(&self) -> Result<(), BridgeError> {
        while let Some((key, token)) = self.pending.pop() {
            self.bridge.sync(&key, &token)?;
        }
        Ok(())
    }

    /// Flush opportunistically on a session boundary. Lifecycle callbacks
    /// have no caller to fail, so errors are logged and swallowed.
    pub fn on_session_event(&self, event: SessionEvent) {
        if let Err(err) = self.finish() {
            warn!(?event, error = %err, "session sync flush failed");
        }
    }
}
