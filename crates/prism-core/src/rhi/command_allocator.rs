// Copyright 2026 the Prism authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fence-gated recycling of command allocators.
//!
//! An allocator is the backing store of a command list's recorded commands
//! and must not be reset while those commands are still executing on the
//! GPU. The pool tags each allocator with the fence value of its last
//! submission and only hands it out again once the queue reports that value
//! completed.

use crate::rhi::device::RhiDevice;
use crate::rhi::error::RhiError;
use crate::rhi::handle::{CommandAllocatorId, QueueKind};
use std::sync::Arc;

#[derive(Debug)]
struct PooledAllocator {
    id: CommandAllocatorId,
    /// Fence value of the last submission recorded from this allocator;
    /// 0 means never submitted.
    retired_at: u64,
}

/// A pool of command allocators keyed by fence completion.
#[derive(Debug)]
pub struct CommandAllocatorPool {
    device: Arc<dyn RhiDevice>,
    queue_kind: QueueKind,
    free: Vec<PooledAllocator>,
    created: usize,
}

impl CommandAllocatorPool {
    /// Creates an empty pool for allocators of `queue_kind` lists.
    pub fn new(device: Arc<dyn RhiDevice>, queue_kind: QueueKind) -> Self {
        Self {
            device,
            queue_kind,
            free: Vec::new(),
            created: 0,
        }
    }

    /// Total allocators ever created by this pool.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Number of allocators currently waiting in the pool.
    pub fn pooled(&self) -> usize {
        self.free.len()
    }

    /// Returns an allocator that is safe to record into.
    ///
    /// `completed` is the queue's confirmed completed fence value. An
    /// allocator is reused (and reset) only if its last submission retired
    /// at or before that value; otherwise a fresh allocator is created.
    pub fn acquire(&mut self, completed: u64) -> Result<CommandAllocatorId, RhiError> {
        if let Some(pos) = self.free.iter().position(|a| a.retired_at <= completed) {
            let entry = self.free.swap_remove(pos);
            self.device.reset_command_allocator(entry.id);
            return Ok(entry.id);
        }
        let id = self.device.create_command_allocator(self.queue_kind)?;
        self.created += 1;
        log::debug!(
            "Command allocator pool grew to {} ({:?} queue)",
            self.created,
            self.queue_kind
        );
        Ok(id)
    }

    /// Hands an allocator back, tagged with the fence value of the
    /// submission that last referenced it.
    pub fn retire(&mut self, id: CommandAllocatorId, fence_value: u64) {
        self.free.push(PooledAllocator {
            id,
            retired_at: fence_value,
        });
    }
}
