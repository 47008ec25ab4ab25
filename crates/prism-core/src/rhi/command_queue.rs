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

//! FIFO submission point with fence-based completion tracking.

use crate::rhi::command_list::CommandList;
use crate::rhi::device::RhiDevice;
use crate::rhi::error::RhiError;
use crate::rhi::fence::Fence;
use crate::rhi::handle::QueueKind;
use std::sync::Arc;

/// A hardware queue plus the single fence it signals.
///
/// Every [`execute`](`Self::execute`) or [`flush`](`Self::flush`) signals a
/// strictly increasing fence value; commands across different queues have no
/// ordering except where a fence wait is inserted explicitly.
#[derive(Debug)]
pub struct CommandQueue {
    device: Arc<dyn RhiDevice>,
    kind: QueueKind,
    fence: Fence,
    last_signaled: u64,
}

impl CommandQueue {
    /// Creates a queue of the given kind with a fresh fence.
    pub fn new(device: Arc<dyn RhiDevice>, kind: QueueKind) -> Result<Self, RhiError> {
        let fence = Fence::new(device.as_ref())?;
        Ok(Self {
            device,
            kind,
            fence,
            last_signaled: 0,
        })
    }

    /// The kind of the queue.
    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// The queue's fence.
    pub fn fence(&self) -> &Fence {
        &self.fence
    }

    /// The last fence value this queue signaled.
    pub fn last_signaled(&self) -> u64 {
        self.last_signaled
    }

    /// Closes `list` if still recording, submits it, signals a new fence
    /// value and returns it.
    pub fn execute(&mut self, list: &mut CommandList) -> u64 {
        if list.queue_kind() != self.kind {
            log::error!(
                "A {:?} command list was submitted to the {:?} queue",
                list.queue_kind(),
                self.kind
            );
            panic!("command list submitted to a queue of the wrong kind");
        }
        if list.is_recording() {
            list.close();
        }
        self.device.submit(self.kind, list.id());
        self.signal()
    }

    /// Signals the next fence value without submitting work.
    pub fn signal(&mut self) -> u64 {
        self.last_signaled += 1;
        self.device
            .signal_fence(self.kind, self.fence.id(), self.last_signaled);
        self.fence.note_signaled(self.last_signaled);
        self.last_signaled
    }

    /// Non-blocking check whether the GPU has reached `value`. Served from
    /// the fence's cache when possible.
    pub fn is_fence_complete(&self, value: u64) -> bool {
        self.fence.is_complete(self.device.as_ref(), value)
    }

    /// The GPU-reported completed value, freshly queried.
    pub fn completed_value(&self) -> u64 {
        self.fence.refresh(self.device.as_ref())
    }

    /// Blocks the calling thread until the GPU has reached `value`.
    pub fn stall_for_fence(&self, value: u64) {
        if value == 0 {
            return;
        }
        self.fence.wait(self.device.as_ref(), value);
    }

    /// Signals a value and immediately stalls on it, draining the queue.
    pub fn flush(&mut self) {
        let value = self.signal();
        self.stall_for_fence(value);
        log::trace!("{:?} queue drained at fence {value}", self.kind);
    }
}
