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

//! Per-frame bookkeeping: the frame snapshot handed to passes and the
//! fence-value rotation that bounds CPU run-ahead.

use crate::rhi::command_queue::CommandQueue;
use crate::rhi::types::{Extent2D, ScissorRect, Viewport};

/// Immutable facts about the frame being recorded.
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    /// Monotonic frame counter.
    pub index: u64,
    /// Index of the swap-chain buffer this frame renders into.
    pub back_buffer_index: u32,
    /// Number of swap-chain buffers in rotation.
    pub buffer_count: u32,
    /// Output resolution of the frame.
    pub extent: Extent2D,
    /// Full-extent viewport.
    pub viewport: Viewport,
    /// Full-extent scissor rectangle.
    pub scissor: ScissorRect,
}

impl FrameInfo {
    /// Builds the snapshot with viewport and scissor derived from `extent`.
    pub fn new(index: u64, back_buffer_index: u32, buffer_count: u32, extent: Extent2D) -> Self {
        Self {
            index,
            back_buffer_index,
            buffer_count,
            extent,
            viewport: Viewport::from_extent(extent),
            scissor: ScissorRect::from_extent(extent),
        }
    }
}

/// Bounds how far the CPU can run ahead of the GPU.
///
/// One fence value is remembered per back buffer: the value signaled when
/// that buffer was last presented. Before reusing a buffer's backing
/// resources the CPU stalls on its remembered value, so the CPU can be at
/// most `buffer_count` frames ahead.
#[derive(Debug)]
pub struct FrameSync {
    values: Vec<u64>,
    slot: usize,
}

impl FrameSync {
    /// Creates the rotation for `buffer_count` back buffers.
    pub fn new(buffer_count: u32) -> Self {
        Self {
            values: vec![0; buffer_count.max(1) as usize],
            slot: 0,
        }
    }

    /// The back-buffer slot the next frame renders into.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// The fence value the current slot must reach before reuse; 0 when the
    /// slot has never been presented.
    pub fn pending_value(&self) -> u64 {
        self.values[self.slot]
    }

    /// Stalls until the GPU is done with the current slot's previous use.
    pub fn begin_frame(&self, queue: &CommandQueue) {
        let pending = self.pending_value();
        if pending > 0 && !queue.is_fence_complete(pending) {
            log::trace!("CPU ahead of GPU, stalling on fence {pending}");
            queue.stall_for_fence(pending);
        }
    }

    /// Records the fence value signaled for this slot's submission and
    /// advances to the next slot.
    pub fn end_frame(&mut self, signaled_value: u64) {
        self.values[self.slot] = signaled_value;
        self.slot = (self.slot + 1) % self.values.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_remembers_per_slot_values() {
        let mut sync = FrameSync::new(3);
        assert_eq!(sync.pending_value(), 0);

        sync.end_frame(1);
        sync.end_frame(2);
        sync.end_frame(3);
        // Back at slot 0, which must wait for fence 1 before reuse.
        assert_eq!(sync.slot(), 0);
        assert_eq!(sync.pending_value(), 1);

        sync.end_frame(4);
        assert_eq!(sync.pending_value(), 2);
    }

    #[test]
    fn frame_info_derives_viewport() {
        let frame = FrameInfo::new(7, 1, 3, Extent2D::new(1280, 720));
        assert_eq!(frame.viewport.width, 1280.0);
        assert_eq!(frame.scissor.bottom, 720);
        assert_eq!(frame.back_buffer_index, 1);
    }
}
