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

//! CPU/GPU synchronization counters.
//!
//! A fence is a monotonically increasing `u64` the GPU signals when prior
//! submitted work completes. The completed value can never exceed the last
//! signaled value. Completion checks go through a cached completed value so
//! the per-frame hot path only pays a driver query when the cache is
//! insufficient.

use crate::rhi::device::RhiDevice;
use crate::rhi::error::RhiError;
use crate::rhi::handle::FenceId;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonic GPU fence with a cached completed value.
#[derive(Debug)]
pub struct Fence {
    id: FenceId,
    last_signaled: AtomicU64,
    last_completed: AtomicU64,
}

impl Fence {
    /// Creates a backend fence starting at value 0.
    pub fn new(device: &dyn RhiDevice) -> Result<Self, RhiError> {
        let id = device.create_fence()?;
        Ok(Self {
            id,
            last_signaled: AtomicU64::new(0),
            last_completed: AtomicU64::new(0),
        })
    }

    /// The backend handle of the fence.
    pub fn id(&self) -> FenceId {
        self.id
    }

    /// The highest value the queue has asked the GPU to signal.
    pub fn last_signaled(&self) -> u64 {
        self.last_signaled.load(Ordering::Acquire)
    }

    /// The highest completed value this fence has observed so far. May lag
    /// the GPU; use [`refresh`](`Self::refresh`) for a current reading.
    pub fn cached_completed(&self) -> u64 {
        self.last_completed.load(Ordering::Acquire)
    }

    pub(crate) fn note_signaled(&self, value: u64) {
        self.last_signaled.fetch_max(value, Ordering::AcqRel);
    }

    /// Queries the GPU-reported completed value and updates the cache.
    pub fn refresh(&self, device: &dyn RhiDevice) -> u64 {
        let completed = device.fence_completed_value(self.id);
        self.last_completed.fetch_max(completed, Ordering::AcqRel);
        self.cached_completed()
    }

    /// Non-blocking completion check.
    ///
    /// Answers from the cache when possible; only touches the device when
    /// the cached value is not yet sufficient.
    pub fn is_complete(&self, device: &dyn RhiDevice, value: u64) -> bool {
        if self.cached_completed() >= value {
            return true;
        }
        self.refresh(device) >= value
    }

    /// Blocks the calling thread until the fence reaches `value`.
    ///
    /// After this returns, `cached_completed() >= value` holds. The wait is
    /// unbounded; a hung device hangs the render thread.
    pub fn wait(&self, device: &dyn RhiDevice, value: u64) {
        if self.is_complete(device, value) {
            return;
        }
        device.wait_fence(self.id, value);
        self.last_completed.fetch_max(value, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signaled_tracking_is_monotonic() {
        let fence = Fence {
            id: FenceId(1),
            last_signaled: AtomicU64::new(0),
            last_completed: AtomicU64::new(0),
        };
        fence.note_signaled(3);
        fence.note_signaled(2);
        assert_eq!(fence.last_signaled(), 3);
        // Completed never exceeds signaled from the fence's own bookkeeping.
        assert!(fence.cached_completed() <= fence.last_signaled());
    }
}
