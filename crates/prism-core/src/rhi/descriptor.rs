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

//! Descriptor heaps and slot allocation.
//!
//! A descriptor heap is a fixed pool of view slots of one kind. The heap
//! hands out non-overlapping slot ranges and computes the CPU (and, for
//! shader-visible heaps, GPU) address of each slot from the backend-reported
//! base address and handle increment size. There is no generation checking:
//! freeing a slot twice is a caller bug, not a detected condition.

use crate::rhi::device::RhiDevice;
use crate::rhi::error::ResourceError;
use crate::rhi::handle::{CpuDescriptor, DescriptorHeapId, GpuDescriptor};
use std::sync::Arc;

/// The kind of views a descriptor heap stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorHeapKind {
    /// Render-target views.
    Rtv,
    /// Depth-stencil views.
    Dsv,
    /// Shader-resource, constant-buffer and unordered-access views.
    CbvSrvUav,
}

/// Creation parameters of a descriptor heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorHeapDesc {
    /// The view kind the heap stores.
    pub kind: DescriptorHeapKind,
    /// Number of slots.
    pub capacity: u32,
    /// Whether shaders can read the heap (required for descriptor tables).
    pub shader_visible: bool,
}

/// What the backend reports about a created heap.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorHeapInfo {
    /// Backend handle of the heap.
    pub id: DescriptorHeapId,
    /// CPU address of slot 0.
    pub base_cpu: CpuDescriptor,
    /// GPU address of slot 0, present only for shader-visible heaps.
    pub base_gpu: Option<GpuDescriptor>,
    /// Byte distance between consecutive slots.
    pub increment: u32,
}

/// A reserved range of slots in a descriptor heap.
///
/// Exclusively held by the requester until freed; commonly scoped either to
/// a view's lifetime or to a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorAllocation {
    /// The heap the range belongs to.
    pub heap: DescriptorHeapId,
    /// Index of the first slot.
    pub index: u32,
    /// Number of consecutive slots.
    pub count: u32,
    /// CPU address of the first slot.
    pub cpu: CpuDescriptor,
    /// GPU address of the first slot, for shader-visible heaps.
    pub gpu: Option<GpuDescriptor>,
}

impl DescriptorAllocation {
    /// Returns the CPU address of the `i`-th slot of the range.
    pub fn cpu_at(&self, i: u32, increment: u32) -> CpuDescriptor {
        debug_assert!(i < self.count);
        self.cpu.offset(i, increment)
    }
}

/// Free-list bookkeeping over a fixed number of slots.
///
/// Single slots are recycled through the free list; ranges are carved from
/// the untouched tail so they stay contiguous.
#[derive(Debug)]
pub(crate) struct SlotPool {
    capacity: u32,
    next: u32,
    free: Vec<u32>,
}

impl SlotPool {
    pub(crate) fn new(capacity: u32) -> Self {
        Self {
            capacity,
            next: 0,
            free: Vec::new(),
        }
    }

    pub(crate) fn allocate(&mut self) -> Option<u32> {
        if let Some(slot) = self.free.pop() {
            return Some(slot);
        }
        if self.next < self.capacity {
            self.next += 1;
            Some(self.next - 1)
        } else {
            None
        }
    }

    pub(crate) fn allocate_range(&mut self, count: u32) -> Option<u32> {
        if self.next + count <= self.capacity {
            let base = self.next;
            self.next += count;
            return Some(base);
        }
        // Tail exhausted: look for a contiguous run among freed slots.
        self.free.sort_unstable();
        let mut run_start = 0usize;
        for i in 0..self.free.len() {
            if i > run_start && self.free[i] != self.free[i - 1] + 1 {
                run_start = i;
            }
            if (i - run_start + 1) as u32 == count {
                let base = self.free[run_start];
                self.free.drain(run_start..=i);
                return Some(base);
            }
        }
        None
    }

    pub(crate) fn free(&mut self, index: u32) {
        self.free.push(index);
    }

    pub(crate) fn free_range(&mut self, base: u32, count: u32) {
        for i in 0..count {
            self.free.push(base + i);
        }
    }

    /// Number of slots currently handed out.
    pub(crate) fn live(&self) -> u32 {
        self.next - self.free.len() as u32
    }
}

/// A descriptor heap of one view kind with free-list slot allocation.
#[derive(Debug)]
pub struct DescriptorHeap {
    device: Arc<dyn RhiDevice>,
    kind: DescriptorHeapKind,
    capacity: u32,
    info: DescriptorHeapInfo,
    pool: SlotPool,
}

impl DescriptorHeap {
    /// Creates a heap of `capacity` slots on the device.
    pub fn new(
        device: Arc<dyn RhiDevice>,
        kind: DescriptorHeapKind,
        capacity: u32,
        shader_visible: bool,
    ) -> Result<Self, ResourceError> {
        let info = device.create_descriptor_heap(&DescriptorHeapDesc {
            kind,
            capacity,
            shader_visible,
        })?;
        log::debug!(
            "Created {kind:?} descriptor heap: {capacity} slots, increment {}",
            info.increment
        );
        Ok(Self {
            device,
            kind,
            capacity,
            info,
            pool: SlotPool::new(capacity),
        })
    }

    /// The view kind the heap stores.
    pub fn kind(&self) -> DescriptorHeapKind {
        self.kind
    }

    /// The heap's fixed slot count.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The backend handle of the heap.
    pub fn id(&self) -> DescriptorHeapId {
        self.info.id
    }

    /// The byte distance between consecutive slots.
    pub fn increment(&self) -> u32 {
        self.info.increment
    }

    /// Number of slots currently handed out.
    pub fn live(&self) -> u32 {
        self.pool.live()
    }

    /// Reserves a single slot.
    pub fn allocate(&mut self) -> Result<DescriptorAllocation, ResourceError> {
        self.allocate_range(1)
    }

    /// Reserves `count` consecutive slots.
    pub fn allocate_range(&mut self, count: u32) -> Result<DescriptorAllocation, ResourceError> {
        let index = if count == 1 {
            self.pool.allocate()
        } else {
            self.pool.allocate_range(count)
        }
        .ok_or(ResourceError::OutOfDescriptors {
            kind: self.kind,
            capacity: self.capacity,
        })?;

        Ok(DescriptorAllocation {
            heap: self.info.id,
            index,
            count,
            cpu: self.info.base_cpu.offset(index, self.info.increment),
            gpu: self
                .info
                .base_gpu
                .map(|base| base.offset(index, self.info.increment)),
        })
    }

    /// Returns a range to the pool.
    ///
    /// Freeing an allocation that belongs to a different heap is a contract
    /// violation.
    pub fn free(&mut self, allocation: DescriptorAllocation) {
        if allocation.heap != self.info.id {
            log::error!(
                "Descriptor allocation freed into the wrong heap (slot {} of heap {:?})",
                allocation.index,
                allocation.heap
            );
            panic!("descriptor allocation freed into the wrong heap");
        }
        if allocation.count == 1 {
            self.pool.free(allocation.index);
        } else {
            self.pool.free_range(allocation.index, allocation.count);
        }
    }
}

impl Drop for DescriptorHeap {
    fn drop(&mut self) {
        self.device.destroy_descriptor_heap(self.info.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_never_overlap() {
        let mut pool = SlotPool::new(8);
        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        let range = pool.allocate_range(3).unwrap();
        assert_ne!(a, b);
        assert!(range != a && range != b);
        // Range occupies [range, range + 3); singles must not fall inside.
        assert!(!(a >= range && a < range + 3));
        assert!(!(b >= range && b < range + 3));
    }

    #[test]
    fn free_returns_pool_to_previous_size() {
        let mut pool = SlotPool::new(4);
        let before = pool.live();
        let slot = pool.allocate().unwrap();
        assert_eq!(pool.live(), before + 1);
        pool.free(slot);
        assert_eq!(pool.live(), before);
    }

    #[test]
    fn freed_slot_is_recycled() {
        let mut pool = SlotPool::new(2);
        let a = pool.allocate().unwrap();
        pool.free(a);
        let b = pool.allocate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn exhaustion_reports_none() {
        let mut pool = SlotPool::new(1);
        assert!(pool.allocate().is_some());
        assert!(pool.allocate().is_none());
        assert!(pool.allocate_range(2).is_none());
    }

    #[test]
    fn ranges_reuse_freed_contiguous_runs() {
        let mut pool = SlotPool::new(8);
        let base = pool.allocate_range(8).unwrap();
        assert_eq!(base, 0);
        // Tail is exhausted; a freed run must satisfy the next range.
        assert!(pool.allocate_range(4).is_none());
        pool.free_range(2, 4);
        assert_eq!(pool.allocate_range(4), Some(2));
        assert_eq!(pool.live(), 8);
    }
}
