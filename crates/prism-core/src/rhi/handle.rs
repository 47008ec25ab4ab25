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

//! Opaque handles and addresses handed across the backend seam.
//!
//! The generic code never sees backend objects; it holds these ids and calls
//! [`RhiDevice`](`crate::rhi::RhiDevice`) methods with them.

/// An opaque handle to a GPU memory allocation (buffer or texture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u64);

/// An opaque handle to a descriptor heap owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHeapId(pub u64);

/// An opaque handle to a command allocator (the backing store of a list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandAllocatorId(pub u64);

/// An opaque handle to a backend command list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandListId(pub u64);

/// An opaque handle to a backend fence object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FenceId(pub u64);

/// An opaque handle to a compiled root signature (binding layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootSignatureId(pub u64);

/// An opaque handle to a compiled graphics pipeline state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(pub u64);

/// The GPU virtual address of a resource, as consumed by root bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuVirtualAddress(pub u64);

impl GpuVirtualAddress {
    /// Returns the address advanced by `bytes`.
    pub const fn offset(self, bytes: u64) -> Self {
        Self(self.0 + bytes)
    }
}

/// The CPU-side address of a descriptor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuDescriptor(pub u64);

impl CpuDescriptor {
    /// Returns the address of the slot `index` steps further into the heap.
    pub const fn offset(self, index: u32, increment: u32) -> Self {
        Self(self.0 + index as u64 * increment as u64)
    }
}

/// The GPU-side address of a descriptor slot in a shader-visible heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuDescriptor(pub u64);

impl GpuDescriptor {
    /// Returns the address of the slot `index` steps further into the heap.
    pub const fn offset(self, index: u32, increment: u32) -> Self {
        Self(self.0 + index as u64 * increment as u64)
    }
}

/// The kind of hardware queue a command list is recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Full graphics capability (draws, dispatches, copies).
    Graphics,
    /// Compute dispatches and copies only.
    Compute,
    /// Copy operations only.
    Copy,
}
