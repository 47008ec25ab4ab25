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

//! The render hardware interface: the backend-agnostic resource and command
//! abstraction.
//!
//! This module defines the "common language" of the renderer (handles,
//! descriptions, state enums and error types) plus the generic machinery
//! built on top of the [`RhiDevice`] seam: fences, command queues, command
//! lists, allocator pools and descriptor heaps. Concrete backends live in
//! `prism-infra` and implement [`RhiDevice`]; nothing here downcasts to a
//! backend type.

pub mod command_allocator;
pub mod command_list;
pub mod command_queue;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod fence;
pub mod flags;
pub mod format;
pub mod handle;
pub mod resource;
pub mod types;
pub mod view;

pub use self::command_allocator::CommandAllocatorPool;
pub use self::command_list::{CommandList, RecordState};
pub use self::command_queue::CommandQueue;
pub use self::descriptor::{
    DescriptorAllocation, DescriptorHeap, DescriptorHeapDesc, DescriptorHeapInfo,
    DescriptorHeapKind,
};
pub use self::device::{CreatedResource, RhiDevice};
pub use self::error::{PipelineError, ResourceError, RhiError, ShaderError};
pub use self::fence::Fence;
pub use self::format::Format;
pub use self::handle::{
    CommandAllocatorId, CommandListId, CpuDescriptor, DescriptorHeapId, FenceId, GpuDescriptor,
    GpuVirtualAddress, PipelineId, QueueKind, ResourceId, RootSignatureId,
};
pub use self::resource::{
    BufferDesc, IndexBufferBinding, ResourceDesc, ResourceUsage, RhiResource, TextureCopyRegion,
    TextureDesc, VertexBufferBinding,
};
pub use self::types::{
    ClearValue, Color, Extent2D, HeapType, IndexFormat, PrimitiveTopology, ResourceState,
    SampleCount, ScissorRect, Viewport,
};
pub use self::view::{
    ConstantBufferViewDesc, DepthStencilViewDesc, RenderTargetViewDesc, ResourceViewDesc,
    RhiResourceView, ShaderResourceViewDesc, UnorderedAccessViewDesc, ViewKind,
};
