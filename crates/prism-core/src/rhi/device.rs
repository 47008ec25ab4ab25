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

//! The backend seam of the RHI.
//!
//! [`RhiDevice`] is the single trait a graphics backend implements. The
//! generic code above it (queues, command lists, descriptor heaps, the
//! resource context and the scheduler) holds opaque ids and only ever calls
//! these methods; it never downcasts to a concrete backend type. One
//! backend is compiled per build; the reference implementation lives in
//! `prism-infra`.

use crate::pipeline::{GraphicsPipelineDesc, RootSignatureDesc};
use crate::rhi::descriptor::{DescriptorHeapDesc, DescriptorHeapInfo};
use crate::rhi::error::{PipelineError, ResourceError, RhiError};
use crate::rhi::handle::{
    CommandAllocatorId, CommandListId, CpuDescriptor, DescriptorHeapId, FenceId, GpuDescriptor,
    GpuVirtualAddress, PipelineId, QueueKind, ResourceId, RootSignatureId,
};
use crate::rhi::resource::{
    IndexBufferBinding, ResourceDesc, TextureCopyRegion, VertexBufferBinding,
};
use crate::rhi::types::{ResourceState, ScissorRect, Viewport};
use crate::rhi::view::{
    ConstantBufferViewDesc, DepthStencilViewDesc, RenderTargetViewDesc, ShaderResourceViewDesc,
    UnorderedAccessViewDesc,
};
use crate::rhi::DescriptorHeapKind;
use crate::shader::ShaderBytecode;
use std::fmt::Debug;

/// What the backend reports about a freshly committed resource.
#[derive(Debug, Clone, Copy)]
pub struct CreatedResource {
    /// Handle of the allocation.
    pub id: ResourceId,
    /// GPU virtual address of the allocation.
    pub gpu_address: GpuVirtualAddress,
}

/// The abstract graphics device.
///
/// Recording methods (`cmd_*`) are thin, ordered forwards into the backend's
/// native command buffer; no validation is performed here beyond what the
/// backend itself enforces. Resource-state bookkeeping lives one level up in
/// [`CommandList`](`crate::rhi::CommandList`).
pub trait RhiDevice: Send + Sync + Debug + 'static {
    /// A human-readable adapter name for logs.
    fn adapter_name(&self) -> &str;

    // ----------------------------------------------------------------- //
    // Resources and views
    // ----------------------------------------------------------------- //

    /// Allocates GPU memory for the given description.
    fn create_committed_resource(
        &self,
        desc: &ResourceDesc,
        debug_name: &str,
    ) -> Result<CreatedResource, ResourceError>;

    /// Releases a GPU allocation.
    fn destroy_resource(&self, id: ResourceId);

    /// Writes bytes into an upload-heap buffer at `offset`.
    fn write_buffer(&self, id: ResourceId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Creates a descriptor heap and reports its addressing parameters.
    fn create_descriptor_heap(
        &self,
        desc: &DescriptorHeapDesc,
    ) -> Result<DescriptorHeapInfo, ResourceError>;

    /// Releases a descriptor heap.
    fn destroy_descriptor_heap(&self, id: DescriptorHeapId);

    /// Writes a render-target view into the descriptor slot at `dst`.
    fn create_render_target_view(
        &self,
        resource: ResourceId,
        dst: CpuDescriptor,
        desc: &RenderTargetViewDesc,
    ) -> Result<(), ResourceError>;

    /// Writes a depth-stencil view into the descriptor slot at `dst`.
    fn create_depth_stencil_view(
        &self,
        resource: ResourceId,
        dst: CpuDescriptor,
        desc: &DepthStencilViewDesc,
    ) -> Result<(), ResourceError>;

    /// Writes a shader-resource view into the descriptor slot at `dst`.
    fn create_shader_resource_view(
        &self,
        resource: ResourceId,
        dst: CpuDescriptor,
        desc: &ShaderResourceViewDesc,
    ) -> Result<(), ResourceError>;

    /// Writes a constant-buffer view into the descriptor slot at `dst`.
    fn create_constant_buffer_view(
        &self,
        resource: ResourceId,
        dst: CpuDescriptor,
        desc: &ConstantBufferViewDesc,
    ) -> Result<(), ResourceError>;

    /// Writes an unordered-access view into the descriptor slot at `dst`.
    fn create_unordered_access_view(
        &self,
        resource: ResourceId,
        dst: CpuDescriptor,
        desc: &UnorderedAccessViewDesc,
    ) -> Result<(), ResourceError>;

    /// Copies `count` descriptors between heaps of the same kind, typically
    /// from a CPU staging heap into a shader-visible one.
    fn copy_descriptors(
        &self,
        kind: DescriptorHeapKind,
        dst: CpuDescriptor,
        src: CpuDescriptor,
        count: u32,
    );

    // ----------------------------------------------------------------- //
    // Pipeline objects
    // ----------------------------------------------------------------- //

    /// Compiles a root signature (binding layout).
    fn create_root_signature(
        &self,
        desc: &RootSignatureDesc,
    ) -> Result<RootSignatureId, PipelineError>;

    /// Releases a root signature.
    fn destroy_root_signature(&self, id: RootSignatureId);

    /// Compiles a graphics pipeline state object from a description and the
    /// shader bytecode it references.
    fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDesc,
        vertex_shader: &ShaderBytecode,
        pixel_shader: Option<&ShaderBytecode>,
    ) -> Result<PipelineId, PipelineError>;

    /// Releases a pipeline state object.
    fn destroy_pipeline(&self, id: PipelineId);

    // ----------------------------------------------------------------- //
    // Command recording
    // ----------------------------------------------------------------- //

    /// Creates the backing store for a command list.
    fn create_command_allocator(&self, queue: QueueKind) -> Result<CommandAllocatorId, RhiError>;

    /// Recycles an allocator's backing memory. The caller guarantees no
    /// commands recorded against it are still executing.
    fn reset_command_allocator(&self, id: CommandAllocatorId);

    /// Creates a command list in the recording state.
    fn create_command_list(
        &self,
        allocator: CommandAllocatorId,
        queue: QueueKind,
    ) -> Result<CommandListId, RhiError>;

    /// Reopens a closed list for recording against a (retired) allocator.
    fn reset_command_list(&self, list: CommandListId, allocator: CommandAllocatorId);

    /// Closes a list, making it submittable.
    fn close_command_list(&self, list: CommandListId);

    /// Sets the rasterizer viewport.
    fn cmd_set_viewport(&self, list: CommandListId, viewport: &Viewport);

    /// Sets the scissor rectangle.
    fn cmd_set_scissor(&self, list: CommandListId, scissor: &ScissorRect);

    /// Binds a compiled pipeline state object.
    fn cmd_set_pipeline(&self, list: CommandListId, pipeline: PipelineId);

    /// Binds the root signature for subsequent root-parameter calls.
    fn cmd_set_graphics_root_signature(&self, list: CommandListId, root_signature: RootSignatureId);

    /// Binds a vertex buffer to an input slot.
    fn cmd_set_vertex_buffer(&self, list: CommandListId, slot: u32, binding: &VertexBufferBinding);

    /// Binds the index buffer.
    fn cmd_set_index_buffer(&self, list: CommandListId, binding: &IndexBufferBinding);

    /// Binds the descriptor heap shaders read tables from.
    fn cmd_set_descriptor_heap(&self, list: CommandListId, heap: DescriptorHeapId);

    /// Binds render targets and an optional depth target by descriptor.
    fn cmd_set_render_targets(
        &self,
        list: CommandListId,
        colors: &[CpuDescriptor],
        depth: Option<CpuDescriptor>,
    );

    /// Writes 32-bit root constants at a root-parameter index.
    fn cmd_set_root_constants(
        &self,
        list: CommandListId,
        parameter: u32,
        dest_offset: u32,
        data: &[u32],
    );

    /// Binds a constant buffer address to a root parameter.
    fn cmd_set_root_constant_buffer(
        &self,
        list: CommandListId,
        parameter: u32,
        address: GpuVirtualAddress,
    );

    /// Binds a descriptor-table base address to a root parameter.
    fn cmd_set_root_descriptor_table(&self, list: CommandListId, parameter: u32, base: GpuDescriptor);

    /// Clears a render-target view to a color.
    fn cmd_clear_render_target(&self, list: CommandListId, view: CpuDescriptor, color: [f32; 4]);

    /// Clears a depth-stencil view.
    fn cmd_clear_depth_stencil(&self, list: CommandListId, view: CpuDescriptor, depth: f32, stencil: u8);

    /// Copies a byte range between buffers.
    fn cmd_copy_buffer_region(
        &self,
        list: CommandListId,
        src: ResourceId,
        src_offset: u64,
        dst: ResourceId,
        dst_offset: u64,
        size: u64,
    );

    /// Copies a texel region between textures.
    fn cmd_copy_texture_region(
        &self,
        list: CommandListId,
        src: ResourceId,
        dst: ResourceId,
        region: &TextureCopyRegion,
    );

    /// Records a state-transition barrier.
    fn cmd_transition_barrier(
        &self,
        list: CommandListId,
        resource: ResourceId,
        before: ResourceState,
        after: ResourceState,
    );

    /// Records a non-indexed draw.
    fn cmd_draw_instanced(
        &self,
        list: CommandListId,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );

    /// Records an indexed draw.
    fn cmd_draw_indexed_instanced(
        &self,
        list: CommandListId,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    );

    /// Opens a named marker region for GPU profilers and debuggers.
    fn cmd_begin_marker(&self, list: CommandListId, label: &str);

    /// Closes the innermost marker region.
    fn cmd_end_marker(&self, list: CommandListId);

    // ----------------------------------------------------------------- //
    // Submission and synchronization
    // ----------------------------------------------------------------- //

    /// Submits a closed list to a queue for execution.
    fn submit(&self, queue: QueueKind, list: CommandListId);

    /// Creates a fence starting at value 0.
    fn create_fence(&self) -> Result<FenceId, RhiError>;

    /// Instructs the queue to signal `value` on the fence once all prior
    /// submitted work has completed.
    fn signal_fence(&self, queue: QueueKind, fence: FenceId, value: u64);

    /// Queries the GPU-reported completed value of a fence.
    fn fence_completed_value(&self, fence: FenceId) -> u64;

    /// Blocks the calling thread until the fence reaches `value`.
    ///
    /// There is no timeout: a hung device hangs the caller. Accepted.
    fn wait_fence(&self, fence: FenceId, value: u64);
}
