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

//! The recording surface of the RHI.
//!
//! A command list moves through `Recording → Closed → (submitted) → Reset`.
//! Every method is a thin, ordered forward into the backend; the one piece
//! of bookkeeping kept here is resource-state tracking on
//! [`transition_resource`](`CommandList::transition_resource`), which is the
//! only legal mutator of a resource's tracked state. Requiring `&mut
//! RhiResource` for a transition makes the "one transition owner per
//! resource per frame" rule a borrow-checker fact rather than a convention.

use crate::rhi::device::RhiDevice;
use crate::rhi::error::RhiError;
use crate::rhi::handle::{
    CommandAllocatorId, CommandListId, CpuDescriptor, DescriptorHeapId, GpuDescriptor,
    GpuVirtualAddress, PipelineId, QueueKind, ResourceId, RootSignatureId,
};
use crate::rhi::resource::{
    IndexBufferBinding, RhiResource, TextureCopyRegion, VertexBufferBinding,
};
use crate::rhi::types::{Color, ResourceState, ScissorRect, Viewport};
use std::sync::Arc;

/// The lifecycle state of a command list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Accepting commands.
    Recording,
    /// Closed; ready for submission, not accepting commands.
    Closed,
}

/// A recording buffer of GPU commands.
#[derive(Debug)]
pub struct CommandList {
    device: Arc<dyn RhiDevice>,
    id: CommandListId,
    queue_kind: QueueKind,
    state: RecordState,
}

impl CommandList {
    /// Creates a command list in the recording state, backed by `allocator`.
    pub fn new(
        device: Arc<dyn RhiDevice>,
        allocator: CommandAllocatorId,
        queue_kind: QueueKind,
    ) -> Result<Self, RhiError> {
        let id = device.create_command_list(allocator, queue_kind)?;
        Ok(Self {
            device,
            id,
            queue_kind,
            state: RecordState::Recording,
        })
    }

    /// The backend handle of the list.
    pub fn id(&self) -> CommandListId {
        self.id
    }

    /// The queue kind the list records for.
    pub fn queue_kind(&self) -> QueueKind {
        self.queue_kind
    }

    /// Returns `true` while the list accepts commands.
    pub fn is_recording(&self) -> bool {
        self.state == RecordState::Recording
    }

    fn expect_recording(&self, operation: &str) {
        if self.state != RecordState::Recording {
            log::error!("'{operation}' recorded into a closed command list");
            panic!("command recorded into a closed command list");
        }
    }

    /// Closes the list, making it submittable. Closing twice is a contract
    /// violation.
    pub fn close(&mut self) {
        if self.state == RecordState::Closed {
            log::error!("Command list closed twice");
            panic!("command list closed twice");
        }
        self.device.close_command_list(self.id);
        self.state = RecordState::Closed;
    }

    /// Reopens the closed list for recording against a retired allocator.
    ///
    /// The caller guarantees, via fence comparison, that `allocator` is not
    /// referenced by in-flight GPU work.
    pub fn reset(&mut self, allocator: CommandAllocatorId) {
        if self.state == RecordState::Recording {
            log::error!("Command list reset while still recording");
            panic!("command list reset while still recording");
        }
        self.device.reset_command_list(self.id, allocator);
        self.state = RecordState::Recording;
    }

    /// Sets the rasterizer viewport.
    pub fn set_viewport(&mut self, viewport: &Viewport) {
        self.expect_recording("set_viewport");
        self.device.cmd_set_viewport(self.id, viewport);
    }

    /// Sets the scissor rectangle.
    pub fn set_scissor(&mut self, scissor: &ScissorRect) {
        self.expect_recording("set_scissor");
        self.device.cmd_set_scissor(self.id, scissor);
    }

    /// Binds a pipeline state object.
    pub fn set_pipeline_state(&mut self, pipeline: PipelineId) {
        self.expect_recording("set_pipeline_state");
        self.device.cmd_set_pipeline(self.id, pipeline);
    }

    /// Binds the root signature for subsequent root-parameter calls.
    pub fn set_graphics_root_signature(&mut self, root_signature: RootSignatureId) {
        self.expect_recording("set_graphics_root_signature");
        self.device
            .cmd_set_graphics_root_signature(self.id, root_signature);
    }

    /// Binds a vertex buffer to `slot`.
    pub fn set_vertex_buffer(&mut self, slot: u32, binding: &VertexBufferBinding) {
        self.expect_recording("set_vertex_buffer");
        self.device.cmd_set_vertex_buffer(self.id, slot, binding);
    }

    /// Binds the index buffer.
    pub fn set_index_buffer(&mut self, binding: &IndexBufferBinding) {
        self.expect_recording("set_index_buffer");
        self.device.cmd_set_index_buffer(self.id, binding);
    }

    /// Binds the shader-visible descriptor heap tables are read from.
    pub fn set_descriptor_heap(&mut self, heap: DescriptorHeapId) {
        self.expect_recording("set_descriptor_heap");
        self.device.cmd_set_descriptor_heap(self.id, heap);
    }

    /// Binds render-target and depth descriptors.
    pub fn set_render_targets(&mut self, colors: &[CpuDescriptor], depth: Option<CpuDescriptor>) {
        self.expect_recording("set_render_targets");
        self.device.cmd_set_render_targets(self.id, colors, depth);
    }

    /// Writes 32-bit constants into a root parameter.
    pub fn set_root_constants(&mut self, parameter: u32, dest_offset: u32, data: &[u32]) {
        self.expect_recording("set_root_constants");
        self.device
            .cmd_set_root_constants(self.id, parameter, dest_offset, data);
    }

    /// Binds a constant-buffer address to a root parameter.
    pub fn set_root_constant_buffer(&mut self, parameter: u32, address: GpuVirtualAddress) {
        self.expect_recording("set_root_constant_buffer");
        self.device
            .cmd_set_root_constant_buffer(self.id, parameter, address);
    }

    /// Binds a descriptor table to a root parameter.
    pub fn set_root_descriptor_table(&mut self, parameter: u32, base: GpuDescriptor) {
        self.expect_recording("set_root_descriptor_table");
        self.device
            .cmd_set_root_descriptor_table(self.id, parameter, base);
    }

    /// Clears a render-target view.
    pub fn clear_render_target_view(&mut self, view: CpuDescriptor, color: Color) {
        self.expect_recording("clear_render_target_view");
        self.device
            .cmd_clear_render_target(self.id, view, color.to_array());
    }

    /// Clears a depth-stencil view.
    pub fn clear_depth_stencil_view(&mut self, view: CpuDescriptor, depth: f32, stencil: u8) {
        self.expect_recording("clear_depth_stencil_view");
        self.device
            .cmd_clear_depth_stencil(self.id, view, depth, stencil);
    }

    /// Copies a byte range between buffers.
    pub fn copy_buffer_region(
        &mut self,
        src: ResourceId,
        src_offset: u64,
        dst: ResourceId,
        dst_offset: u64,
        size: u64,
    ) {
        self.expect_recording("copy_buffer_region");
        self.device
            .cmd_copy_buffer_region(self.id, src, src_offset, dst, dst_offset, size);
    }

    /// Copies a texel region between textures.
    pub fn copy_texture_region(&mut self, src: ResourceId, dst: ResourceId, region: &TextureCopyRegion) {
        self.expect_recording("copy_texture_region");
        self.device.cmd_copy_texture_region(self.id, src, dst, region);
    }

    /// Records a state transition and updates the resource's tracked state.
    ///
    /// Re-requesting the state the resource is already in records nothing.
    pub fn transition_resource(&mut self, resource: &mut RhiResource, after: ResourceState) {
        self.expect_recording("transition_resource");
        let before = resource.state();
        if before == after {
            return;
        }
        self.device
            .cmd_transition_barrier(self.id, resource.id(), before, after);
        resource.set_state(after);
    }

    /// Records a non-indexed draw.
    pub fn draw_instanced(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.expect_recording("draw_instanced");
        self.device.cmd_draw_instanced(
            self.id,
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        );
    }

    /// Records an indexed draw.
    pub fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) {
        self.expect_recording("draw_indexed_instanced");
        self.device.cmd_draw_indexed_instanced(
            self.id,
            index_count,
            instance_count,
            first_index,
            base_vertex,
            first_instance,
        );
    }

    /// Opens a named GPU marker region.
    pub fn begin_marker(&mut self, label: &str) {
        self.expect_recording("begin_marker");
        self.device.cmd_begin_marker(self.id, label);
    }

    /// Closes the innermost GPU marker region.
    pub fn end_marker(&mut self) {
        self.expect_recording("end_marker");
        self.device.cmd_end_marker(self.id);
    }
}
