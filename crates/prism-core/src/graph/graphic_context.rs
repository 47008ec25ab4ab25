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

//! The "current frame" aggregate: one command list, its allocator pool and
//! the CPU-side shadow state passes consume.

use crate::rhi::command_allocator::CommandAllocatorPool;
use crate::rhi::command_list::CommandList;
use crate::rhi::command_queue::CommandQueue;
use crate::rhi::device::RhiDevice;
use crate::rhi::error::RhiError;
use crate::rhi::handle::{CommandAllocatorId, CpuDescriptor, QueueKind};
use crate::rhi::resource::RhiResource;
use crate::rhi::types::{Color, ResourceState, ScissorRect, Viewport};
use crate::rhi::view::{RhiResourceView, ViewKind};
use glam::Mat4;
use std::sync::Arc;

/// Owns exactly one command list + allocator pair and layers a convenience
/// drawing API over the raw list.
///
/// [`reset`](`Self::reset`) acquires an allocator that the queue's completed
/// fence value proves retired, guaranteeing the GPU no longer references its
/// memory; [`finalize_and_execute`](`Self::finalize_and_execute`) closes,
/// submits and hands the allocator back tagged with the new fence value.
///
/// The context also carries per-frame CPU shadow state (the current view
/// and projection matrices) which passes read back instead of plumbing
/// camera data through every call.
#[derive(Debug)]
pub struct GraphicContext {
    list: CommandList,
    allocators: CommandAllocatorPool,
    current_allocator: Option<CommandAllocatorId>,
    markers_enabled: bool,
    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl GraphicContext {
    /// Creates the context with its first allocator and an open list.
    pub fn new(
        device: Arc<dyn RhiDevice>,
        queue_kind: QueueKind,
        markers_enabled: bool,
    ) -> Result<Self, RhiError> {
        let mut allocators = CommandAllocatorPool::new(device.clone(), queue_kind);
        let allocator = allocators.acquire(0)?;
        let list = CommandList::new(device, allocator, queue_kind)?;
        Ok(Self {
            list,
            allocators,
            current_allocator: Some(allocator),
            markers_enabled,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
        })
    }

    /// The raw command list, for operations without a convenience wrapper.
    pub fn list(&self) -> &CommandList {
        &self.list
    }

    /// Mutable access to the raw command list.
    pub fn list_mut(&mut self) -> &mut CommandList {
        &mut self.list
    }

    /// Whether GPU marker regions are emitted.
    pub fn markers_enabled(&self) -> bool {
        self.markers_enabled
    }

    /// Acquires a retired allocator (by the queue's completed fence value)
    /// and resets the list against it.
    pub fn reset(&mut self, queue: &CommandQueue) -> Result<(), RhiError> {
        let completed = queue.completed_value();
        let allocator = self.allocators.acquire(completed)?;
        self.current_allocator = Some(allocator);
        self.list.reset(allocator);
        Ok(())
    }

    /// Closes and submits the list, optionally blocking until the GPU is
    /// done with it. Returns the signaled fence value.
    pub fn finalize_and_execute(&mut self, queue: &mut CommandQueue, wait_for_completion: bool) -> u64 {
        let fence_value = queue.execute(&mut self.list);
        if let Some(allocator) = self.current_allocator.take() {
            self.allocators.retire(allocator, fence_value);
        }
        if wait_for_completion {
            queue.stall_for_fence(fence_value);
        }
        fence_value
    }

    // ----------------------------------------------------------------- //
    // Shadow state
    // ----------------------------------------------------------------- //

    /// Sets the camera view matrix for the current frame.
    pub fn set_view_matrix(&mut self, view: Mat4) {
        self.view_matrix = view;
    }

    /// The camera view matrix of the current frame.
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    /// Sets the camera projection matrix for the current frame.
    pub fn set_projection_matrix(&mut self, projection: Mat4) {
        self.projection_matrix = projection;
    }

    /// The camera projection matrix of the current frame.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    /// The combined view-projection matrix of the current frame.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    // ----------------------------------------------------------------- //
    // Convenience drawing API
    // ----------------------------------------------------------------- //

    /// Sets viewport and scissor together.
    pub fn set_target_region(&mut self, viewport: &Viewport, scissor: &ScissorRect) {
        self.list.set_viewport(viewport);
        self.list.set_scissor(scissor);
    }

    /// Binds color targets and an optional depth target. View kinds are
    /// checked; binding the wrong kind is a contract violation.
    pub fn set_render_targets(
        &mut self,
        colors: &[&RhiResourceView],
        depth: Option<&RhiResourceView>,
    ) {
        for view in colors {
            view.expect_kind(ViewKind::RenderTarget);
        }
        if let Some(view) = depth {
            view.expect_kind(ViewKind::DepthStencil);
        }
        let descriptors: Vec<CpuDescriptor> = colors.iter().map(|v| v.cpu()).collect();
        self.list
            .set_render_targets(&descriptors, depth.map(|v| v.cpu()));
    }

    /// Clears a render-target view to `color`.
    pub fn clear_color(&mut self, view: &RhiResourceView, color: Color) {
        view.expect_kind(ViewKind::RenderTarget);
        self.list.clear_render_target_view(view.cpu(), color);
    }

    /// Clears a depth-stencil view.
    pub fn clear_depth(&mut self, view: &RhiResourceView, depth: f32, stencil: u8) {
        view.expect_kind(ViewKind::DepthStencil);
        self.list.clear_depth_stencil_view(view.cpu(), depth, stencil);
    }

    /// Records a state transition on `resource`.
    pub fn transition(&mut self, resource: &mut RhiResource, state: ResourceState) {
        self.list.transition_resource(resource, state);
    }

    /// Binds a whole buffer as the constant buffer of a root parameter.
    pub fn bind_root_constant_buffer(&mut self, parameter: u32, buffer: &RhiResource) {
        self.list
            .set_root_constant_buffer(parameter, buffer.gpu_address());
    }

    /// Opens a GPU marker region when markers are enabled.
    pub fn begin_marker(&mut self, label: &str) {
        if self.markers_enabled {
            self.list.begin_marker(label);
        }
    }

    /// Closes the innermost GPU marker region when markers are enabled.
    pub fn end_marker(&mut self) {
        if self.markers_enabled {
            self.list.end_marker();
        }
    }
}
