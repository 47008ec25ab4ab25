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

//! The per-frame-graph registry mapping logical resource names to physical
//! GPU resources, views and pipeline state.
//!
//! Creation calls diff the incoming description against the cached entry:
//! unchanged descriptions return the existing object with zero device work,
//! which makes per-frame `register_input_output` declarations free in the
//! steady state. A changed description (a window resize, a format switch)
//! recreates the resource and bumps its version; views compare their built
//! version on access and transparently rebuild into their existing
//! descriptor slot. Pipeline caching follows the same diff pattern and
//! additionally rebuilds when a referenced shader module was hot-reloaded.
//!
//! Querying a name that was never created is a programmer error and panics
//! after logging; it is not a recoverable runtime condition.

use crate::pipeline::GraphicsPipelineDesc;
use crate::rhi::descriptor::{DescriptorAllocation, DescriptorHeap, DescriptorHeapKind};
use crate::rhi::device::RhiDevice;
use crate::rhi::error::{PipelineError, ResourceError};
use crate::rhi::format::Format;
use crate::rhi::handle::{DescriptorHeapId, PipelineId, ResourceId};
use crate::rhi::resource::{BufferDesc, ResourceDesc, ResourceUsage, RhiResource, TextureDesc};
use crate::rhi::types::{ClearValue, Extent2D, HeapType, ResourceState, SampleCount};
use crate::rhi::view::{
    ConstantBufferViewDesc, DepthStencilViewDesc, RenderTargetViewDesc, ResourceViewDesc,
    RhiResourceView, ShaderResourceViewDesc, UnorderedAccessViewDesc,
};
use crate::shader::ShaderLibrary;
use std::collections::HashMap;
use std::sync::Arc;

/// Slot counts of the descriptor heaps the context owns.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorHeapCapacities {
    /// Render-target view heap.
    pub rtv: u32,
    /// Depth-stencil view heap.
    pub dsv: u32,
    /// CPU-side staging heap for SRV/CBV/UAV descriptors.
    pub staging: u32,
    /// Shader-visible heap descriptor tables are served from.
    pub shader_visible: u32,
}

impl Default for DescriptorHeapCapacities {
    fn default() -> Self {
        Self {
            rtv: 128,
            dsv: 32,
            staging: 512,
            shader_visible: 512,
        }
    }
}

#[derive(Debug)]
struct ResourceEntry {
    resource: RhiResource,
    version: u64,
}

#[derive(Debug)]
struct ViewEntry {
    view: RhiResourceView,
    desc: ResourceViewDesc,
    resource_name: String,
}

#[derive(Debug)]
struct PipelineEntry {
    desc: GraphicsPipelineDesc,
    pipeline: PipelineId,
    /// Shader generations captured at build time, in `shader_keys()` order.
    shader_generations: Vec<u64>,
}

/// The logical-to-physical resource registry of the frame graph.
pub struct ResourceContext {
    device: Arc<dyn RhiDevice>,
    rtv_heap: DescriptorHeap,
    dsv_heap: DescriptorHeap,
    staging_heap: DescriptorHeap,
    shader_heap: DescriptorHeap,
    resources: HashMap<String, ResourceEntry>,
    views: HashMap<String, ViewEntry>,
    pipelines: HashMap<String, PipelineEntry>,
    transient: Vec<DescriptorAllocation>,
}

impl std::fmt::Debug for ResourceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceContext")
            .field("resources", &self.resources.len())
            .field("views", &self.views.len())
            .field("pipelines", &self.pipelines.len())
            .finish()
    }
}

impl ResourceContext {
    /// Creates the registry and its descriptor heaps.
    pub fn new(
        device: Arc<dyn RhiDevice>,
        capacities: DescriptorHeapCapacities,
    ) -> Result<Self, ResourceError> {
        let rtv_heap = DescriptorHeap::new(
            device.clone(),
            DescriptorHeapKind::Rtv,
            capacities.rtv,
            false,
        )?;
        let dsv_heap = DescriptorHeap::new(
            device.clone(),
            DescriptorHeapKind::Dsv,
            capacities.dsv,
            false,
        )?;
        let staging_heap = DescriptorHeap::new(
            device.clone(),
            DescriptorHeapKind::CbvSrvUav,
            capacities.staging,
            false,
        )?;
        let shader_heap = DescriptorHeap::new(
            device.clone(),
            DescriptorHeapKind::CbvSrvUav,
            capacities.shader_visible,
            true,
        )?;
        Ok(Self {
            device,
            rtv_heap,
            dsv_heap,
            staging_heap,
            shader_heap,
            resources: HashMap::new(),
            views: HashMap::new(),
            pipelines: HashMap::new(),
            transient: Vec::new(),
        })
    }

    /// The device the registry creates objects on.
    pub fn device(&self) -> &Arc<dyn RhiDevice> {
        &self.device
    }

    /// The shader-visible heap descriptor tables live in; bind it on the
    /// command list before setting root descriptor tables.
    pub fn shader_heap_id(&self) -> DescriptorHeapId {
        self.shader_heap.id()
    }

    /// The shader-visible heap itself, mostly for introspection.
    pub fn shader_heap(&self) -> &DescriptorHeap {
        &self.shader_heap
    }

    /// Releases transient descriptor allocations. Called at the start of
    /// every frame; resource, view and pipeline tables persist across frames.
    pub fn reset_frame(&mut self) {
        for allocation in self.transient.drain(..) {
            self.shader_heap.free(allocation);
        }
    }

    // ----------------------------------------------------------------- //
    // Resources
    // ----------------------------------------------------------------- //

    /// Creates the named resource, or returns the existing one when the
    /// description is unchanged. A changed description destroys the old
    /// allocation, creates a new one and leaves dependent views stale.
    pub fn create_resource(
        &mut self,
        name: &str,
        desc: ResourceDesc,
    ) -> Result<ResourceId, ResourceError> {
        if let Some(entry) = self.resources.get(name) {
            if *entry.resource.desc() == desc {
                return Ok(entry.resource.id());
            }
        }

        let created = self
            .device
            .create_committed_resource(&desc, name)
            .map_err(|err| {
                log::error!("Failed to create resource '{name}': {err}");
                err
            })?;

        match self.resources.get_mut(name) {
            Some(entry) => {
                log::debug!(
                    "Recreating resource '{name}' (version {} -> {})",
                    entry.version,
                    entry.version + 1
                );
                self.device.destroy_resource(entry.resource.id());
                entry.resource = RhiResource::new(created.id, name, desc, created.gpu_address);
                entry.version += 1;
            }
            None => {
                self.resources.insert(
                    name.to_string(),
                    ResourceEntry {
                        resource: RhiResource::new(created.id, name, desc, created.gpu_address),
                        version: 1,
                    },
                );
            }
        }
        Ok(created.id)
    }

    /// Convenience wrapper for buffer resources.
    pub fn create_buffer_resource(
        &mut self,
        name: &str,
        desc: BufferDesc,
    ) -> Result<ResourceId, ResourceError> {
        self.create_resource(name, ResourceDesc::Buffer(desc))
    }

    /// Convenience wrapper for 2D texture resources.
    pub fn create_texture_2d_resource(
        &mut self,
        name: &str,
        desc: TextureDesc,
    ) -> Result<ResourceId, ResourceError> {
        self.create_resource(name, ResourceDesc::Texture2D(desc))
    }

    /// Creates a depth target with the conventional clear value.
    pub fn create_depth_stencil_resource(
        &mut self,
        name: &str,
        extent: Extent2D,
        format: Format,
    ) -> Result<ResourceId, ResourceError> {
        self.create_texture_2d_resource(
            name,
            TextureDesc {
                extent,
                format,
                mip_levels: 1,
                sample_count: SampleCount::One,
                heap: HeapType::Default,
                usage: ResourceUsage::DEPTH_STENCIL,
                initial_state: ResourceState::DepthWrite,
                clear_value: Some(ClearValue::DepthStencil {
                    depth: 1.0,
                    stencil: 0,
                }),
            },
        )
    }

    /// Registers an opaque acceleration-structure buffer. Kept in the same
    /// table with the same diff semantics; no dedicated BVH API exists here.
    pub fn create_acceleration_structure(
        &mut self,
        name: &str,
        size: u64,
    ) -> Result<ResourceId, ResourceError> {
        self.create_buffer_resource(
            name,
            BufferDesc {
                size,
                heap: HeapType::Default,
                usage: ResourceUsage::UNORDERED_ACCESS,
                initial_state: ResourceState::UnorderedAccess,
            },
        )
    }

    /// Returns `true` if the named resource exists.
    pub fn contains_resource(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    fn resource_entry(&self, name: &str) -> &ResourceEntry {
        match self.resources.get(name) {
            Some(entry) => entry,
            None => {
                log::error!("Resource '{name}' queried before creation");
                panic!("resource queried before creation");
            }
        }
    }

    /// The named resource. Panics if it was never created.
    pub fn resource(&self, name: &str) -> &RhiResource {
        &self.resource_entry(name).resource
    }

    /// Mutable access to the named resource, required to record transitions.
    pub fn resource_mut(&mut self, name: &str) -> &mut RhiResource {
        match self.resources.get_mut(name) {
            Some(entry) => &mut entry.resource,
            None => {
                log::error!("Resource '{name}' queried before creation");
                panic!("resource queried before creation");
            }
        }
    }

    /// The recreation version of the named resource (starts at 1).
    pub fn resource_version(&self, name: &str) -> u64 {
        self.resource_entry(name).version
    }

    // ----------------------------------------------------------------- //
    // Views
    // ----------------------------------------------------------------- //

    /// Declares a view of a resource under its own logical name.
    ///
    /// Re-declaring with an unchanged description is a no-op. The descriptor
    /// slot is allocated once and survives backing-resource recreation: a
    /// stale view is rebuilt into its existing slot on next access.
    pub fn create_view(
        &mut self,
        view_name: &str,
        resource_name: &str,
        desc: ResourceViewDesc,
    ) -> Result<(), ResourceError> {
        if let Some(entry) = self.views.get(view_name) {
            if entry.desc == desc && entry.resource_name == resource_name {
                return Ok(());
            }
        }

        let (resource_id, resource_version) = {
            let entry = self.resource_entry(resource_name);
            (entry.resource.id(), entry.version)
        };

        // Redeclared views reuse their slot when the heap kind matches,
        // otherwise the old slot is released and a new one allocated.
        let existing_slot = self
            .views
            .get(view_name)
            .map(|e| (e.view.slot(), e.desc.kind().heap_kind()));
        let slot = match existing_slot {
            Some((slot, old_kind)) if old_kind == desc.kind().heap_kind() => slot,
            Some((slot, old_kind)) => {
                self.heap_mut(old_kind).free(slot);
                self.heap_mut(desc.kind().heap_kind()).allocate()?
            }
            None => self.heap_mut(desc.kind().heap_kind()).allocate()?,
        };

        {
            let resource = &self.resource_entry(resource_name).resource;
            Self::write_view(self.device.as_ref(), resource, slot.cpu, &desc).map_err(|err| {
                log::error!("Failed to create view '{view_name}' of '{resource_name}': {err}");
                err
            })?;
        }

        self.views.insert(
            view_name.to_string(),
            ViewEntry {
                view: RhiResourceView::new(desc.kind(), resource_id, resource_version, slot),
                desc,
                resource_name: resource_name.to_string(),
            },
        );
        Ok(())
    }

    /// Declares a render-target view.
    pub fn create_render_target_view(
        &mut self,
        view_name: &str,
        resource_name: &str,
        desc: RenderTargetViewDesc,
    ) -> Result<(), ResourceError> {
        self.create_view(view_name, resource_name, ResourceViewDesc::RenderTarget(desc))
    }

    /// Declares a depth-stencil view.
    pub fn create_depth_stencil_view(
        &mut self,
        view_name: &str,
        resource_name: &str,
        desc: DepthStencilViewDesc,
    ) -> Result<(), ResourceError> {
        self.create_view(view_name, resource_name, ResourceViewDesc::DepthStencil(desc))
    }

    /// Declares a shader-resource view.
    pub fn create_shader_resource_view(
        &mut self,
        view_name: &str,
        resource_name: &str,
        desc: ShaderResourceViewDesc,
    ) -> Result<(), ResourceError> {
        self.create_view(
            view_name,
            resource_name,
            ResourceViewDesc::ShaderResource(desc),
        )
    }

    /// Declares a constant-buffer view.
    pub fn create_constant_buffer_view(
        &mut self,
        view_name: &str,
        resource_name: &str,
        desc: ConstantBufferViewDesc,
    ) -> Result<(), ResourceError> {
        self.create_view(
            view_name,
            resource_name,
            ResourceViewDesc::ConstantBuffer(desc),
        )
    }

    /// Declares an unordered-access view.
    pub fn create_unordered_access_view(
        &mut self,
        view_name: &str,
        resource_name: &str,
        desc: UnorderedAccessViewDesc,
    ) -> Result<(), ResourceError> {
        self.create_view(
            view_name,
            resource_name,
            ResourceViewDesc::UnorderedAccess(desc),
        )
    }

    /// Returns `true` if the named view exists.
    pub fn contains_view(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    /// The named view, rebuilt first if its backing resource was recreated
    /// since the view was last written. Panics if the view (or its backing
    /// resource) was never created.
    pub fn view(&mut self, name: &str) -> RhiResourceView {
        let (current, desc, resource_name) = match self.views.get(name) {
            Some(entry) => (entry.view, entry.desc, entry.resource_name.clone()),
            None => {
                log::error!("View '{name}' queried before creation");
                panic!("view queried before creation");
            }
        };

        let (resource_id, resource_version) = {
            let entry = self.resource_entry(&resource_name);
            (entry.resource.id(), entry.version)
        };

        if current.built_version() == resource_version && current.resource() == resource_id {
            return current;
        }

        // Stale: the backing resource was recreated. Rewrite the descriptor
        // in place; failing to rebuild a previously valid view is fatal.
        {
            let resource = &self.resource_entry(&resource_name).resource;
            if let Err(err) =
                Self::write_view(self.device.as_ref(), resource, current.slot().cpu, &desc)
            {
                log::error!("Failed to rebuild stale view '{name}': {err}");
                panic!("stale view rebuild failed");
            }
        }
        log::debug!("Rebuilt stale view '{name}' against version {resource_version}");

        let rebuilt =
            RhiResourceView::new(desc.kind(), resource_id, resource_version, current.slot());
        self.views
            .get_mut(name)
            .expect("view entry vanished during rebuild")
            .view = rebuilt;
        rebuilt
    }

    /// Returns `true` if the named view no longer matches its backing
    /// resource and would be rebuilt on next access.
    pub fn is_view_stale(&self, name: &str) -> bool {
        let entry = match self.views.get(name) {
            Some(entry) => entry,
            None => {
                log::error!("View '{name}' queried before creation");
                panic!("view queried before creation");
            }
        };
        let resource = self.resource_entry(&entry.resource_name);
        entry.view.built_version() != resource.version
            || entry.view.resource() != resource.resource.id()
    }

    fn write_view(
        device: &dyn RhiDevice,
        resource: &RhiResource,
        dst: crate::rhi::handle::CpuDescriptor,
        desc: &ResourceViewDesc,
    ) -> Result<(), ResourceError> {
        match desc {
            ResourceViewDesc::RenderTarget(desc) => {
                device.create_render_target_view(resource.id(), dst, desc)
            }
            ResourceViewDesc::DepthStencil(desc) => {
                device.create_depth_stencil_view(resource.id(), dst, desc)
            }
            ResourceViewDesc::ShaderResource(desc) => {
                device.create_shader_resource_view(resource.id(), dst, desc)
            }
            ResourceViewDesc::ConstantBuffer(desc) => {
                device.create_constant_buffer_view(resource.id(), dst, desc)
            }
            ResourceViewDesc::UnorderedAccess(desc) => {
                device.create_unordered_access_view(resource.id(), dst, desc)
            }
        }
    }

    fn heap_mut(&mut self, kind: DescriptorHeapKind) -> &mut DescriptorHeap {
        match kind {
            DescriptorHeapKind::Rtv => &mut self.rtv_heap,
            DescriptorHeapKind::Dsv => &mut self.dsv_heap,
            DescriptorHeapKind::CbvSrvUav => &mut self.staging_heap,
        }
    }

    /// The persistent heap of the given kind (the staging heap for
    /// SRV/CBV/UAV descriptors).
    pub fn heap(&self, kind: DescriptorHeapKind) -> &DescriptorHeap {
        match kind {
            DescriptorHeapKind::Rtv => &self.rtv_heap,
            DescriptorHeapKind::Dsv => &self.dsv_heap,
            DescriptorHeapKind::CbvSrvUav => &self.staging_heap,
        }
    }

    // ----------------------------------------------------------------- //
    // Transient descriptor tables
    // ----------------------------------------------------------------- //

    /// Reserves a frame-scoped table of `count` consecutive shader-visible
    /// slots. Recycled automatically on [`reset_frame`](`Self::reset_frame`).
    pub fn allocate_transient_table(
        &mut self,
        count: u32,
    ) -> Result<DescriptorAllocation, ResourceError> {
        let allocation = self.shader_heap.allocate_range(count)?;
        self.transient.push(allocation);
        Ok(allocation)
    }

    /// Stages the named views into consecutive slots of a transient table.
    /// The views are refreshed first if stale.
    pub fn stage_views(
        &mut self,
        table: DescriptorAllocation,
        view_names: &[&str],
    ) -> Result<(), ResourceError> {
        if view_names.len() as u32 > table.count {
            log::error!(
                "Staging {} views into a table of {} slots",
                view_names.len(),
                table.count
            );
            panic!("descriptor table overflow");
        }
        let increment = self.shader_heap.increment();
        for (i, name) in view_names.iter().enumerate() {
            let view = self.view(name);
            let dst = table.cpu_at(i as u32, increment);
            self.device
                .copy_descriptors(DescriptorHeapKind::CbvSrvUav, dst, view.cpu(), 1);
        }
        Ok(())
    }

    // ----------------------------------------------------------------- //
    // Pipeline state caching
    // ----------------------------------------------------------------- //

    /// Creates or refreshes the named pipeline state object.
    ///
    /// The cached pipeline is reused when the description is unchanged and
    /// none of its shader modules were hot-reloaded. When a rebuild is
    /// needed the caller must have drained the GPU first (the scheduler's
    /// flush does this); a failed rebuild keeps serving the stale pipeline.
    pub fn register_pipeline_state(
        &mut self,
        shaders: &ShaderLibrary,
        name: &str,
        desc: GraphicsPipelineDesc,
    ) -> Result<PipelineId, PipelineError> {
        let current_generations: Vec<u64> = desc
            .shader_keys()
            .iter()
            .map(|key| shaders.module_generation(key))
            .collect();

        let old_pipeline = match self.pipelines.get(name) {
            Some(entry) => {
                if entry.desc == desc && entry.shader_generations == current_generations {
                    return Ok(entry.pipeline);
                }
                Some(entry.pipeline)
            }
            None => None,
        };

        let vs = shaders.bytecode(&desc.vertex_shader);
        let ps_bytecode = desc.pixel_shader.as_ref().map(|key| shaders.bytecode(key));
        match self.device.create_graphics_pipeline(&desc, vs, ps_bytecode) {
            Ok(pipeline) => {
                if let Some(old) = old_pipeline {
                    self.device.destroy_pipeline(old);
                    log::info!("Rebuilt pipeline state '{name}'");
                }
                self.pipelines.insert(
                    name.to_string(),
                    PipelineEntry {
                        desc,
                        pipeline,
                        shader_generations: current_generations,
                    },
                );
                Ok(pipeline)
            }
            Err(err) => match old_pipeline {
                // A failed rebuild is survivable: keep the stale pipeline.
                Some(old) => {
                    log::error!("Pipeline rebuild for '{name}' failed, keeping stale PSO: {err}");
                    Ok(old)
                }
                None => {
                    log::error!("Pipeline build for '{name}' failed: {err}");
                    Err(err)
                }
            },
        }
    }

    /// The named cached pipeline. Panics if it was never registered.
    pub fn pipeline_state(&self, name: &str) -> PipelineId {
        match self.pipelines.get(name) {
            Some(entry) => entry.pipeline,
            None => {
                log::error!("Pipeline state '{name}' queried before registration");
                panic!("pipeline state queried before registration");
            }
        }
    }
}

impl Drop for ResourceContext {
    fn drop(&mut self) {
        for entry in self.pipelines.values() {
            self.device.destroy_pipeline(entry.pipeline);
        }
        for entry in self.resources.values() {
            self.device.destroy_resource(entry.resource.id());
        }
    }
}
