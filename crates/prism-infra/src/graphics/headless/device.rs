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

//! The headless reference device.
//!
//! Implements the full [`RhiDevice`] surface without a GPU: resources are
//! table entries, command lists record into inspectable command streams, and
//! fences complete the moment they are signaled (an infinitely fast GPU).
//! This is the backend tests, CI and the sandbox run against; it also keeps
//! the telemetry counters (allocations, barriers, draws, approximate VRAM)
//! that the idempotence and transition tests observe.

use prism_core::pipeline::{GraphicsPipelineDesc, RootSignatureDesc};
use prism_core::rhi::{
    CommandAllocatorId, CommandListId, CpuDescriptor, CreatedResource, DescriptorHeapDesc,
    DescriptorHeapId, DescriptorHeapInfo, DescriptorHeapKind, FenceId, GpuDescriptor,
    GpuVirtualAddress, HeapType, IndexBufferBinding, PipelineError, PipelineId, QueueKind,
    ResourceDesc, ResourceError, ResourceId, ResourceState, ResourceUsage, RhiDevice, RhiError,
    RootSignatureId, ScissorRect, TextureCopyRegion, VertexBufferBinding, Viewport,
};
use prism_core::shader::ShaderBytecode;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Descriptor addresses are synthesized as `heap_id * STRIDE + slot * INCREMENT`.
const HEAP_ADDRESS_STRIDE: u64 = 1 << 20;
/// Handle increment size reported for every heap kind.
const DESCRIPTOR_INCREMENT: u32 = 32;
/// GPU virtual addresses are handed out on 64 KiB boundaries.
const VA_ALIGNMENT: u64 = 64 * 1024;

/// One command as recorded into a headless list. Tests assert on these.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// Viewport bind.
    SetViewport(Viewport),
    /// Scissor bind.
    SetScissor(ScissorRect),
    /// Pipeline bind.
    SetPipeline(PipelineId),
    /// Root-signature bind.
    SetRootSignature(RootSignatureId),
    /// Vertex-buffer bind.
    SetVertexBuffer {
        /// Input slot.
        slot: u32,
        /// The bound region.
        binding: VertexBufferBinding,
    },
    /// Index-buffer bind.
    SetIndexBuffer(IndexBufferBinding),
    /// Shader-visible heap bind.
    SetDescriptorHeap(DescriptorHeapId),
    /// Render-target bind.
    SetRenderTargets {
        /// Color descriptors.
        colors: Vec<CpuDescriptor>,
        /// Depth descriptor.
        depth: Option<CpuDescriptor>,
    },
    /// Inline root constants.
    SetRootConstants {
        /// Root-parameter index.
        parameter: u32,
        /// Destination offset in 32-bit values.
        dest_offset: u32,
        /// The values written.
        values: Vec<u32>,
    },
    /// Root CBV bind.
    SetRootConstantBuffer {
        /// Root-parameter index.
        parameter: u32,
        /// Bound address.
        address: GpuVirtualAddress,
    },
    /// Root descriptor-table bind.
    SetRootDescriptorTable {
        /// Root-parameter index.
        parameter: u32,
        /// Table base address.
        base: GpuDescriptor,
    },
    /// Render-target clear.
    ClearRenderTarget {
        /// Cleared descriptor.
        view: CpuDescriptor,
        /// Clear color.
        color: [f32; 4],
    },
    /// Depth-stencil clear.
    ClearDepthStencil {
        /// Cleared descriptor.
        view: CpuDescriptor,
        /// Depth value.
        depth: f32,
        /// Stencil value.
        stencil: u8,
    },
    /// Buffer-to-buffer copy.
    CopyBufferRegion {
        /// Source buffer.
        src: ResourceId,
        /// Source offset.
        src_offset: u64,
        /// Destination buffer.
        dst: ResourceId,
        /// Destination offset.
        dst_offset: u64,
        /// Bytes copied.
        size: u64,
    },
    /// Texture-to-texture copy.
    CopyTextureRegion {
        /// Source texture.
        src: ResourceId,
        /// Destination texture.
        dst: ResourceId,
        /// Copied region.
        region: TextureCopyRegion,
    },
    /// State-transition barrier.
    Transition {
        /// Transitioned resource.
        resource: ResourceId,
        /// State before.
        before: ResourceState,
        /// State after.
        after: ResourceState,
    },
    /// Non-indexed draw.
    Draw {
        /// Vertices per instance.
        vertex_count: u32,
        /// Instance count.
        instance_count: u32,
    },
    /// Indexed draw.
    DrawIndexed {
        /// Indices per instance.
        index_count: u32,
        /// Instance count.
        instance_count: u32,
    },
    /// Marker region open.
    BeginMarker(String),
    /// Marker region close.
    EndMarker,
}

#[derive(Debug)]
struct ResourceEntry {
    name: String,
    desc: ResourceDesc,
    size: u64,
    upload: Option<Vec<u8>>,
}

#[derive(Debug)]
struct HeapEntry {
    desc: DescriptorHeapDesc,
}

#[derive(Debug)]
struct ListEntry {
    #[allow(dead_code)]
    allocator: CommandAllocatorId,
    open: bool,
    queue: QueueKind,
    commands: Vec<RecordedCommand>,
}

#[derive(Debug)]
struct AllocatorEntry {
    queue: QueueKind,
    resets: u64,
}

/// A snapshot of the device's telemetry counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Committed-resource allocations performed.
    pub allocation_calls: u64,
    /// Resources destroyed.
    pub destroyed_resources: u64,
    /// View descriptors written.
    pub view_writes: u64,
    /// Transition barriers recorded.
    pub barriers: u64,
    /// Draw calls recorded.
    pub draws: u64,
    /// Copy commands recorded.
    pub copies: u64,
    /// Command lists submitted.
    pub submissions: u64,
    /// Fence completed-value queries served.
    pub fence_queries: u64,
    /// Approximate VRAM of live resources, in bytes.
    pub vram_bytes: u64,
}

/// A complete [`RhiDevice`] implementation with no GPU behind it.
pub struct HeadlessDevice {
    adapter_name: String,
    next_id: AtomicU64,
    next_va: AtomicU64,
    resources: Mutex<HashMap<u64, ResourceEntry>>,
    heaps: Mutex<HashMap<u64, HeapEntry>>,
    written_slots: Mutex<HashSet<u64>>,
    lists: Mutex<HashMap<u64, ListEntry>>,
    allocators: Mutex<HashMap<u64, AllocatorEntry>>,
    fences: Mutex<HashMap<u64, u64>>,
    root_signatures: Mutex<HashMap<u64, usize>>,
    pipelines: Mutex<HashSet<u64>>,

    allocation_calls: AtomicU64,
    destroyed_resources: AtomicU64,
    view_writes: AtomicU64,
    barriers: AtomicU64,
    draws: AtomicU64,
    copies: AtomicU64,
    submissions: AtomicU64,
    fence_queries: AtomicU64,
    vram_bytes: AtomicU64,
}

impl std::fmt::Debug for HeadlessDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessDevice")
            .field("adapter_name", &self.adapter_name)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        log::info!("Headless graphics device created");
        Self {
            adapter_name: "Prism Headless Reference Device".to_string(),
            next_id: AtomicU64::new(1),
            next_va: AtomicU64::new(VA_ALIGNMENT),
            resources: Mutex::new(HashMap::new()),
            heaps: Mutex::new(HashMap::new()),
            written_slots: Mutex::new(HashSet::new()),
            lists: Mutex::new(HashMap::new()),
            allocators: Mutex::new(HashMap::new()),
            fences: Mutex::new(HashMap::new()),
            root_signatures: Mutex::new(HashMap::new()),
            pipelines: Mutex::new(HashSet::new()),
            allocation_calls: AtomicU64::new(0),
            destroyed_resources: AtomicU64::new(0),
            view_writes: AtomicU64::new(0),
            barriers: AtomicU64::new(0),
            draws: AtomicU64::new(0),
            copies: AtomicU64::new(0),
            submissions: AtomicU64::new(0),
            fence_queries: AtomicU64::new(0),
            vram_bytes: AtomicU64::new(0),
        }
    }

    /// A snapshot of the telemetry counters.
    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            allocation_calls: self.allocation_calls.load(Ordering::Relaxed),
            destroyed_resources: self.destroyed_resources.load(Ordering::Relaxed),
            view_writes: self.view_writes.load(Ordering::Relaxed),
            barriers: self.barriers.load(Ordering::Relaxed),
            draws: self.draws.load(Ordering::Relaxed),
            copies: self.copies.load(Ordering::Relaxed),
            submissions: self.submissions.load(Ordering::Relaxed),
            fence_queries: self.fence_queries.load(Ordering::Relaxed),
            vram_bytes: self.vram_bytes.load(Ordering::Relaxed),
        }
    }

    /// Number of live (created, not destroyed) resources.
    pub fn live_resources(&self) -> usize {
        self.resources.lock().unwrap().len()
    }

    /// The bytes currently stored in an upload-heap buffer.
    pub fn upload_contents(&self, id: ResourceId) -> Option<Vec<u8>> {
        self.resources
            .lock()
            .unwrap()
            .get(&id.0)
            .and_then(|entry| entry.upload.clone())
    }

    /// A copy of the commands recorded into `list` since its last reset.
    pub fn recorded_commands(&self, list: CommandListId) -> Vec<RecordedCommand> {
        self.lists
            .lock()
            .unwrap()
            .get(&list.0)
            .map(|entry| entry.commands.clone())
            .unwrap_or_default()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn record(&self, list: CommandListId, command: RecordedCommand) {
        let mut lists = self.lists.lock().unwrap();
        let entry = match lists.get_mut(&list.0) {
            Some(entry) => entry,
            None => {
                log::error!("Recording into unknown command list {list:?}");
                panic!("recording into an unknown command list");
            }
        };
        if !entry.open {
            log::error!("Recording into closed command list {list:?}");
            panic!("recording into a closed command list");
        }
        entry.commands.push(command);
    }

    /// Resolves a descriptor address to its heap, or `None` if it points
    /// into no live heap.
    fn slot_heap(&self, address: u64) -> Option<(DescriptorHeapId, DescriptorHeapDesc)> {
        let heap_id = address / HEAP_ADDRESS_STRIDE;
        let heaps = self.heaps.lock().unwrap();
        let entry = heaps.get(&heap_id)?;
        let slot = (address % HEAP_ADDRESS_STRIDE) / DESCRIPTOR_INCREMENT as u64;
        if slot >= entry.desc.capacity as u64 {
            return None;
        }
        Some((DescriptorHeapId(heap_id), entry.desc))
    }

    fn write_view(
        &self,
        resource: ResourceId,
        dst: CpuDescriptor,
        required_kind: DescriptorHeapKind,
        required_usage: ResourceUsage,
        what: &str,
    ) -> Result<(), ResourceError> {
        let resources = self.resources.lock().unwrap();
        let entry = resources.get(&resource.0).ok_or(ResourceError::InvalidHandle)?;
        if !required_usage.is_empty() && !entry.desc.usage().intersects(required_usage) {
            return Err(ResourceError::ViewCreationFailed(format!(
                "resource '{}' was not created with {required_usage:?} usage",
                entry.name
            )));
        }
        drop(resources);

        match self.slot_heap(dst.0) {
            Some((_, heap_desc)) if heap_desc.kind == required_kind => {
                self.written_slots.lock().unwrap().insert(dst.0);
                self.view_writes.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Some((_, heap_desc)) => Err(ResourceError::ViewCreationFailed(format!(
                "{what} written into a {:?} heap",
                heap_desc.kind
            ))),
            None => Err(ResourceError::ViewCreationFailed(format!(
                "{what} target address {:#x} is unallocated",
                dst.0
            ))),
        }
    }
}

impl RhiDevice for HeadlessDevice {
    fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn create_committed_resource(
        &self,
        desc: &ResourceDesc,
        debug_name: &str,
    ) -> Result<CreatedResource, ResourceError> {
        let size = desc.size_in_bytes();
        let id = self.next_id();
        let va = self.next_va.fetch_add(size.div_ceil(VA_ALIGNMENT).max(1) * VA_ALIGNMENT, Ordering::Relaxed);

        let upload = match desc.heap() {
            HeapType::Upload => Some(vec![0u8; size as usize]),
            _ => None,
        };
        self.resources.lock().unwrap().insert(
            id,
            ResourceEntry {
                name: debug_name.to_string(),
                desc: desc.clone(),
                size,
                upload,
            },
        );
        self.allocation_calls.fetch_add(1, Ordering::Relaxed);
        self.vram_bytes.fetch_add(size, Ordering::Relaxed);
        log::trace!("Committed resource '{debug_name}' ({size} bytes) as {id}");
        Ok(CreatedResource {
            id: ResourceId(id),
            gpu_address: GpuVirtualAddress(va),
        })
    }

    fn destroy_resource(&self, id: ResourceId) {
        match self.resources.lock().unwrap().remove(&id.0) {
            Some(entry) => {
                self.destroyed_resources.fetch_add(1, Ordering::Relaxed);
                self.vram_bytes.fetch_sub(entry.size, Ordering::Relaxed);
            }
            None => log::warn!("Destroying unknown resource {id:?}"),
        }
    }

    fn write_buffer(&self, id: ResourceId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut resources = self.resources.lock().unwrap();
        let entry = resources.get_mut(&id.0).ok_or(ResourceError::InvalidHandle)?;
        let storage = entry.upload.as_mut().ok_or_else(|| {
            ResourceError::BackendError(format!(
                "write_buffer on non-upload resource '{}'",
                entry.name
            ))
        })?;
        let end = offset as usize + data.len();
        if end > storage.len() {
            return Err(ResourceError::OutOfBounds);
        }
        storage[offset as usize..end].copy_from_slice(data);
        Ok(())
    }

    fn create_descriptor_heap(
        &self,
        desc: &DescriptorHeapDesc,
    ) -> Result<DescriptorHeapInfo, ResourceError> {
        if desc.shader_visible && desc.kind != DescriptorHeapKind::CbvSrvUav {
            return Err(ResourceError::BackendError(format!(
                "{:?} heaps cannot be shader visible",
                desc.kind
            )));
        }
        let id = self.next_id();
        self.heaps.lock().unwrap().insert(id, HeapEntry { desc: *desc });
        let base = id * HEAP_ADDRESS_STRIDE;
        Ok(DescriptorHeapInfo {
            id: DescriptorHeapId(id),
            base_cpu: CpuDescriptor(base),
            base_gpu: desc.shader_visible.then_some(GpuDescriptor(base)),
            increment: DESCRIPTOR_INCREMENT,
        })
    }

    fn destroy_descriptor_heap(&self, id: DescriptorHeapId) {
        if self.heaps.lock().unwrap().remove(&id.0).is_none() {
            log::warn!("Destroying unknown descriptor heap {id:?}");
        }
    }

    fn create_render_target_view(
        &self,
        resource: ResourceId,
        dst: CpuDescriptor,
        _desc: &prism_core::rhi::RenderTargetViewDesc,
    ) -> Result<(), ResourceError> {
        self.write_view(
            resource,
            dst,
            DescriptorHeapKind::Rtv,
            ResourceUsage::RENDER_TARGET,
            "render-target view",
        )
    }

    fn create_depth_stencil_view(
        &self,
        resource: ResourceId,
        dst: CpuDescriptor,
        _desc: &prism_core::rhi::DepthStencilViewDesc,
    ) -> Result<(), ResourceError> {
        self.write_view(
            resource,
            dst,
            DescriptorHeapKind::Dsv,
            ResourceUsage::DEPTH_STENCIL,
            "depth-stencil view",
        )
    }

    fn create_shader_resource_view(
        &self,
        resource: ResourceId,
        dst: CpuDescriptor,
        _desc: &prism_core::rhi::ShaderResourceViewDesc,
    ) -> Result<(), ResourceError> {
        self.write_view(
            resource,
            dst,
            DescriptorHeapKind::CbvSrvUav,
            ResourceUsage::SHADER_RESOURCE,
            "shader-resource view",
        )
    }

    fn create_constant_buffer_view(
        &self,
        resource: ResourceId,
        dst: CpuDescriptor,
        _desc: &prism_core::rhi::ConstantBufferViewDesc,
    ) -> Result<(), ResourceError> {
        self.write_view(
            resource,
            dst,
            DescriptorHeapKind::CbvSrvUav,
            ResourceUsage::CONSTANT_BUFFER,
            "constant-buffer view",
        )
    }

    fn create_unordered_access_view(
        &self,
        resource: ResourceId,
        dst: CpuDescriptor,
        _desc: &prism_core::rhi::UnorderedAccessViewDesc,
    ) -> Result<(), ResourceError> {
        self.write_view(
            resource,
            dst,
            DescriptorHeapKind::CbvSrvUav,
            ResourceUsage::UNORDERED_ACCESS,
            "unordered-access view",
        )
    }

    fn copy_descriptors(
        &self,
        kind: DescriptorHeapKind,
        dst: CpuDescriptor,
        src: CpuDescriptor,
        count: u32,
    ) {
        for i in 0..count {
            let src_addr = src.0 + (i * DESCRIPTOR_INCREMENT) as u64;
            let dst_addr = dst.0 + (i * DESCRIPTOR_INCREMENT) as u64;
            if !self.written_slots.lock().unwrap().contains(&src_addr) {
                log::error!("copy_descriptors from an unwritten {kind:?} slot {src_addr:#x}");
                panic!("descriptor copy from an unwritten slot");
            }
            match self.slot_heap(dst_addr) {
                Some((_, desc)) if desc.kind == kind => {
                    self.written_slots.lock().unwrap().insert(dst_addr);
                }
                _ => {
                    log::error!("copy_descriptors into invalid slot {dst_addr:#x}");
                    panic!("descriptor copy into an invalid slot");
                }
            }
        }
    }

    fn create_root_signature(
        &self,
        desc: &RootSignatureDesc,
    ) -> Result<RootSignatureId, PipelineError> {
        for parameter in &desc.parameters {
            if let prism_core::pipeline::RootParameter::DescriptorTable { ranges } = parameter {
                if ranges.is_empty() {
                    return Err(PipelineError::InvalidRootSignature(
                        "descriptor table with no ranges".to_string(),
                    ));
                }
            }
        }
        let id = self.next_id();
        self.root_signatures
            .lock()
            .unwrap()
            .insert(id, desc.parameters.len());
        Ok(RootSignatureId(id))
    }

    fn destroy_root_signature(&self, id: RootSignatureId) {
        self.root_signatures.lock().unwrap().remove(&id.0);
    }

    fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDesc,
        vertex_shader: &ShaderBytecode,
        pixel_shader: Option<&ShaderBytecode>,
    ) -> Result<PipelineId, PipelineError> {
        if vertex_shader.bytes.is_empty() {
            return Err(PipelineError::CompilationFailed {
                label: Some(desc.vertex_shader.label()),
                details: "empty vertex bytecode".to_string(),
            });
        }
        if desc.pixel_shader.is_some() && pixel_shader.is_none() {
            return Err(PipelineError::CompilationFailed {
                label: Some(desc.vertex_shader.label()),
                details: "pixel shader declared but no bytecode supplied".to_string(),
            });
        }
        if !self
            .root_signatures
            .lock()
            .unwrap()
            .contains_key(&desc.root_signature.0)
        {
            return Err(PipelineError::InvalidRootSignature(
                "unknown root signature".to_string(),
            ));
        }
        let id = self.next_id();
        self.pipelines.lock().unwrap().insert(id);
        Ok(PipelineId(id))
    }

    fn destroy_pipeline(&self, id: PipelineId) {
        self.pipelines.lock().unwrap().remove(&id.0);
    }

    fn create_command_allocator(&self, queue: QueueKind) -> Result<CommandAllocatorId, RhiError> {
        let id = self.next_id();
        self.allocators
            .lock()
            .unwrap()
            .insert(id, AllocatorEntry { queue, resets: 0 });
        Ok(CommandAllocatorId(id))
    }

    fn reset_command_allocator(&self, id: CommandAllocatorId) {
        match self.allocators.lock().unwrap().get_mut(&id.0) {
            Some(entry) => entry.resets += 1,
            None => {
                log::error!("Resetting unknown command allocator {id:?}");
                panic!("resetting an unknown command allocator");
            }
        }
    }

    fn create_command_list(
        &self,
        allocator: CommandAllocatorId,
        queue: QueueKind,
    ) -> Result<CommandListId, RhiError> {
        match self.allocators.lock().unwrap().get(&allocator.0) {
            Some(entry) if entry.queue != queue => {
                return Err(RhiError::Internal(format!(
                    "a {queue:?} command list cannot record into a {:?} allocator",
                    entry.queue
                )));
            }
            Some(_) => {}
            None => {
                return Err(RhiError::Internal(format!(
                    "command list created against unknown allocator {allocator:?}"
                )));
            }
        }
        let id = self.next_id();
        self.lists.lock().unwrap().insert(
            id,
            ListEntry {
                allocator,
                open: true,
                queue,
                commands: Vec::new(),
            },
        );
        Ok(CommandListId(id))
    }

    fn reset_command_list(&self, list: CommandListId, allocator: CommandAllocatorId) {
        let mut lists = self.lists.lock().unwrap();
        let entry = match lists.get_mut(&list.0) {
            Some(entry) => entry,
            None => {
                log::error!("Resetting unknown command list {list:?}");
                panic!("resetting an unknown command list");
            }
        };
        entry.allocator = allocator;
        entry.open = true;
        entry.commands.clear();
    }

    fn close_command_list(&self, list: CommandListId) {
        let mut lists = self.lists.lock().unwrap();
        let entry = match lists.get_mut(&list.0) {
            Some(entry) => entry,
            None => {
                log::error!("Closing unknown command list {list:?}");
                panic!("closing an unknown command list");
            }
        };
        if !entry.open {
            log::error!("Closing already-closed command list {list:?}");
            panic!("closing an already-closed command list");
        }
        entry.open = false;
    }

    fn cmd_set_viewport(&self, list: CommandListId, viewport: &Viewport) {
        self.record(list, RecordedCommand::SetViewport(*viewport));
    }

    fn cmd_set_scissor(&self, list: CommandListId, scissor: &ScissorRect) {
        self.record(list, RecordedCommand::SetScissor(*scissor));
    }

    fn cmd_set_pipeline(&self, list: CommandListId, pipeline: PipelineId) {
        self.record(list, RecordedCommand::SetPipeline(pipeline));
    }

    fn cmd_set_graphics_root_signature(&self, list: CommandListId, root_signature: RootSignatureId) {
        self.record(list, RecordedCommand::SetRootSignature(root_signature));
    }

    fn cmd_set_vertex_buffer(&self, list: CommandListId, slot: u32, binding: &VertexBufferBinding) {
        self.record(
            list,
            RecordedCommand::SetVertexBuffer {
                slot,
                binding: *binding,
            },
        );
    }

    fn cmd_set_index_buffer(&self, list: CommandListId, binding: &IndexBufferBinding) {
        self.record(list, RecordedCommand::SetIndexBuffer(*binding));
    }

    fn cmd_set_descriptor_heap(&self, list: CommandListId, heap: DescriptorHeapId) {
        self.record(list, RecordedCommand::SetDescriptorHeap(heap));
    }

    fn cmd_set_render_targets(
        &self,
        list: CommandListId,
        colors: &[CpuDescriptor],
        depth: Option<CpuDescriptor>,
    ) {
        self.record(
            list,
            RecordedCommand::SetRenderTargets {
                colors: colors.to_vec(),
                depth,
            },
        );
    }

    fn cmd_set_root_constants(
        &self,
        list: CommandListId,
        parameter: u32,
        dest_offset: u32,
        data: &[u32],
    ) {
        self.record(
            list,
            RecordedCommand::SetRootConstants {
                parameter,
                dest_offset,
                values: data.to_vec(),
            },
        );
    }

    fn cmd_set_root_constant_buffer(
        &self,
        list: CommandListId,
        parameter: u32,
        address: GpuVirtualAddress,
    ) {
        self.record(
            list,
            RecordedCommand::SetRootConstantBuffer { parameter, address },
        );
    }

    fn cmd_set_root_descriptor_table(&self, list: CommandListId, parameter: u32, base: GpuDescriptor) {
        self.record(
            list,
            RecordedCommand::SetRootDescriptorTable { parameter, base },
        );
    }

    fn cmd_clear_render_target(&self, list: CommandListId, view: CpuDescriptor, color: [f32; 4]) {
        self.record(list, RecordedCommand::ClearRenderTarget { view, color });
    }

    fn cmd_clear_depth_stencil(&self, list: CommandListId, view: CpuDescriptor, depth: f32, stencil: u8) {
        self.record(
            list,
            RecordedCommand::ClearDepthStencil {
                view,
                depth,
                stencil,
            },
        );
    }

    fn cmd_copy_buffer_region(
        &self,
        list: CommandListId,
        src: ResourceId,
        src_offset: u64,
        dst: ResourceId,
        dst_offset: u64,
        size: u64,
    ) {
        self.copies.fetch_add(1, Ordering::Relaxed);
        self.record(
            list,
            RecordedCommand::CopyBufferRegion {
                src,
                src_offset,
                dst,
                dst_offset,
                size,
            },
        );
    }

    fn cmd_copy_texture_region(
        &self,
        list: CommandListId,
        src: ResourceId,
        dst: ResourceId,
        region: &TextureCopyRegion,
    ) {
        self.copies.fetch_add(1, Ordering::Relaxed);
        self.record(
            list,
            RecordedCommand::CopyTextureRegion {
                src,
                dst,
                region: *region,
            },
        );
    }

    fn cmd_transition_barrier(
        &self,
        list: CommandListId,
        resource: ResourceId,
        before: ResourceState,
        after: ResourceState,
    ) {
        self.barriers.fetch_add(1, Ordering::Relaxed);
        self.record(
            list,
            RecordedCommand::Transition {
                resource,
                before,
                after,
            },
        );
    }

    fn cmd_draw_instanced(
        &self,
        list: CommandListId,
        vertex_count: u32,
        instance_count: u32,
        _first_vertex: u32,
        _first_instance: u32,
    ) {
        self.draws.fetch_add(1, Ordering::Relaxed);
        self.record(
            list,
            RecordedCommand::Draw {
                vertex_count,
                instance_count,
            },
        );
    }

    fn cmd_draw_indexed_instanced(
        &self,
        list: CommandListId,
        index_count: u32,
        instance_count: u32,
        _first_index: u32,
        _base_vertex: i32,
        _first_instance: u32,
    ) {
        self.draws.fetch_add(1, Ordering::Relaxed);
        self.record(
            list,
            RecordedCommand::DrawIndexed {
                index_count,
                instance_count,
            },
        );
    }

    fn cmd_begin_marker(&self, list: CommandListId, label: &str) {
        self.record(list, RecordedCommand::BeginMarker(label.to_string()));
    }

    fn cmd_end_marker(&self, list: CommandListId) {
        self.record(list, RecordedCommand::EndMarker);
    }

    fn submit(&self, queue: QueueKind, list: CommandListId) {
        let lists = self.lists.lock().unwrap();
        let entry = match lists.get(&list.0) {
            Some(entry) => entry,
            None => {
                log::error!("Submitting unknown command list {list:?}");
                panic!("submitting an unknown command list");
            }
        };
        if entry.open {
            log::error!("Submitting command list {list:?} before closing it");
            panic!("submitting an open command list");
        }
        if entry.queue != queue {
            log::error!(
                "Submitting a {:?} command list to the {queue:?} queue",
                entry.queue
            );
            panic!("command list submitted to a queue of the wrong kind");
        }
        self.submissions.fetch_add(1, Ordering::Relaxed);
    }

    fn create_fence(&self) -> Result<FenceId, RhiError> {
        let id = self.next_id();
        self.fences.lock().unwrap().insert(id, 0);
        Ok(FenceId(id))
    }

    fn signal_fence(&self, _queue: QueueKind, fence: FenceId, value: u64) {
        // The headless GPU is infinitely fast: a signal completes at once.
        let mut fences = self.fences.lock().unwrap();
        match fences.get_mut(&fence.0) {
            Some(completed) => *completed = (*completed).max(value),
            None => {
                log::error!("Signaling unknown fence {fence:?}");
                panic!("signaling an unknown fence");
            }
        }
    }

    fn fence_completed_value(&self, fence: FenceId) -> u64 {
        self.fence_queries.fetch_add(1, Ordering::Relaxed);
        match self.fences.lock().unwrap().get(&fence.0) {
            Some(completed) => *completed,
            None => {
                log::error!("Querying unknown fence {fence:?}");
                panic!("querying an unknown fence");
            }
        }
    }

    fn wait_fence(&self, fence: FenceId, value: u64) {
        // With instant completion a wait can only be satisfied or a bug.
        let completed = match self.fences.lock().unwrap().get(&fence.0) {
            Some(completed) => *completed,
            None => {
                log::error!("Waiting on unknown fence {fence:?}");
                panic!("waiting on an unknown fence");
            }
        };
        if completed < value {
            log::error!(
                "Wait on fence {fence:?} for value {value} that was never signaled (completed {completed})"
            );
            panic!("wait on a fence value that was never signaled");
        }
    }
}
