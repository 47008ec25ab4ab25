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

//! GPU resource descriptions and the owned resource wrapper.

use crate::rhi::format::Format;
use crate::rhi::handle::{GpuVirtualAddress, ResourceId};
use crate::rhi::types::{ClearValue, Extent2D, HeapType, IndexFormat, ResourceState, SampleCount};

crate::prism_bitflags! {
    /// The ways a resource may be bound over its lifetime.
    pub struct ResourceUsage: u32 {
        /// May be bound as a color render target.
        const RENDER_TARGET = 1 << 0;
        /// May be bound as a depth/stencil target.
        const DEPTH_STENCIL = 1 << 1;
        /// May be read from shaders through an SRV.
        const SHADER_RESOURCE = 1 << 2;
        /// May be read and written from shaders through a UAV.
        const UNORDERED_ACCESS = 1 << 3;
        /// May be the source of a copy.
        const COPY_SRC = 1 << 4;
        /// May be the destination of a copy.
        const COPY_DST = 1 << 5;
        /// May be bound as a vertex buffer.
        const VERTEX_BUFFER = 1 << 6;
        /// May be bound as an index buffer.
        const INDEX_BUFFER = 1 << 7;
        /// May be bound as a constant buffer through a CBV or root binding.
        const CONSTANT_BUFFER = 1 << 8;
    }
}

/// Description of a raw GPU buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferDesc {
    /// Size of the allocation in bytes.
    pub size: u64,
    /// The heap the buffer lives in.
    pub heap: HeapType,
    /// Allowed bindings.
    pub usage: ResourceUsage,
    /// The state the buffer starts its life in.
    pub initial_state: ResourceState,
}

impl BufferDesc {
    /// Returns the size rounded up to the constant-buffer alignment (256 B)
    /// when the buffer can be bound as a constant buffer.
    pub const fn aligned_size(&self) -> u64 {
        if self.usage.contains(ResourceUsage::CONSTANT_BUFFER) {
            (self.size + 255) & !255
        } else {
            self.size
        }
    }
}

/// Description of a two-dimensional GPU texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    /// Width and height in texels.
    pub extent: Extent2D,
    /// Texel format.
    pub format: Format,
    /// Number of mip levels.
    pub mip_levels: u32,
    /// Samples per texel for MSAA targets.
    pub sample_count: SampleCount,
    /// The heap the texture lives in.
    pub heap: HeapType,
    /// Allowed bindings.
    pub usage: ResourceUsage,
    /// The state the texture starts its life in.
    pub initial_state: ResourceState,
    /// Optimized clear value for render/depth targets.
    pub clear_value: Option<ClearValue>,
}

/// Description of a committed GPU allocation.
///
/// Equality of descriptions is what drives reuse in the resource context: an
/// unchanged description means the existing allocation is returned untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceDesc {
    /// A raw buffer.
    Buffer(BufferDesc),
    /// A 2D texture.
    Texture2D(TextureDesc),
}

impl ResourceDesc {
    /// The state the resource starts its life in.
    pub fn initial_state(&self) -> ResourceState {
        match self {
            ResourceDesc::Buffer(desc) => desc.initial_state,
            ResourceDesc::Texture2D(desc) => desc.initial_state,
        }
    }

    /// The heap the resource is allocated from.
    pub fn heap(&self) -> HeapType {
        match self {
            ResourceDesc::Buffer(desc) => desc.heap,
            ResourceDesc::Texture2D(desc) => desc.heap,
        }
    }

    /// The allowed bindings of the resource.
    pub fn usage(&self) -> ResourceUsage {
        match self {
            ResourceDesc::Buffer(desc) => desc.usage,
            ResourceDesc::Texture2D(desc) => desc.usage,
        }
    }

    /// An estimate of the allocation size in bytes, used for telemetry.
    pub fn size_in_bytes(&self) -> u64 {
        match self {
            ResourceDesc::Buffer(desc) => desc.aligned_size(),
            ResourceDesc::Texture2D(desc) => {
                let texels = desc.extent.width as u64 * desc.extent.height as u64;
                // Mip chains add at most a third on top of level zero.
                let base = texels * desc.format.bytes_per_texel() as u64;
                let with_mips = if desc.mip_levels > 1 { base + base / 3 } else { base };
                with_mips * desc.sample_count.as_u32() as u64
            }
        }
    }
}

/// An owned GPU memory allocation with tracked usage state.
///
/// The resource context is the exclusive owner of these; everything else
/// refers to them through [`ResourceId`] or a view's back-reference. The
/// tracked state is mutated only by the command list when it records a
/// transition barrier. If two code paths transition the same resource with
/// different beliefs about its prior state, the recorded barrier is wrong,
/// which is why transitions are funneled through a single owner per frame.
#[derive(Debug)]
pub struct RhiResource {
    id: ResourceId,
    name: String,
    desc: ResourceDesc,
    state: ResourceState,
    gpu_address: GpuVirtualAddress,
}

impl RhiResource {
    /// Wraps a freshly created backend allocation.
    pub fn new(
        id: ResourceId,
        name: impl Into<String>,
        desc: ResourceDesc,
        gpu_address: GpuVirtualAddress,
    ) -> Self {
        let state = desc.initial_state();
        Self {
            id,
            name: name.into(),
            desc,
            state,
            gpu_address,
        }
    }

    /// The backend handle of the allocation.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// The debug name the resource was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The description the resource was created from.
    pub fn desc(&self) -> &ResourceDesc {
        &self.desc
    }

    /// The usage state the resource is currently tracked in.
    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// The GPU virtual address of the allocation.
    pub fn gpu_address(&self) -> GpuVirtualAddress {
        self.gpu_address
    }

    // State mutation is reserved for the command list's barrier recording.
    pub(crate) fn set_state(&mut self, state: ResourceState) {
        self.state = state;
    }
}

/// A vertex-buffer binding: a region of a buffer plus the vertex stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferBinding {
    /// The buffer to read vertices from.
    pub resource: ResourceId,
    /// Byte offset of the first vertex.
    pub offset: u64,
    /// Size of the bound region in bytes.
    pub size: u64,
    /// Distance between consecutive vertices in bytes.
    pub stride: u32,
}

/// An index-buffer binding: a region of a buffer plus the index width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBufferBinding {
    /// The buffer to read indices from.
    pub resource: ResourceId,
    /// Byte offset of the first index.
    pub offset: u64,
    /// Size of the bound region in bytes.
    pub size: u64,
    /// Width of one index.
    pub format: IndexFormat,
}

/// The destination placement of a texture copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureCopyRegion {
    /// Destination X offset in texels.
    pub dst_x: u32,
    /// Destination Y offset in texels.
    pub dst_y: u32,
    /// Width of the copied region in texels.
    pub width: u32,
    /// Height of the copied region in texels.
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_texture_desc() -> TextureDesc {
        TextureDesc {
            extent: Extent2D::new(1920, 1080),
            format: Format::Rgba8Unorm,
            mip_levels: 1,
            sample_count: SampleCount::One,
            heap: HeapType::Default,
            usage: ResourceUsage::RENDER_TARGET.with(ResourceUsage::SHADER_RESOURCE),
            initial_state: ResourceState::Common,
            clear_value: Some(ClearValue::Color([0.0, 0.0, 0.0, 1.0])),
        }
    }

    #[test]
    fn constant_buffer_alignment() {
        let desc = BufferDesc {
            size: 100,
            heap: HeapType::Upload,
            usage: ResourceUsage::CONSTANT_BUFFER,
            initial_state: ResourceState::GenericRead,
        };
        assert_eq!(desc.aligned_size(), 256);

        let raw = BufferDesc {
            size: 100,
            heap: HeapType::Default,
            usage: ResourceUsage::VERTEX_BUFFER,
            initial_state: ResourceState::Common,
        };
        assert_eq!(raw.aligned_size(), 100);
    }

    #[test]
    fn resource_starts_in_initial_state() {
        let desc = ResourceDesc::Texture2D(test_texture_desc());
        let resource = RhiResource::new(ResourceId(1), "Albedo", desc, GpuVirtualAddress(0x1000));
        assert_eq!(resource.state(), ResourceState::Common);
        assert_eq!(resource.name(), "Albedo");
    }

    #[test]
    fn identical_descriptions_compare_equal() {
        let a = ResourceDesc::Texture2D(test_texture_desc());
        let b = ResourceDesc::Texture2D(test_texture_desc());
        assert_eq!(a, b);

        let mut changed = test_texture_desc();
        changed.extent = Extent2D::new(1280, 720);
        assert_ne!(a, ResourceDesc::Texture2D(changed));
    }

    #[test]
    fn texture_size_estimate_counts_mips() {
        let mut desc = test_texture_desc();
        desc.mip_levels = 1;
        let flat = ResourceDesc::Texture2D(desc.clone()).size_in_bytes();
        desc.mip_levels = 4;
        let mipped = ResourceDesc::Texture2D(desc).size_in_bytes();
        assert!(mipped > flat);
    }
}
