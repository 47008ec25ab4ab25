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

//! Typed views onto GPU resources.
//!
//! A view is a typed interpretation of a resource written into a descriptor
//! slot. It holds a non-owning back-reference to its backing resource (the
//! resource id plus the resource version it was built against), never
//! shared ownership. When the backing resource is recreated, the version
//! mismatch marks the view stale and it is rebuilt into the same slot on
//! next access.

use crate::rhi::descriptor::{DescriptorAllocation, DescriptorHeapKind};
use crate::rhi::format::Format;
use crate::rhi::handle::{CpuDescriptor, GpuDescriptor, ResourceId};

/// The kind of a resource view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// Render-target view (RTV).
    RenderTarget,
    /// Depth-stencil view (DSV).
    DepthStencil,
    /// Shader-resource view (SRV).
    ShaderResource,
    /// Constant-buffer view (CBV).
    ConstantBuffer,
    /// Unordered-access view (UAV).
    UnorderedAccess,
}

impl ViewKind {
    /// The heap kind descriptors of this view kind live in.
    pub const fn heap_kind(&self) -> DescriptorHeapKind {
        match self {
            ViewKind::RenderTarget => DescriptorHeapKind::Rtv,
            ViewKind::DepthStencil => DescriptorHeapKind::Dsv,
            ViewKind::ShaderResource | ViewKind::ConstantBuffer | ViewKind::UnorderedAccess => {
                DescriptorHeapKind::CbvSrvUav
            }
        }
    }
}

/// Parameters of a render-target view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetViewDesc {
    /// Format the target is written as.
    pub format: Format,
    /// Mip level the view covers.
    pub mip_slice: u32,
}

/// Parameters of a depth-stencil view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilViewDesc {
    /// Depth format of the view.
    pub format: Format,
    /// Mip level the view covers.
    pub mip_slice: u32,
    /// If `true`, the view allows depth testing but not depth writes.
    pub read_only: bool,
}

/// Parameters of a shader-resource view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderResourceViewDesc {
    /// Format the resource is sampled as.
    pub format: Format,
    /// First mip level visible to shaders.
    pub most_detailed_mip: u32,
    /// Number of mip levels visible to shaders.
    pub mip_levels: u32,
}

/// Parameters of a constant-buffer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBufferViewDesc {
    /// Byte offset of the viewed region from the start of the buffer.
    pub offset: u64,
    /// Size of the viewed region; must be a multiple of 256.
    pub size: u32,
}

/// Parameters of an unordered-access view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnorderedAccessViewDesc {
    /// Format the resource is accessed as.
    pub format: Format,
    /// Mip level the view covers.
    pub mip_slice: u32,
}

/// A view description of any kind, as cached by the resource context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResourceViewDesc {
    /// A render-target view.
    RenderTarget(RenderTargetViewDesc),
    /// A depth-stencil view.
    DepthStencil(DepthStencilViewDesc),
    /// A shader-resource view.
    ShaderResource(ShaderResourceViewDesc),
    /// A constant-buffer view.
    ConstantBuffer(ConstantBufferViewDesc),
    /// An unordered-access view.
    UnorderedAccess(UnorderedAccessViewDesc),
}

impl ResourceViewDesc {
    /// The kind of view this description builds.
    pub const fn kind(&self) -> ViewKind {
        match self {
            ResourceViewDesc::RenderTarget(_) => ViewKind::RenderTarget,
            ResourceViewDesc::DepthStencil(_) => ViewKind::DepthStencil,
            ResourceViewDesc::ShaderResource(_) => ViewKind::ShaderResource,
            ResourceViewDesc::ConstantBuffer(_) => ViewKind::ConstantBuffer,
            ResourceViewDesc::UnorderedAccess(_) => ViewKind::UnorderedAccess,
        }
    }
}

/// A typed interpretation of a resource at a descriptor slot.
///
/// Copyable by design: the view carries addresses and ids, not ownership.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RhiResourceView {
    kind: ViewKind,
    resource: ResourceId,
    built_version: u64,
    slot: DescriptorAllocation,
}

impl RhiResourceView {
    /// Wraps a descriptor slot the backend has written a view into.
    pub fn new(
        kind: ViewKind,
        resource: ResourceId,
        built_version: u64,
        slot: DescriptorAllocation,
    ) -> Self {
        Self {
            kind,
            resource,
            built_version,
            slot,
        }
    }

    /// The kind of the view.
    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    /// The backing resource the view interprets.
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    /// The resource version the view was built against; a mismatch with the
    /// backing resource's current version means the view is stale.
    pub fn built_version(&self) -> u64 {
        self.built_version
    }

    /// The descriptor slot the view occupies.
    pub fn slot(&self) -> DescriptorAllocation {
        self.slot
    }

    /// The CPU descriptor address of the view.
    pub fn cpu(&self) -> CpuDescriptor {
        self.slot.cpu
    }

    /// The GPU descriptor address, present when the slot is shader visible.
    pub fn gpu(&self) -> Option<GpuDescriptor> {
        self.slot.gpu
    }

    /// Asserts the view is of `kind`; binding a view of the wrong kind is a
    /// contract violation.
    pub fn expect_kind(&self, kind: ViewKind) {
        if self.kind != kind {
            log::error!("Expected a {kind:?} view, found {:?}", self.kind);
            panic!("resource view bound as the wrong kind");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::handle::DescriptorHeapId;

    fn slot() -> DescriptorAllocation {
        DescriptorAllocation {
            heap: DescriptorHeapId(7),
            index: 3,
            count: 1,
            cpu: CpuDescriptor(0x100),
            gpu: None,
        }
    }

    #[test]
    fn view_kind_maps_to_heap_kind() {
        assert_eq!(ViewKind::RenderTarget.heap_kind(), DescriptorHeapKind::Rtv);
        assert_eq!(ViewKind::DepthStencil.heap_kind(), DescriptorHeapKind::Dsv);
        assert_eq!(
            ViewKind::ShaderResource.heap_kind(),
            DescriptorHeapKind::CbvSrvUav
        );
        assert_eq!(
            ViewKind::ConstantBuffer.heap_kind(),
            DescriptorHeapKind::CbvSrvUav
        );
    }

    #[test]
    #[should_panic(expected = "wrong kind")]
    fn expect_kind_panics_on_mismatch() {
        let view = RhiResourceView::new(ViewKind::ShaderResource, ResourceId(1), 0, slot());
        view.expect_kind(ViewKind::RenderTarget);
    }
}
