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

//! Root signature and graphics pipeline state descriptions.
//!
//! A pipeline state object is an immutable bundle of shader programs and
//! fixed-function state, compiled once and cached by description; the root
//! signature describes the binding layout the shaders expect.

use crate::rhi::format::Format;
use crate::rhi::handle::RootSignatureId;
use crate::rhi::types::{PrimitiveTopology, SampleCount};
use crate::shader::ShaderKey;

/// The kind of descriptors a table range binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorRangeKind {
    /// Shader-resource views.
    ShaderResource,
    /// Unordered-access views.
    UnorderedAccess,
    /// Constant-buffer views.
    ConstantBuffer,
}

/// A contiguous register range inside a descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorRange {
    /// What the range binds.
    pub kind: DescriptorRangeKind,
    /// First shader register (e.g. the `0` of `t0`).
    pub base_register: u32,
    /// Number of consecutive registers.
    pub count: u32,
}

/// One root parameter of a root signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootParameter {
    /// Inline 32-bit constants written directly into the root arguments.
    Constants {
        /// The `b` register the constants appear at.
        shader_register: u32,
        /// Number of 32-bit values.
        num_values: u32,
    },
    /// A raw constant-buffer address bound at a register.
    ConstantBuffer {
        /// The `b` register the buffer appears at.
        shader_register: u32,
    },
    /// A table of descriptor ranges resolved through the shader-visible heap.
    DescriptorTable {
        /// The ranges the table spans.
        ranges: Vec<DescriptorRange>,
    },
}

/// The binding layout shared by a family of pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootSignatureDesc {
    /// Root parameters, bound by index.
    pub parameters: Vec<RootParameter>,
}

/// Which triangle faces are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling.
    None,
    /// Discard front faces.
    Front,
    /// Discard back faces.
    #[default]
    Back,
}

/// Whether triangles are filled or outlined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    /// Filled triangles.
    #[default]
    Solid,
    /// Wireframe outlines.
    Wireframe,
}

/// Comparison function for depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes when the incoming value is smaller.
    Less,
    /// Passes on equality.
    Equal,
    /// Passes when smaller or equal.
    LessEqual,
    /// Passes when greater.
    Greater,
    /// Passes on inequality.
    NotEqual,
    /// Passes when greater or equal.
    GreaterEqual,
    /// Always passes.
    Always,
}

/// Fixed-function rasterizer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterizerDesc {
    /// Face culling.
    pub cull_mode: CullMode,
    /// Fill or wireframe.
    pub fill_mode: FillMode,
    /// Winding order of front faces.
    pub front_counter_clockwise: bool,
}

impl Default for RasterizerDesc {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            fill_mode: FillMode::Solid,
            front_counter_clockwise: false,
        }
    }
}

/// Fixed-function depth/stencil state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilStateDesc {
    /// Enables the depth test.
    pub depth_enable: bool,
    /// Enables depth writes.
    pub depth_write: bool,
    /// Comparison used by the depth test.
    pub compare: CompareFunction,
}

impl Default for DepthStencilStateDesc {
    fn default() -> Self {
        Self {
            depth_enable: true,
            depth_write: true,
            compare: CompareFunction::Less,
        }
    }
}

/// Fixed-function blend state; one switch is enough for the passes in tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlendStateDesc {
    /// Standard source-over alpha blending on all targets.
    pub alpha_blend: bool,
}

/// One vertex attribute in the input layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Semantic name the shader binds, e.g. `POSITION`.
    pub semantic: String,
    /// Element format.
    pub format: Format,
    /// Byte offset inside the vertex.
    pub offset: u32,
    /// Vertex-buffer input slot.
    pub buffer_slot: u32,
}

/// A complete graphics pipeline description.
///
/// Pipelines are cached by name with description diffing in the resource
/// context; the shader keys tie the cache entry to the hot-reload flags of
/// the modules it was compiled from.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsPipelineDesc {
    /// Binding layout.
    pub root_signature: RootSignatureId,
    /// Vertex-stage module.
    pub vertex_shader: ShaderKey,
    /// Pixel-stage module, absent for depth-only pipelines.
    pub pixel_shader: Option<ShaderKey>,
    /// Vertex input layout; empty for vertex-id-driven draws.
    pub input_layout: Vec<VertexAttribute>,
    /// Primitive assembly.
    pub topology: PrimitiveTopology,
    /// Rasterizer state.
    pub rasterizer: RasterizerDesc,
    /// Depth/stencil state.
    pub depth_stencil: DepthStencilStateDesc,
    /// Blend state.
    pub blend: BlendStateDesc,
    /// Formats of the bound render targets, in slot order.
    pub render_target_formats: Vec<Format>,
    /// Format of the depth target, if any.
    pub depth_format: Option<Format>,
    /// Sample count of the targets.
    pub sample_count: SampleCount,
}

impl GraphicsPipelineDesc {
    /// The shader modules the pipeline is compiled from.
    pub fn shader_keys(&self) -> Vec<&ShaderKey> {
        let mut keys = vec![&self.vertex_shader];
        if let Some(ps) = &self.pixel_shader {
            keys.push(ps);
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::ShaderStage;

    fn key(entry: &str, stage: ShaderStage) -> ShaderKey {
        ShaderKey {
            path: "shaders/mesh.hlsl".to_string(),
            entry_point: entry.to_string(),
            stage,
        }
    }

    #[test]
    fn shader_keys_cover_both_stages() {
        let desc = GraphicsPipelineDesc {
            root_signature: RootSignatureId(1),
            vertex_shader: key("VSMain", ShaderStage::Vertex),
            pixel_shader: Some(key("PSMain", ShaderStage::Pixel)),
            input_layout: Vec::new(),
            topology: PrimitiveTopology::TriangleList,
            rasterizer: RasterizerDesc::default(),
            depth_stencil: DepthStencilStateDesc::default(),
            blend: BlendStateDesc::default(),
            render_target_formats: vec![Format::Rgba8Unorm],
            depth_format: Some(Format::D32Float),
            sample_count: SampleCount::One,
        };
        assert_eq!(desc.shader_keys().len(), 2);

        let depth_only = GraphicsPipelineDesc {
            pixel_shader: None,
            ..desc
        };
        assert_eq!(depth_only.shader_keys().len(), 1);
    }
}
