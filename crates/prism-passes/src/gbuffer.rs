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

//! The geometry-buffer pass.
//!
//! Rasterizes every visual item into the GBuffer targets (albedo, normals,
//! material parameters, depth). The deferred lighting pass consumes the
//! targets through shader-resource views.

use prism_core::graph::{GraphError, RegisterContext, RenderPass, RenderPassContext, ResourceContext};
use prism_core::pipeline::{
    BlendStateDesc, DepthStencilStateDesc, GraphicsPipelineDesc, RasterizerDesc, RootParameter,
    RootSignatureDesc, VertexAttribute,
};
use prism_core::rhi::{
    BufferDesc, ClearValue, Color, DepthStencilViewDesc, Format, HeapType, PrimitiveTopology,
    RenderTargetViewDesc, ResourceState, ResourceUsage, RootSignatureId, SampleCount,
    ShaderResourceViewDesc, TextureDesc,
};
use prism_core::shader::{ShaderKey, ShaderLibrary, ShaderRequest, ShaderStage};

/// Root parameter 0: the per-frame constant buffer.
const PARAM_FRAME_CONSTANTS: u32 = 0;
/// Root parameter 1: per-object root constants (model matrix + tint).
const PARAM_OBJECT_CONSTANTS: u32 = 1;
/// 16 matrix values plus 4 tint values.
const OBJECT_CONSTANT_COUNT: u32 = 20;

/// Per-frame constants consumed by the geometry shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameConstants {
    view_projection: [[f32; 4]; 4],
}

/// The GBuffer color target descriptions, in render-target slot order.
pub const GBUFFER_COLOR_TARGETS: [(&str, Format); 3] = [
    ("GBufferAlbedoTexture", Format::Rgba8Unorm),
    ("GBufferNormalTexture", Format::Rgba16Float),
    ("GBufferMaterialTexture", Format::Rgba8Unorm),
];

/// Logical name of the depth target.
pub const GBUFFER_DEPTH: &str = "GBufferDepthTexture";
/// Logical name of the per-frame constant buffer.
pub const FRAME_CONSTANTS: &str = "FrameConstantBuffer";

/// Rasterizes the frame's visual items into the GBuffer targets.
#[derive(Debug)]
pub struct GBufferPass {
    shader_path: String,
    root_signature: Option<RootSignatureId>,
    vertex_shader: Option<ShaderKey>,
    pixel_shader: Option<ShaderKey>,
}

impl GBufferPass {
    /// Creates the pass; `shader_path` resolves against the compiler root.
    pub fn new(shader_path: impl Into<String>) -> Self {
        Self {
            shader_path: shader_path.into(),
            root_signature: None,
            vertex_shader: None,
            pixel_shader: None,
        }
    }

    fn pipeline_desc(&self) -> GraphicsPipelineDesc {
        GraphicsPipelineDesc {
            root_signature: self.root_signature.expect("pass not initialized"),
            vertex_shader: self.vertex_shader.clone().expect("pass not initialized"),
            pixel_shader: self.pixel_shader.clone(),
            input_layout: vec![
                VertexAttribute {
                    semantic: "POSITION".to_string(),
                    format: Format::Rgb32Float,
                    offset: 0,
                    buffer_slot: 0,
                },
                VertexAttribute {
                    semantic: "NORMAL".to_string(),
                    format: Format::Rgb32Float,
                    offset: 12,
                    buffer_slot: 0,
                },
                VertexAttribute {
                    semantic: "TEXCOORD".to_string(),
                    format: Format::Rg32Float,
                    offset: 24,
                    buffer_slot: 0,
                },
            ],
            topology: PrimitiveTopology::TriangleList,
            rasterizer: RasterizerDesc::default(),
            depth_stencil: DepthStencilStateDesc::default(),
            blend: BlendStateDesc::default(),
            render_target_formats: GBUFFER_COLOR_TARGETS.iter().map(|(_, f)| *f).collect(),
            depth_format: Some(Format::D32Float),
            sample_count: SampleCount::One,
        }
    }
}

impl RenderPass for GBufferPass {
    fn name(&self) -> &str {
        "GBuffer"
    }

    fn initialize(
        &mut self,
        resources: &mut ResourceContext,
        shaders: &mut ShaderLibrary,
    ) -> Result<(), GraphError> {
        self.vertex_shader = Some(shaders.load(ShaderRequest {
            key: ShaderKey {
                path: self.shader_path.clone(),
                entry_point: "VSMain".to_string(),
                stage: ShaderStage::Vertex,
            },
            target_profile: "vs_6_6".to_string(),
        })?);
        self.pixel_shader = Some(shaders.load(ShaderRequest {
            key: ShaderKey {
                path: self.shader_path.clone(),
                entry_point: "PSMain".to_string(),
                stage: ShaderStage::Pixel,
            },
            target_profile: "ps_6_6".to_string(),
        })?);

        let root_signature = resources.device().create_root_signature(&RootSignatureDesc {
            parameters: vec![
                RootParameter::ConstantBuffer { shader_register: 0 },
                RootParameter::Constants {
                    shader_register: 1,
                    num_values: OBJECT_CONSTANT_COUNT,
                },
            ],
        })?;
        self.root_signature = Some(root_signature);
        Ok(())
    }

    fn register_input_output(&mut self, ctx: &mut RegisterContext<'_>) -> Result<(), GraphError> {
        let extent = ctx.frame.extent;

        for (name, format) in GBUFFER_COLOR_TARGETS {
            ctx.resources.create_texture_2d_resource(
                name,
                TextureDesc {
                    extent,
                    format,
                    mip_levels: 1,
                    sample_count: SampleCount::One,
                    heap: HeapType::Default,
                    usage: ResourceUsage::RENDER_TARGET.with(ResourceUsage::SHADER_RESOURCE),
                    initial_state: ResourceState::RenderTarget,
                    clear_value: Some(ClearValue::Color([0.0, 0.0, 0.0, 0.0])),
                },
            )?;
            ctx.resources.create_render_target_view(
                &format!("{name}Rtv"),
                name,
                RenderTargetViewDesc {
                    format,
                    mip_slice: 0,
                },
            )?;
            ctx.resources.create_shader_resource_view(
                &format!("{name}Srv"),
                name,
                ShaderResourceViewDesc {
                    format,
                    most_detailed_mip: 0,
                    mip_levels: 1,
                },
            )?;
            ctx.writes(name, ResourceState::RenderTarget);
        }

        ctx.resources.create_texture_2d_resource(
            GBUFFER_DEPTH,
            TextureDesc {
                extent,
                format: Format::D32Float,
                mip_levels: 1,
                sample_count: SampleCount::One,
                heap: HeapType::Default,
                usage: ResourceUsage::DEPTH_STENCIL.with(ResourceUsage::SHADER_RESOURCE),
                initial_state: ResourceState::DepthWrite,
                clear_value: Some(ClearValue::DepthStencil {
                    depth: 1.0,
                    stencil: 0,
                }),
            },
        )?;
        ctx.resources.create_depth_stencil_view(
            "GBufferDepthDsv",
            GBUFFER_DEPTH,
            DepthStencilViewDesc {
                format: Format::D32Float,
                mip_slice: 0,
                read_only: false,
            },
        )?;
        // Depth is sampled as a single-channel float by the lighting pass.
        ctx.resources.create_shader_resource_view(
            "GBufferDepthSrv",
            GBUFFER_DEPTH,
            ShaderResourceViewDesc {
                format: Format::R32Float,
                most_detailed_mip: 0,
                mip_levels: 1,
            },
        )?;
        ctx.writes(GBUFFER_DEPTH, ResourceState::DepthWrite);

        ctx.resources.create_buffer_resource(
            FRAME_CONSTANTS,
            BufferDesc {
                size: 256,
                heap: HeapType::Upload,
                usage: ResourceUsage::CONSTANT_BUFFER,
                initial_state: ResourceState::GenericRead,
            },
        )?;

        ctx.resources.register_pipeline_state(
            ctx.shaders,
            "GBufferPipeline",
            self.pipeline_desc(),
        )?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderPassContext<'_>) -> Result<(), GraphError> {
        for (name, _) in GBUFFER_COLOR_TARGETS {
            ctx.transition(name, ResourceState::RenderTarget);
        }
        ctx.transition(GBUFFER_DEPTH, ResourceState::DepthWrite);

        // Upload the frame constants from the context's shadow state.
        let constants = FrameConstants {
            view_projection: ctx.graphics.view_projection().to_cols_array_2d(),
        };
        let frame_cb = ctx.resources.resource(FRAME_CONSTANTS).id();
        ctx.resources
            .device()
            .write_buffer(frame_cb, 0, bytemuck::bytes_of(&constants))?;

        let albedo = ctx.resources.view("GBufferAlbedoTextureRtv");
        let normal = ctx.resources.view("GBufferNormalTextureRtv");
        let material = ctx.resources.view("GBufferMaterialTextureRtv");
        let depth = ctx.resources.view("GBufferDepthDsv");

        ctx.graphics
            .set_render_targets(&[&albedo, &normal, &material], Some(&depth));
        ctx.graphics.clear_color(&albedo, Color::TRANSPARENT);
        ctx.graphics.clear_color(&normal, Color::TRANSPARENT);
        ctx.graphics.clear_color(&material, Color::TRANSPARENT);
        ctx.graphics.clear_depth(&depth, 1.0, 0);
        ctx.graphics
            .set_target_region(&ctx.frame.viewport, &ctx.frame.scissor);

        let pipeline = ctx.resources.pipeline_state("GBufferPipeline");
        let root_signature = self.root_signature.expect("pass not initialized");
        let frame_cb_resource = ctx.resources.resource(FRAME_CONSTANTS).gpu_address();

        let list = ctx.graphics.list_mut();
        list.set_pipeline_state(pipeline);
        list.set_graphics_root_signature(root_signature);
        list.set_root_constant_buffer(PARAM_FRAME_CONSTANTS, frame_cb_resource);

        for visual in ctx.visuals {
            let mut object_constants = [0u32; OBJECT_CONSTANT_COUNT as usize];
            let matrix = visual.model_matrix.to_cols_array();
            object_constants[..16].copy_from_slice(bytemuck::cast_slice(&matrix));
            object_constants[16..].copy_from_slice(bytemuck::cast_slice(&visual.base_color));

            list.set_root_constants(PARAM_OBJECT_CONSTANTS, 0, &object_constants);
            list.set_vertex_buffer(0, &visual.vertex_buffer);
            match &visual.index_buffer {
                Some(index_buffer) => {
                    list.set_index_buffer(index_buffer);
                    list.draw_indexed_instanced(visual.index_count, 1, 0, 0, 0);
                }
                None => list.draw_instanced(visual.vertex_count, 1, 0, 0),
            }
        }
        Ok(())
    }
}
