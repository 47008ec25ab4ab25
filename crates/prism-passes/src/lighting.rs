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

//! The deferred lighting pass.
//!
//! Reads the GBuffer targets through a shader-visible descriptor table and
//! resolves lighting into the scene color target with one fullscreen
//! triangle.

use crate::gbuffer::{GBUFFER_COLOR_TARGETS, GBUFFER_DEPTH};
use crate::world::SceneLighting;
use prism_core::graph::{GraphError, RegisterContext, RenderPass, RenderPassContext, ResourceContext};
use prism_core::pipeline::{
    BlendStateDesc, CompareFunction, CullMode, DepthStencilStateDesc, DescriptorRange,
    DescriptorRangeKind, GraphicsPipelineDesc, RasterizerDesc, RootParameter, RootSignatureDesc,
};
use prism_core::rhi::{
    BufferDesc, ClearValue, ConstantBufferViewDesc, Format, HeapType, PrimitiveTopology,
    ResourceState, ResourceUsage, RootSignatureId, SampleCount, TextureDesc,
};
use prism_core::shader::{ShaderKey, ShaderLibrary, ShaderRequest, ShaderStage};
use std::sync::{Arc, RwLock};

/// Logical name of the lit scene color target.
pub const SCENE_COLOR: &str = "SceneColorTexture";
/// Logical name of the lighting constant buffer.
const LIGHTING_CONSTANTS: &str = "LightingConstantBuffer";

/// Root parameter 0: one table of [CBV b0, SRV t0..t3].
const PARAM_LIGHTING_TABLE: u32 = 0;
/// Table slot count: the CBV plus four GBuffer SRVs.
const TABLE_SLOTS: u32 = 5;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct LightingConstants {
    sun_direction: [f32; 3],
    ambient: f32,
    sun_color: [f32; 3],
    _padding: f32,
}

/// Resolves the GBuffer into the lit scene color.
#[derive(Debug)]
pub struct DeferredLightingPass {
    shader_path: String,
    lighting: Arc<RwLock<SceneLighting>>,
    root_signature: Option<RootSignatureId>,
    vertex_shader: Option<ShaderKey>,
    pixel_shader: Option<ShaderKey>,
}

impl DeferredLightingPass {
    /// Creates the pass over a shared view of the scene lighting.
    pub fn new(shader_path: impl Into<String>, lighting: Arc<RwLock<SceneLighting>>) -> Self {
        Self {
            shader_path: shader_path.into(),
            lighting,
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
            // The fullscreen triangle is generated from the vertex id.
            input_layout: Vec::new(),
            topology: PrimitiveTopology::TriangleList,
            rasterizer: RasterizerDesc {
                cull_mode: CullMode::None,
                ..RasterizerDesc::default()
            },
            depth_stencil: DepthStencilStateDesc {
                depth_enable: false,
                depth_write: false,
                compare: CompareFunction::Always,
            },
            blend: BlendStateDesc::default(),
            render_target_formats: vec![Format::Rgba16Float],
            depth_format: None,
            sample_count: SampleCount::One,
        }
    }
}

impl RenderPass for DeferredLightingPass {
    fn name(&self) -> &str {
        "DeferredLighting"
    }

    fn initialize(
        &mut self,
        resources: &mut ResourceContext,
        shaders: &mut ShaderLibrary,
    ) -> Result<(), GraphError> {
        self.vertex_shader = Some(shaders.load(ShaderRequest {
            key: ShaderKey {
                path: self.shader_path.clone(),
                entry_point: "VSFullscreen".to_string(),
                stage: ShaderStage::Vertex,
            },
            target_profile: "vs_6_6".to_string(),
        })?);
        self.pixel_shader = Some(shaders.load(ShaderRequest {
            key: ShaderKey {
                path: self.shader_path.clone(),
                entry_point: "PSLighting".to_string(),
                stage: ShaderStage::Pixel,
            },
            target_profile: "ps_6_6".to_string(),
        })?);

        let root_signature = resources.device().create_root_signature(&RootSignatureDesc {
            parameters: vec![RootParameter::DescriptorTable {
                ranges: vec![
                    DescriptorRange {
                        kind: DescriptorRangeKind::ConstantBuffer,
                        base_register: 0,
                        count: 1,
                    },
                    DescriptorRange {
                        kind: DescriptorRangeKind::ShaderResource,
                        base_register: 0,
                        count: 4,
                    },
                ],
            }],
        })?;
        self.root_signature = Some(root_signature);
        Ok(())
    }

    fn register_input_output(&mut self, ctx: &mut RegisterContext<'_>) -> Result<(), GraphError> {
        ctx.resources.create_texture_2d_resource(
            SCENE_COLOR,
            TextureDesc {
                extent: ctx.frame.extent,
                format: Format::Rgba16Float,
                mip_levels: 1,
                sample_count: SampleCount::One,
                heap: HeapType::Default,
                usage: ResourceUsage::RENDER_TARGET
                    .with(ResourceUsage::SHADER_RESOURCE)
                    .with(ResourceUsage::COPY_SRC),
                initial_state: ResourceState::RenderTarget,
                clear_value: Some(ClearValue::Color([0.0, 0.0, 0.0, 1.0])),
            },
        )?;
        ctx.resources.create_render_target_view(
            "SceneColorRtv",
            SCENE_COLOR,
            prism_core::rhi::RenderTargetViewDesc {
                format: Format::Rgba16Float,
                mip_slice: 0,
            },
        )?;

        ctx.resources.create_buffer_resource(
            LIGHTING_CONSTANTS,
            BufferDesc {
                size: 256,
                heap: HeapType::Upload,
                usage: ResourceUsage::CONSTANT_BUFFER,
                initial_state: ResourceState::GenericRead,
            },
        )?;
        ctx.resources.create_constant_buffer_view(
            "LightingCbv",
            LIGHTING_CONSTANTS,
            ConstantBufferViewDesc {
                offset: 0,
                size: 256,
            },
        )?;

        ctx.resources.register_pipeline_state(
            ctx.shaders,
            "DeferredLightingPipeline",
            self.pipeline_desc(),
        )?;

        for (name, _) in GBUFFER_COLOR_TARGETS {
            ctx.reads(name, ResourceState::ShaderResource);
        }
        ctx.reads(GBUFFER_DEPTH, ResourceState::ShaderResource);
        ctx.writes(SCENE_COLOR, ResourceState::RenderTarget);
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderPassContext<'_>) -> Result<(), GraphError> {
        for (name, _) in GBUFFER_COLOR_TARGETS {
            ctx.transition(name, ResourceState::ShaderResource);
        }
        ctx.transition(GBUFFER_DEPTH, ResourceState::ShaderResource);
        ctx.transition(SCENE_COLOR, ResourceState::RenderTarget);

        let constants = {
            let lighting = self.lighting.read().unwrap();
            LightingConstants {
                sun_direction: lighting.sun_direction.to_array(),
                ambient: lighting.ambient,
                sun_color: lighting.sun_color,
                _padding: 0.0,
            }
        };
        let lighting_cb = ctx.resources.resource(LIGHTING_CONSTANTS).id();
        ctx.resources
            .device()
            .write_buffer(lighting_cb, 0, bytemuck::bytes_of(&constants))?;

        // Stage the CBV + GBuffer SRVs into a frame-scoped table.
        let table = ctx.resources.allocate_transient_table(TABLE_SLOTS)?;
        ctx.resources.stage_views(
            table,
            &[
                "LightingCbv",
                "GBufferAlbedoTextureSrv",
                "GBufferNormalTextureSrv",
                "GBufferMaterialTextureSrv",
                "GBufferDepthSrv",
            ],
        )?;
        let table_base = match table.gpu {
            Some(base) => base,
            None => {
                log::error!("Transient descriptor table is not shader visible");
                panic!("transient descriptor table without a GPU address");
            }
        };

        let scene_color = ctx.resources.view("SceneColorRtv");
        ctx.graphics.set_render_targets(&[&scene_color], None);
        ctx.graphics
            .set_target_region(&ctx.frame.viewport, &ctx.frame.scissor);

        let pipeline = ctx.resources.pipeline_state("DeferredLightingPipeline");
        let root_signature = self.root_signature.expect("pass not initialized");
        let heap = ctx.resources.shader_heap_id();

        let list = ctx.graphics.list_mut();
        list.set_descriptor_heap(heap);
        list.set_pipeline_state(pipeline);
        list.set_graphics_root_signature(root_signature);
        list.set_root_descriptor_table(PARAM_LIGHTING_TABLE, table_base);
        list.draw_instanced(3, 1, 0, 0);
        Ok(())
    }
}
