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

//! The debug overlay pass: world-space debug lines composited over the lit
//! scene color.

use crate::lighting::SCENE_COLOR;
use crate::world::LineVertex;
use prism_core::graph::{GraphError, RegisterContext, RenderPass, RenderPassContext, ResourceContext};
use prism_core::pipeline::{
    BlendStateDesc, CompareFunction, CullMode, DepthStencilStateDesc, GraphicsPipelineDesc,
    RasterizerDesc, RootParameter, RootSignatureDesc, VertexAttribute,
};
use prism_core::rhi::{
    BufferDesc, Format, HeapType, PrimitiveTopology, ResourceState, ResourceUsage,
    RootSignatureId, SampleCount, VertexBufferBinding,
};
use prism_core::shader::{ShaderKey, ShaderLibrary, ShaderRequest, ShaderStage};
use std::sync::{Arc, RwLock};

const LINE_VERTEX_BUFFER: &str = "DebugLineVertexBuffer";
/// Root parameter 0: the view-projection matrix as root constants.
const PARAM_VIEW_PROJECTION: u32 = 0;
/// Upper bound of line vertices per frame; overflow is dropped with a warning.
const MAX_LINE_VERTICES: usize = 4096;

/// A line-list pipeline description shared by the overlay and gizmo passes.
pub(crate) fn line_pipeline_desc(
    root_signature: RootSignatureId,
    vertex_shader: ShaderKey,
    pixel_shader: ShaderKey,
) -> GraphicsPipelineDesc {
    GraphicsPipelineDesc {
        root_signature,
        vertex_shader,
        pixel_shader: Some(pixel_shader),
        input_layout: vec![
            VertexAttribute {
                semantic: "POSITION".to_string(),
                format: Format::Rgb32Float,
                offset: 0,
                buffer_slot: 0,
            },
            VertexAttribute {
                semantic: "COLOR".to_string(),
                format: Format::Rgba32Float,
                offset: 12,
                buffer_slot: 0,
            },
        ],
        topology: PrimitiveTopology::LineList,
        rasterizer: RasterizerDesc {
            cull_mode: CullMode::None,
            ..RasterizerDesc::default()
        },
        depth_stencil: DepthStencilStateDesc {
            depth_enable: false,
            depth_write: false,
            compare: CompareFunction::Always,
        },
        blend: BlendStateDesc { alpha_blend: true },
        render_target_formats: vec![Format::Rgba16Float],
        depth_format: None,
        sample_count: SampleCount::One,
    }
}

/// The root signature shared by the line-drawing passes: 16 root constants
/// carrying the view-projection matrix.
pub(crate) fn line_root_signature_desc() -> RootSignatureDesc {
    RootSignatureDesc {
        parameters: vec![RootParameter::Constants {
            shader_register: 0,
            num_values: 16,
        }],
    }
}

/// Draws the world's debug lines over the scene color target.
#[derive(Debug)]
pub struct DebugOverlayPass {
    shader_path: String,
    lines: Arc<RwLock<Vec<LineVertex>>>,
    root_signature: Option<RootSignatureId>,
    vertex_shader: Option<ShaderKey>,
    pixel_shader: Option<ShaderKey>,
}

impl DebugOverlayPass {
    /// Creates the pass over a shared view of the world's debug lines.
    pub fn new(shader_path: impl Into<String>, lines: Arc<RwLock<Vec<LineVertex>>>) -> Self {
        Self {
            shader_path: shader_path.into(),
            lines,
            root_signature: None,
            vertex_shader: None,
            pixel_shader: None,
        }
    }
}

impl RenderPass for DebugOverlayPass {
    fn name(&self) -> &str {
        "DebugOverlay"
    }

    fn initialize(
        &mut self,
        resources: &mut ResourceContext,
        shaders: &mut ShaderLibrary,
    ) -> Result<(), GraphError> {
        self.vertex_shader = Some(shaders.load(ShaderRequest {
            key: ShaderKey {
                path: self.shader_path.clone(),
                entry_point: "VSLine".to_string(),
                stage: ShaderStage::Vertex,
            },
            target_profile: "vs_6_6".to_string(),
        })?);
        self.pixel_shader = Some(shaders.load(ShaderRequest {
            key: ShaderKey {
                path: self.shader_path.clone(),
                entry_point: "PSLine".to_string(),
                stage: ShaderStage::Pixel,
            },
            target_profile: "ps_6_6".to_string(),
        })?);
        self.root_signature = Some(
            resources
                .device()
                .create_root_signature(&line_root_signature_desc())?,
        );
        Ok(())
    }

    fn register_input_output(&mut self, ctx: &mut RegisterContext<'_>) -> Result<(), GraphError> {
        ctx.resources.create_buffer_resource(
            LINE_VERTEX_BUFFER,
            BufferDesc {
                size: (MAX_LINE_VERTICES * std::mem::size_of::<LineVertex>()) as u64,
                heap: HeapType::Upload,
                usage: ResourceUsage::VERTEX_BUFFER,
                initial_state: ResourceState::GenericRead,
            },
        )?;
        ctx.resources.register_pipeline_state(
            ctx.shaders,
            "DebugOverlayPipeline",
            line_pipeline_desc(
                self.root_signature.expect("pass not initialized"),
                self.vertex_shader.clone().expect("pass not initialized"),
                self.pixel_shader.clone().expect("pass not initialized"),
            ),
        )?;
        ctx.writes(SCENE_COLOR, ResourceState::RenderTarget);
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderPassContext<'_>) -> Result<(), GraphError> {
        let vertex_count = {
            let lines = self.lines.read().unwrap();
            let count = lines.len().min(MAX_LINE_VERTICES);
            if count < lines.len() {
                log::warn!(
                    "Debug overlay dropped {} line vertices over the {MAX_LINE_VERTICES} cap",
                    lines.len() - count
                );
            }
            if count == 0 {
                return Ok(());
            }
            let buffer = ctx.resources.resource(LINE_VERTEX_BUFFER).id();
            ctx.resources
                .device()
                .write_buffer(buffer, 0, bytemuck::cast_slice(&lines[..count]))?;
            count
        };

        ctx.transition(SCENE_COLOR, ResourceState::RenderTarget);
        let scene_color = ctx.resources.view("SceneColorRtv");
        ctx.graphics.set_render_targets(&[&scene_color], None);
        ctx.graphics
            .set_target_region(&ctx.frame.viewport, &ctx.frame.scissor);

        let pipeline = ctx.resources.pipeline_state("DebugOverlayPipeline");
        let root_signature = self.root_signature.expect("pass not initialized");
        let view_projection = ctx.graphics.view_projection().to_cols_array();
        let buffer = ctx.resources.resource(LINE_VERTEX_BUFFER);
        let binding = VertexBufferBinding {
            resource: buffer.id(),
            offset: 0,
            size: (vertex_count * std::mem::size_of::<LineVertex>()) as u64,
            stride: std::mem::size_of::<LineVertex>() as u32,
        };

        let list = ctx.graphics.list_mut();
        list.set_pipeline_state(pipeline);
        list.set_graphics_root_signature(root_signature);
        list.set_root_constants(
            PARAM_VIEW_PROJECTION,
            0,
            bytemuck::cast_slice(&view_projection),
        );
        list.set_vertex_buffer(0, &binding);
        list.draw_instanced(vertex_count as u32, 1, 0, 0);
        Ok(())
    }
}
