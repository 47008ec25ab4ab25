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

//! The editor gizmo pass: translation axes drawn over the selected object.

use crate::lighting::SCENE_COLOR;
use crate::overlay::{line_pipeline_desc, line_root_signature_desc};
use crate::world::LineVertex;
use glam::{Mat4, Vec3};
use prism_core::graph::{GraphError, RegisterContext, RenderPass, RenderPassContext, ResourceContext};
use prism_core::rhi::{
    BufferDesc, HeapType, ResourceState, ResourceUsage, RootSignatureId, VertexBufferBinding,
};
use prism_core::shader::{ShaderKey, ShaderLibrary, ShaderRequest, ShaderStage};
use std::sync::{Arc, RwLock};

const GIZMO_VERTEX_BUFFER: &str = "GizmoLineVertexBuffer";
const PARAM_VIEW_PROJECTION: u32 = 0;
/// Three axes, two vertices each.
const GIZMO_VERTEX_COUNT: usize = 6;

/// Draws translation axes for the selected object.
#[derive(Debug)]
pub struct EditorGizmoPass {
    shader_path: String,
    target: Arc<RwLock<Option<Mat4>>>,
    root_signature: Option<RootSignatureId>,
    vertex_shader: Option<ShaderKey>,
    pixel_shader: Option<ShaderKey>,
}

impl EditorGizmoPass {
    /// Creates the pass over a shared view of the editor selection.
    pub fn new(shader_path: impl Into<String>, target: Arc<RwLock<Option<Mat4>>>) -> Self {
        Self {
            shader_path: shader_path.into(),
            target,
            root_signature: None,
            vertex_shader: None,
            pixel_shader: None,
        }
    }

    fn axis_lines(transform: &Mat4) -> [LineVertex; GIZMO_VERTEX_COUNT] {
        let origin = transform.transform_point3(Vec3::ZERO);
        let axes = [
            (Vec3::X, [0.9, 0.1, 0.1, 1.0]),
            (Vec3::Y, [0.1, 0.9, 0.1, 1.0]),
            (Vec3::Z, [0.1, 0.1, 0.9, 1.0]),
        ];
        let mut vertices = [LineVertex {
            position: [0.0; 3],
            color: [0.0; 4],
        }; GIZMO_VERTEX_COUNT];
        for (i, (axis, color)) in axes.iter().enumerate() {
            let tip = transform.transform_point3(*axis);
            vertices[i * 2] = LineVertex {
                position: origin.to_array(),
                color: *color,
            };
            vertices[i * 2 + 1] = LineVertex {
                position: tip.to_array(),
                color: *color,
            };
        }
        vertices
    }
}

impl RenderPass for EditorGizmoPass {
    fn name(&self) -> &str {
        "EditorGizmo"
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
            GIZMO_VERTEX_BUFFER,
            BufferDesc {
                size: (GIZMO_VERTEX_COUNT * std::mem::size_of::<LineVertex>()) as u64,
                heap: HeapType::Upload,
                usage: ResourceUsage::VERTEX_BUFFER,
                initial_state: ResourceState::GenericRead,
            },
        )?;
        ctx.resources.register_pipeline_state(
            ctx.shaders,
            "EditorGizmoPipeline",
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
        let transform = match *self.target.read().unwrap() {
            Some(transform) => transform,
            None => return Ok(()),
        };

        let vertices = Self::axis_lines(&transform);
        let buffer = ctx.resources.resource(GIZMO_VERTEX_BUFFER).id();
        ctx.resources
            .device()
            .write_buffer(buffer, 0, bytemuck::cast_slice(&vertices))?;

        ctx.transition(SCENE_COLOR, ResourceState::RenderTarget);
        let scene_color = ctx.resources.view("SceneColorRtv");
        ctx.graphics.set_render_targets(&[&scene_color], None);
        ctx.graphics
            .set_target_region(&ctx.frame.viewport, &ctx.frame.scissor);

        let pipeline = ctx.resources.pipeline_state("EditorGizmoPipeline");
        let root_signature = self.root_signature.expect("pass not initialized");
        let view_projection = ctx.graphics.view_projection().to_cols_array();
        let binding = VertexBufferBinding {
            resource: buffer,
            offset: 0,
            size: (GIZMO_VERTEX_COUNT * std::mem::size_of::<LineVertex>()) as u64,
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
        list.draw_instanced(GIZMO_VERTEX_COUNT as u32, 1, 0, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_lines_start_at_the_transform_origin() {
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let vertices = EditorGizmoPass::axis_lines(&transform);
        for axis in 0..3 {
            assert_eq!(vertices[axis * 2].position, [1.0, 2.0, 3.0]);
        }
        // X axis tip lands one unit along X from the origin.
        assert_eq!(vertices[1].position, [2.0, 2.0, 3.0]);
    }
}
