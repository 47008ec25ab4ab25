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

//! The extracted frame snapshot the passes consume.
//!
//! The world layer produces drawable items, lighting parameters and debug
//! geometry each frame; passes read them without knowing where they came
//! from. Shared pieces (lighting, debug lines, gizmo selection) live behind
//! `Arc<RwLock<..>>` so the passes registered with the scheduler observe the
//! world's per-frame updates.

use glam::{Mat4, Vec3};
use prism_core::graph::{GraphError, GraphicContext, ResourceContext, VisualItem};
use prism_core::rhi::{
    BufferDesc, HeapType, IndexBufferBinding, IndexFormat, ResourceState, ResourceUsage,
    VertexBufferBinding,
};
use std::sync::{Arc, RwLock};

/// One mesh vertex: position, normal, texture coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
}

/// One debug-line vertex: position and color.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Linear RGBA color.
    pub color: [f32; 4],
}

/// The camera matrices of the frame.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// World-to-view transform.
    pub view: Mat4,
    /// View-to-clip transform.
    pub projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

impl Camera {
    /// Points the camera at `target` from `eye`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.view = Mat4::look_at_rh(eye, target, up);
    }

    /// Sets a perspective projection.
    pub fn perspective(&mut self, fov_y_radians: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Mat4::perspective_rh(fov_y_radians, aspect, near, far);
    }
}

/// Directional lighting parameters of the scene.
#[derive(Debug, Clone, Copy)]
pub struct SceneLighting {
    /// Direction the sun light travels, normalized.
    pub sun_direction: Vec3,
    /// Linear sun color.
    pub sun_color: [f32; 3],
    /// Flat ambient term.
    pub ambient: f32,
}

impl Default for SceneLighting {
    fn default() -> Self {
        Self {
            sun_direction: Vec3::new(-0.5, -1.0, -0.3).normalize(),
            sun_color: [1.0, 0.96, 0.9],
            ambient: 0.03,
        }
    }
}

/// The GPU-resident buffers of an uploaded mesh.
#[derive(Debug, Clone, Copy)]
pub struct MeshBuffers {
    /// Vertex-buffer binding.
    pub vertex: VertexBufferBinding,
    /// Index-buffer binding.
    pub index: IndexBufferBinding,
    /// Number of indices.
    pub index_count: u32,
    /// Number of vertices.
    pub vertex_count: u32,
}

/// Uploads a mesh through a staging buffer.
///
/// Writes vertices and indices into an upload-heap staging buffer, records
/// copies into the device-local vertex/index buffers on the context's
/// command list, and transitions both into their bind states. The recorded
/// commands take effect when the caller submits the list.
pub fn upload_mesh(
    resources: &mut ResourceContext,
    graphics: &mut GraphicContext,
    name: &str,
    vertices: &[MeshVertex],
    indices: &[u32],
) -> Result<MeshBuffers, GraphError> {
    let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
    let index_bytes: &[u8] = bytemuck::cast_slice(indices);
    let vertex_size = vertex_bytes.len() as u64;
    let index_size = index_bytes.len() as u64;

    let staging_name = format!("{name}MeshStaging");
    let vertex_name = format!("{name}MeshVertexBuffer");
    let index_name = format!("{name}MeshIndexBuffer");

    let staging = resources.create_buffer_resource(
        &staging_name,
        BufferDesc {
            size: vertex_size + index_size,
            heap: HeapType::Upload,
            usage: ResourceUsage::COPY_SRC,
            initial_state: ResourceState::GenericRead,
        },
    )?;
    let vertex_buffer = resources.create_buffer_resource(
        &vertex_name,
        BufferDesc {
            size: vertex_size,
            heap: HeapType::Default,
            usage: ResourceUsage::VERTEX_BUFFER.with(ResourceUsage::COPY_DST),
            initial_state: ResourceState::CopyDest,
        },
    )?;
    let index_buffer = resources.create_buffer_resource(
        &index_name,
        BufferDesc {
            size: index_size,
            heap: HeapType::Default,
            usage: ResourceUsage::INDEX_BUFFER.with(ResourceUsage::COPY_DST),
            initial_state: ResourceState::CopyDest,
        },
    )?;

    let device = resources.device().clone();
    device.write_buffer(staging, 0, vertex_bytes).map_err(GraphError::from)?;
    device
        .write_buffer(staging, vertex_size, index_bytes)
        .map_err(GraphError::from)?;

    let list = graphics.list_mut();
    list.copy_buffer_region(staging, 0, vertex_buffer, 0, vertex_size);
    list.copy_buffer_region(staging, vertex_size, index_buffer, 0, index_size);

    graphics.transition(
        resources.resource_mut(&vertex_name),
        ResourceState::VertexAndConstantBuffer,
    );
    graphics.transition(resources.resource_mut(&index_name), ResourceState::IndexBuffer);

    log::debug!(
        "Uploaded mesh '{name}': {} vertices, {} indices",
        vertices.len(),
        indices.len()
    );

    Ok(MeshBuffers {
        vertex: VertexBufferBinding {
            resource: vertex_buffer,
            offset: 0,
            size: vertex_size,
            stride: std::mem::size_of::<MeshVertex>() as u32,
        },
        index: IndexBufferBinding {
            resource: index_buffer,
            offset: 0,
            size: index_size,
            format: IndexFormat::Uint32,
        },
        index_count: indices.len() as u32,
        vertex_count: vertices.len() as u32,
    })
}

/// A unit cube mesh, the workhorse of every sandbox scene.
pub fn cube_mesh() -> (Vec<MeshVertex>, Vec<u32>) {
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        // (normal, tangent u, tangent v) per face
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face, (normal, u, v)) in faces.iter().enumerate() {
        let n = Vec3::from_array(*normal);
        let tu = Vec3::from_array(*u);
        let tv = Vec3::from_array(*v);
        let base = (face * 4) as u32;
        for (du, dv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let position = n * 0.5 + tu * du + tv * dv;
            vertices.push(MeshVertex {
                position: position.to_array(),
                normal: *normal,
                uv: [du + 0.5, dv + 0.5],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

/// The per-frame snapshot handed from the world layer to the renderer.
#[derive(Debug, Default)]
pub struct RenderWorld {
    /// The active camera.
    pub camera: Camera,
    visuals: Vec<VisualItem>,
    lighting: Arc<RwLock<SceneLighting>>,
    debug_lines: Arc<RwLock<Vec<LineVertex>>>,
    gizmo_target: Arc<RwLock<Option<Mat4>>>,
}

impl RenderWorld {
    /// Creates an empty world snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The drawable items of the frame.
    pub fn visuals(&self) -> &[VisualItem] {
        &self.visuals
    }

    /// Adds a drawable item.
    pub fn push_visual(&mut self, item: VisualItem) {
        self.visuals.push(item);
    }

    /// Removes all drawable items.
    pub fn clear_visuals(&mut self) {
        self.visuals.clear();
    }

    /// Shared handle to the scene lighting, for the lighting pass.
    pub fn lighting(&self) -> Arc<RwLock<SceneLighting>> {
        self.lighting.clone()
    }

    /// Shared handle to the debug lines, for the overlay pass.
    pub fn debug_lines(&self) -> Arc<RwLock<Vec<LineVertex>>> {
        self.debug_lines.clone()
    }

    /// Shared handle to the gizmo selection, for the gizmo pass.
    pub fn gizmo_target(&self) -> Arc<RwLock<Option<Mat4>>> {
        self.gizmo_target.clone()
    }

    /// Updates the sun parameters.
    pub fn set_sun(&self, direction: Vec3, color: [f32; 3]) {
        let mut lighting = self.lighting.write().unwrap();
        lighting.sun_direction = direction.normalize();
        lighting.sun_color = color;
    }

    /// Appends a world-space debug line.
    pub fn push_debug_line(&self, from: Vec3, to: Vec3, color: [f32; 4]) {
        let mut lines = self.debug_lines.write().unwrap();
        lines.push(LineVertex {
            position: from.to_array(),
            color,
        });
        lines.push(LineVertex {
            position: to.to_array(),
            color,
        });
    }

    /// Clears the debug lines of the previous frame.
    pub fn clear_debug_lines(&self) {
        self.debug_lines.write().unwrap().clear();
    }

    /// Selects the object the editor gizmo is drawn for.
    pub fn select(&self, transform: Option<Mat4>) {
        *self.gizmo_target.write().unwrap() = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_mesh_is_well_formed() {
        let (vertices, indices) = cube_mesh();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn debug_lines_accumulate_in_pairs() {
        let world = RenderWorld::new();
        world.push_debug_line(Vec3::ZERO, Vec3::X, [1.0, 0.0, 0.0, 1.0]);
        world.push_debug_line(Vec3::ZERO, Vec3::Y, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(world.debug_lines().read().unwrap().len(), 4);
        world.clear_debug_lines();
        assert!(world.debug_lines().read().unwrap().is_empty());
    }
}
