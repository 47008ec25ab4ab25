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

//! The drawable record crossing the engine-loop boundary.
//!
//! The world/ECS layer produces these each frame; the scheduler and passes
//! consume them without knowing how they were produced.

use crate::rhi::resource::{IndexBufferBinding, VertexBufferBinding};
use glam::Mat4;

/// One drawable item: geometry bindings plus per-object parameters.
#[derive(Debug, Clone, Copy)]
pub struct VisualItem {
    /// Vertex data of the mesh.
    pub vertex_buffer: VertexBufferBinding,
    /// Index data; absent for non-indexed meshes.
    pub index_buffer: Option<IndexBufferBinding>,
    /// Number of indices to draw when indexed.
    pub index_count: u32,
    /// Number of vertices to draw when non-indexed.
    pub vertex_count: u32,
    /// Object-to-world transform.
    pub model_matrix: Mat4,
    /// Per-object material tint, linear RGBA.
    pub base_color: [f32; 4],
}
