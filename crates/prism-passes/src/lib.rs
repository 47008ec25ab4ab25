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

//! # Prism Passes
//!
//! The deferred pipeline: geometry buffer, deferred lighting, debug overlay
//! and editor gizmos, plus the [`RenderWorld`](`world::RenderWorld`)
//! snapshot that carries per-frame inputs across the engine-loop boundary.

#![warn(missing_docs)]

pub mod gbuffer;
pub mod gizmo;
pub mod lighting;
pub mod overlay;
pub mod world;

pub use gbuffer::GBufferPass;
pub use gizmo::EditorGizmoPass;
pub use lighting::{DeferredLightingPass, SCENE_COLOR};
pub use overlay::DebugOverlayPass;
pub use world::{cube_mesh, upload_mesh, Camera, MeshVertex, RenderWorld, SceneLighting};
