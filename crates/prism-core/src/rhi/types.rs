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

//! Small plain-data types shared across the RHI: extents, viewports,
//! clear values, resource states and heap classifications.

use serde::{Deserialize, Serialize};

/// A two-dimensional size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent2D {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the width/height ratio.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// A rendering viewport with a depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Minimum depth of the viewport range.
    pub min_depth: f32,
    /// Maximum depth of the viewport range.
    pub max_depth: f32,
}

impl Viewport {
    /// Creates a full-extent viewport with the standard `[0, 1]` depth range.
    pub fn from_extent(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// A scissor rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

impl ScissorRect {
    /// Creates a scissor covering the whole extent.
    pub fn from_extent(extent: Extent2D) -> Self {
        Self {
            left: 0,
            top: 0,
            right: extent.width as i32,
            bottom: extent.height as i32,
        }
    }
}

/// The number of samples per pixel of a multisampled resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleCount {
    /// No multisampling.
    #[default]
    One,
    /// 2x MSAA.
    Two,
    /// 4x MSAA.
    Four,
    /// 8x MSAA.
    Eight,
}

impl SampleCount {
    /// Returns the sample count as a plain integer.
    pub const fn as_u32(&self) -> u32 {
        match self {
            SampleCount::One => 1,
            SampleCount::Two => 2,
            SampleCount::Four => 4,
            SampleCount::Eight => 8,
        }
    }
}

/// The memory heap a resource is allocated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapType {
    /// Device-local memory; fastest for GPU access, not CPU visible.
    Default,
    /// CPU-writable memory used to stage data for the GPU.
    Upload,
    /// CPU-readable memory used to read results back from the GPU.
    Readback,
}

/// The usage state a resource is currently in.
///
/// Every command that touches a resource expects it in a particular state;
/// recording a transition barrier through the command list is the only legal
/// way to move between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Default state; required for presentation on some queues.
    Common,
    /// Bound as a color render target.
    RenderTarget,
    /// Bound as a depth target with writes enabled.
    DepthWrite,
    /// Bound as a depth target for read-only depth testing.
    DepthRead,
    /// Readable from shaders as a texture or typed buffer.
    ShaderResource,
    /// Read/write access from shaders.
    UnorderedAccess,
    /// Destination of a copy operation.
    CopyDest,
    /// Source of a copy operation.
    CopySource,
    /// Combined read state usable by any read operation.
    GenericRead,
    /// Ready to be handed to the presentation engine.
    Present,
    /// Bound as a vertex or constant buffer.
    VertexAndConstantBuffer,
    /// Bound as an index buffer.
    IndexBuffer,
}

/// The value a resource is cleared to at the start of a pass.
///
/// Declaring the clear value at resource creation lets the backend pick a
/// fast-clear layout; clearing to a different value at runtime still works
/// but may hit a slow path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Clear color for render targets.
    Color([f32; 4]),
    /// Clear depth and stencil for depth targets.
    DepthStencil {
        /// Depth clear value, typically `1.0` (far plane).
        depth: f32,
        /// Stencil clear value.
        stencil: u8,
    },
}

/// A linear-space RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
    /// Alpha component.
    pub a: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a color from linear components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the components as an array, in RGBA order.
    pub const fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// The element width of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit indices.
    Uint16,
    /// 32-bit indices.
    Uint32,
}

impl IndexFormat {
    /// Returns the size of one index in bytes.
    pub const fn bytes(&self) -> u32 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Each vertex is a point.
    PointList,
    /// Every two vertices form an independent line.
    LineList,
    /// Every three vertices form an independent triangle.
    TriangleList,
    /// Each vertex after the second extends a strip of triangles.
    TriangleStrip,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_from_extent() {
        let vp = Viewport::from_extent(Extent2D::new(1920, 1080));
        assert_eq!(vp.width, 1920.0);
        assert_eq!(vp.height, 1080.0);
        assert_eq!(vp.min_depth, 0.0);
        assert_eq!(vp.max_depth, 1.0);
    }

    #[test]
    fn scissor_from_extent() {
        let rect = ScissorRect::from_extent(Extent2D::new(640, 480));
        assert_eq!(rect.right, 640);
        assert_eq!(rect.bottom, 480);
    }

    #[test]
    fn sample_count_values() {
        assert_eq!(SampleCount::One.as_u32(), 1);
        assert_eq!(SampleCount::Eight.as_u32(), 8);
    }
}
