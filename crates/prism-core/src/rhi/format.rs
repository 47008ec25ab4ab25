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

//! Texel and element formats shared by resources, views and pipelines.

/// The format of a texture's texels or a typed buffer's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// No format; used for raw buffers and structured data.
    Unknown,
    /// 8-bit per channel RGBA, unsigned normalized.
    Rgba8Unorm,
    /// 8-bit per channel RGBA, unsigned normalized, sRGB encoded.
    Rgba8UnormSrgb,
    /// 8-bit per channel BGRA, unsigned normalized. Common swap-chain format.
    Bgra8Unorm,
    /// 16-bit per channel RGBA floating point.
    Rgba16Float,
    /// 32-bit per channel RGBA floating point.
    Rgba32Float,
    /// Two-channel 16-bit floating point.
    Rg16Float,
    /// Two-channel 32-bit floating point. Common vertex attribute format.
    Rg32Float,
    /// Three-channel 32-bit floating point. Common vertex attribute format.
    Rgb32Float,
    /// Single-channel 32-bit floating point.
    R32Float,
    /// Single-channel 16-bit unsigned integer.
    R16Uint,
    /// Single-channel 32-bit unsigned integer.
    R32Uint,
    /// 32-bit floating-point depth.
    D32Float,
    /// 24-bit unsigned normalized depth with an 8-bit stencil component.
    D24UnormS8Uint,
}

impl Format {
    /// Returns the size of one texel (or element) in bytes.
    pub const fn bytes_per_texel(&self) -> u32 {
        match self {
            Format::Unknown => 0,
            Format::Rgba8Unorm | Format::Rgba8UnormSrgb | Format::Bgra8Unorm => 4,
            Format::Rgba16Float => 8,
            Format::Rgba32Float => 16,
            Format::Rg16Float => 4,
            Format::Rg32Float => 8,
            Format::Rgb32Float => 12,
            Format::R32Float | Format::R16Uint | Format::R32Uint => 4,
            Format::D32Float | Format::D24UnormS8Uint => 4,
        }
    }

    /// Returns `true` if this is a depth or depth/stencil format.
    pub const fn is_depth(&self) -> bool {
        matches!(self, Format::D32Float | Format::D24UnormS8Uint)
    }

    /// Returns `true` if this format carries a stencil component.
    pub const fn has_stencil(&self) -> bool {
        matches!(self, Format::D24UnormS8Uint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_classification() {
        assert!(Format::D32Float.is_depth());
        assert!(Format::D24UnormS8Uint.is_depth());
        assert!(Format::D24UnormS8Uint.has_stencil());
        assert!(!Format::D32Float.has_stencil());
        assert!(!Format::Rgba8Unorm.is_depth());
    }

    #[test]
    fn texel_sizes() {
        assert_eq!(Format::Rgba8Unorm.bytes_per_texel(), 4);
        assert_eq!(Format::Rgba16Float.bytes_per_texel(), 8);
        assert_eq!(Format::Rgba32Float.bytes_per_texel(), 16);
        assert_eq!(Format::Unknown.bytes_per_texel(), 0);
    }
}
