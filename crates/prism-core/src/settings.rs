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

//! Global settings for the rendering system.

use crate::rhi::types::Extent2D;
use serde::{Deserialize, Serialize};

/// A collection of global settings that affect the frame pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererSettings {
    /// Initial output resolution.
    pub resolution: Extent2D,
    /// Number of swap-chain back buffers (2 = double, 3 = triple buffering).
    pub buffer_count: u32,
    /// Vertical-sync interval passed to present; 0 disables vsync.
    pub vsync_interval: u32,
    /// Emit named GPU marker regions around each pass.
    pub enable_gpu_markers: bool,
    /// A generic quality level (1 = low, 2 = medium, 3 = high).
    pub quality_level: u32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            resolution: Extent2D::new(1920, 1080),
            buffer_count: 3,
            vsync_interval: 1,
            enable_gpu_markers: true,
            quality_level: 2,
        }
    }
}

impl RendererSettings {
    /// Clamps out-of-range values to something the pipeline can run with.
    pub fn sanitized(mut self) -> Self {
        if self.buffer_count < 2 {
            log::warn!(
                "buffer_count {} is below the supported minimum, using 2",
                self.buffer_count
            );
            self.buffer_count = 2;
        }
        self.resolution.width = self.resolution.width.max(1);
        self.resolution.height = self.resolution.height.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_enforces_minimum_buffering() {
        let settings = RendererSettings {
            buffer_count: 1,
            resolution: Extent2D::new(0, 0),
            ..RendererSettings::default()
        }
        .sanitized();
        assert_eq!(settings.buffer_count, 2);
        assert_eq!(settings.resolution.width, 1);
        assert_eq!(settings.resolution.height, 1);
    }
}
