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

//! The presentation boundary: swap chains and surfaces.

use crate::rhi::error::RhiError;
use crate::rhi::format::Format;
use crate::rhi::resource::RhiResource;
use crate::rhi::types::{Extent2D, ScissorRect, Viewport};
use crate::rhi::view::RhiResourceView;
use raw_window_handle::RawWindowHandle;

/// Creation parameters of a swap chain.
///
/// The window handle is absent for headless surfaces; windowed backends
/// require it to bind the native surface.
#[derive(Debug, Clone)]
pub struct SurfaceDescriptor {
    /// Initial size of the back buffers.
    pub extent: Extent2D,
    /// Texel format of the back buffers.
    pub format: Format,
    /// Number of rotating back buffers.
    pub buffer_count: u32,
    /// Native window to present into, when one exists.
    pub window: Option<RawWindowHandle>,
}

/// The rotating set of presentation targets.
///
/// The frame pipeline only consumes this abstraction: current back buffer,
/// current index, viewport/scissor and `present`. Capturing the fence value
/// associated with each presented buffer is the caller's job (see
/// [`FrameSync`](`crate::graph::FrameSync`)).
pub trait Swapchain: Send + std::fmt::Debug {
    /// Number of back buffers in rotation.
    fn buffer_count(&self) -> u32;

    /// Index of the buffer currently available for rendering.
    fn current_index(&self) -> u32;

    /// Size of the back buffers.
    fn extent(&self) -> Extent2D;

    /// A full-extent viewport.
    fn viewport(&self) -> Viewport {
        Viewport::from_extent(self.extent())
    }

    /// A full-extent scissor rectangle.
    fn scissor(&self) -> ScissorRect {
        ScissorRect::from_extent(self.extent())
    }

    /// The back buffer currently available for rendering.
    fn back_buffer(&self) -> &RhiResource;

    /// Mutable access to the current back buffer, required to record state
    /// transitions on it.
    fn back_buffer_mut(&mut self) -> &mut RhiResource;

    /// The render-target view of the current back buffer.
    fn back_buffer_view(&self) -> RhiResourceView;

    /// Queues the current back buffer for presentation and advances the
    /// rotation. `vsync_interval` 0 presents immediately.
    fn present(&mut self, vsync_interval: u32) -> Result<(), RhiError>;

    /// Recreates the back buffers at a new size. All views previously
    /// returned for back buffers are invalid afterwards.
    fn resize(&mut self, extent: Extent2D) -> Result<(), RhiError>;
}
