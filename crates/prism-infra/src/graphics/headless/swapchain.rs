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

//! A swap chain without a window: rotating back buffers that "present" by
//! advancing the rotation. Gives the frame pipeline the same surface
//! contract a windowed backend would.

use prism_core::rhi::{
    ClearValue, DescriptorHeap, DescriptorHeapKind, Extent2D, Format, HeapType,
    RenderTargetViewDesc, ResourceState, ResourceUsage, RhiDevice, RhiError, RhiResource,
    RhiResourceView, SampleCount, TextureDesc, ViewKind,
};
use prism_core::surface::{SurfaceDescriptor, Swapchain};
use std::sync::Arc;

/// A headless [`Swapchain`] implementation.
#[derive(Debug)]
pub struct HeadlessSwapchain {
    device: Arc<dyn RhiDevice>,
    rtv_heap: DescriptorHeap,
    buffers: Vec<RhiResource>,
    views: Vec<RhiResourceView>,
    format: Format,
    extent: Extent2D,
    current: u32,
    presented_frames: u64,
    generation: u64,
}

impl HeadlessSwapchain {
    /// Creates `desc.buffer_count` back buffers and their views.
    pub fn new(device: Arc<dyn RhiDevice>, desc: &SurfaceDescriptor) -> Result<Self, RhiError> {
        if desc.window.is_some() {
            log::warn!("Headless swapchain ignores the provided window handle");
        }
        let buffer_count = desc.buffer_count.max(2);
        let rtv_heap = DescriptorHeap::new(
            device.clone(),
            DescriptorHeapKind::Rtv,
            buffer_count,
            false,
        )?;
        let mut swapchain = Self {
            device,
            rtv_heap,
            buffers: Vec::new(),
            views: Vec::new(),
            format: desc.format,
            extent: desc.extent,
            current: 0,
            presented_frames: 0,
            generation: 1,
        };
        swapchain.create_buffers()?;
        log::info!(
            "Headless swapchain: {buffer_count} buffers at {}x{}",
            desc.extent.width,
            desc.extent.height
        );
        Ok(swapchain)
    }

    /// Number of frames presented so far.
    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }

    fn buffer_desc(&self) -> TextureDesc {
        TextureDesc {
            extent: self.extent,
            format: self.format,
            mip_levels: 1,
            sample_count: SampleCount::One,
            heap: HeapType::Default,
            usage: ResourceUsage::RENDER_TARGET.with(ResourceUsage::COPY_DST),
            initial_state: ResourceState::Present,
            clear_value: Some(ClearValue::Color([0.0, 0.0, 0.0, 1.0])),
        }
    }

    fn create_buffers(&mut self) -> Result<(), RhiError> {
        let count = self.rtv_heap.capacity();
        let first_creation = self.views.is_empty();
        for index in 0..count {
            let name = format!("BackBuffer{index}");
            let desc = self.buffer_desc();
            let created = self
                .device
                .create_committed_resource(&prism_core::rhi::ResourceDesc::Texture2D(desc.clone()), &name)
                .map_err(|err| {
                    log::error!("Failed to create back buffer {index}: {err}");
                    RhiError::from(err)
                })?;
            let resource = RhiResource::new(
                created.id,
                name,
                prism_core::rhi::ResourceDesc::Texture2D(desc),
                created.gpu_address,
            );

            let slot = if first_creation {
                self.rtv_heap.allocate().map_err(RhiError::from)?
            } else {
                self.views[index as usize].slot()
            };
            self.device
                .create_render_target_view(
                    created.id,
                    slot.cpu,
                    &RenderTargetViewDesc {
                        format: self.format,
                        mip_slice: 0,
                    },
                )
                .map_err(RhiError::from)?;

            let view = RhiResourceView::new(
                ViewKind::RenderTarget,
                created.id,
                self.generation,
                slot,
            );
            if first_creation {
                self.buffers.push(resource);
                self.views.push(view);
            } else {
                self.buffers[index as usize] = resource;
                self.views[index as usize] = view;
            }
        }
        Ok(())
    }

    fn destroy_buffers(&mut self) {
        for buffer in &self.buffers {
            self.device.destroy_resource(buffer.id());
        }
    }
}

impl Swapchain for HeadlessSwapchain {
    fn buffer_count(&self) -> u32 {
        self.buffers.len() as u32
    }

    fn current_index(&self) -> u32 {
        self.current
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn back_buffer(&self) -> &RhiResource {
        &self.buffers[self.current as usize]
    }

    fn back_buffer_mut(&mut self) -> &mut RhiResource {
        &mut self.buffers[self.current as usize]
    }

    fn back_buffer_view(&self) -> RhiResourceView {
        self.views[self.current as usize]
    }

    fn present(&mut self, vsync_interval: u32) -> Result<(), RhiError> {
        let buffer = &self.buffers[self.current as usize];
        if buffer.state() != ResourceState::Present {
            log::error!(
                "Back buffer {} presented in state {:?}",
                self.current,
                buffer.state()
            );
            panic!("back buffer presented outside the Present state");
        }
        log::trace!(
            "Presented buffer {} (vsync {vsync_interval})",
            self.current
        );
        self.presented_frames += 1;
        self.current = (self.current + 1) % self.buffers.len() as u32;
        Ok(())
    }

    fn resize(&mut self, extent: Extent2D) -> Result<(), RhiError> {
        if extent == self.extent {
            return Ok(());
        }
        log::info!(
            "Swapchain resize {}x{} -> {}x{}",
            self.extent.width,
            self.extent.height,
            extent.width,
            extent.height
        );
        self.destroy_buffers();
        self.extent = extent;
        self.generation += 1;
        self.current = 0;
        self.create_buffers()
    }
}

impl Drop for HeadlessSwapchain {
    fn drop(&mut self) {
        self.destroy_buffers();
    }
}
