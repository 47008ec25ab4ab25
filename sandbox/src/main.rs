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

//! Headless sandbox: drives the deferred pipeline for a handful of frames,
//! exercises a resize, and prints what the renderer did.

use anyhow::Context;
use glam::{Mat4, Vec3};
use prism_core::graph::{
    DescriptorHeapCapacities, FrameEnv, FrameInfo, FrameScheduler, FrameSync, GraphicContext,
    ResourceContext, VisualItem,
};
use prism_core::rhi::{
    CommandQueue, Extent2D, Format, QueueKind, ResourceState, RhiDevice, TextureCopyRegion,
};
use prism_core::settings::RendererSettings;
use prism_core::shader::ShaderLibrary;
use prism_core::surface::{SurfaceDescriptor, Swapchain};
use prism_infra::{FileShaderCompiler, HeadlessDevice, HeadlessSwapchain};
use prism_passes::lighting::SCENE_COLOR;
use prism_passes::{
    cube_mesh, upload_mesh, DebugOverlayPass, DeferredLightingPass, EditorGizmoPass, GBufferPass,
    RenderWorld,
};
use std::path::Path;
use std::sync::Arc;

fn load_settings() -> RendererSettings {
    let path = Path::new("sandbox.json");
    if !path.exists() {
        return RendererSettings::default();
    }
    match std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|text| serde_json::from_str(&text).map_err(anyhow::Error::from))
    {
        Ok(settings) => settings,
        Err(err) => {
            log::warn!("Ignoring unreadable sandbox.json: {err}");
            RendererSettings::default()
        }
    }
}

struct Sandbox {
    device: Arc<HeadlessDevice>,
    queue: CommandQueue,
    graphics: GraphicContext,
    resources: ResourceContext,
    shaders: ShaderLibrary,
    scheduler: FrameScheduler,
    swapchain: HeadlessSwapchain,
    frame_sync: FrameSync,
    world: RenderWorld,
    settings: RendererSettings,
    frame_index: u64,
}

impl Sandbox {
    fn new(settings: RendererSettings) -> anyhow::Result<Self> {
        let device = Arc::new(HeadlessDevice::new());
        let dyn_device: Arc<dyn RhiDevice> = device.clone();
        log::info!("Adapter: {}", dyn_device.adapter_name());

        let mut queue = CommandQueue::new(dyn_device.clone(), QueueKind::Graphics)
            .context("creating the graphics queue")?;
        let mut graphics =
            GraphicContext::new(dyn_device.clone(), QueueKind::Graphics, settings.enable_gpu_markers)
                .context("creating the graphic context")?;
        let mut resources =
            ResourceContext::new(dyn_device.clone(), DescriptorHeapCapacities::default())
                .context("creating the resource context")?;

        let shader_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");
        let shaders = ShaderLibrary::new(Box::new(FileShaderCompiler::new(shader_root)));

        let swapchain = HeadlessSwapchain::new(
            dyn_device,
            &SurfaceDescriptor {
                extent: settings.resolution,
                format: Format::Bgra8Unorm,
                buffer_count: settings.buffer_count,
                window: None,
            },
        )
        .context("creating the swapchain")?;

        let mut world = RenderWorld::new();
        world
            .camera
            .look_at(Vec3::new(4.0, 3.0, 4.0), Vec3::ZERO, Vec3::Y);
        world.camera.perspective(
            std::f32::consts::FRAC_PI_3,
            settings.resolution.aspect_ratio(),
            0.1,
            100.0,
        );
        world.set_sun(Vec3::new(-0.4, -1.0, -0.2), [1.0, 0.95, 0.85]);
        world.push_debug_line(Vec3::ZERO, Vec3::Y * 2.0, [1.0, 1.0, 0.0, 1.0]);
        world.select(Some(Mat4::from_translation(Vec3::new(1.5, 0.0, 0.0))));

        // A small scene: three tinted cubes sharing one uploaded mesh.
        let (vertices, indices) = cube_mesh();
        let mesh = upload_mesh(&mut resources, &mut graphics, "Cube", &vertices, &indices)
            .map_err(|err| anyhow::anyhow!("mesh upload failed: {err}"))?;
        graphics.finalize_and_execute(&mut queue, true);

        let tints = [
            (Vec3::new(0.0, 0.0, 0.0), [0.8, 0.2, 0.2, 1.0]),
            (Vec3::new(1.5, 0.0, 0.0), [0.2, 0.8, 0.2, 1.0]),
            (Vec3::new(-1.5, 0.0, 0.0), [0.2, 0.2, 0.8, 1.0]),
        ];
        for (offset, color) in tints {
            world.push_visual(VisualItem {
                vertex_buffer: mesh.vertex,
                index_buffer: Some(mesh.index),
                index_count: mesh.index_count,
                vertex_count: mesh.vertex_count,
                model_matrix: Mat4::from_translation(offset),
                base_color: color,
            });
        }

        let mut scheduler = FrameScheduler::new();
        scheduler.register_pass(Box::new(GBufferPass::new("gbuffer.hlsl")));
        scheduler.register_pass(Box::new(DeferredLightingPass::new(
            "deferred_lighting.hlsl",
            world.lighting(),
        )));
        scheduler.register_pass(Box::new(DebugOverlayPass::new(
            "debug_lines.hlsl",
            world.debug_lines(),
        )));
        scheduler.register_pass(Box::new(EditorGizmoPass::new(
            "debug_lines.hlsl",
            world.gizmo_target(),
        )));

        Ok(Self {
            frame_sync: FrameSync::new(settings.buffer_count),
            device,
            queue,
            graphics,
            resources,
            shaders,
            scheduler,
            swapchain,
            world,
            settings,
            frame_index: 0,
        })
    }

    fn run_frame(&mut self) -> anyhow::Result<()> {
        let extent = self.swapchain.extent();
        self.frame_sync.begin_frame(&self.queue);
        self.graphics
            .reset(&self.queue)
            .context("resetting the graphic context")?;
        self.graphics.set_view_matrix(self.world.camera.view);
        self.graphics
            .set_projection_matrix(self.world.camera.projection);

        let frame = FrameInfo::new(
            self.frame_index,
            self.swapchain.current_index(),
            self.swapchain.buffer_count(),
            extent,
        );
        let report = {
            let mut env = FrameEnv {
                queue: &mut self.queue,
                graphics: &mut self.graphics,
                resources: &mut self.resources,
                shaders: &mut self.shaders,
                visuals: self.world.visuals(),
            };
            self.scheduler
                .execute_frame(&frame, &mut env)
                .map_err(|err| anyhow::anyhow!("frame {} failed: {err}", frame.index))?
        };

        self.graphics.transition(
            self.resources.resource_mut(SCENE_COLOR),
            ResourceState::CopySource,
        );
        self.graphics
            .transition(self.swapchain.back_buffer_mut(), ResourceState::CopyDest);
        let scene_color = self.resources.resource(SCENE_COLOR).id();
        let back_buffer = self.swapchain.back_buffer().id();
        self.graphics.list_mut().copy_texture_region(
            scene_color,
            back_buffer,
            &TextureCopyRegion {
                dst_x: 0,
                dst_y: 0,
                width: extent.width,
                height: extent.height,
            },
        );
        self.graphics
            .transition(self.swapchain.back_buffer_mut(), ResourceState::Present);

        let fence_value = self.graphics.finalize_and_execute(&mut self.queue, false);
        self.swapchain
            .present(self.settings.vsync_interval)
            .map_err(|err| anyhow::anyhow!("present failed: {err}"))?;
        self.frame_sync.end_frame(fence_value);

        log::info!(
            "Frame {} [{}x{}] order: {} (fence {fence_value})",
            self.frame_index,
            extent.width,
            extent.height,
            report.execution_order.join(" -> "),
        );
        self.frame_index += 1;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = load_settings().sanitized();
    let mut sandbox = Sandbox::new(settings)?;

    for _ in 0..3 {
        sandbox.run_frame()?;
    }

    // Exercise the resize path: every frame-sized target is recreated and
    // dependent views rebuild on next access.
    let halved = Extent2D::new(
        sandbox.settings.resolution.width / 2,
        sandbox.settings.resolution.height / 2,
    );
    sandbox
        .swapchain
        .resize(halved)
        .map_err(|err| anyhow::anyhow!("resize failed: {err}"))?;
    for _ in 0..2 {
        sandbox.run_frame()?;
    }

    sandbox.queue.flush();
    let stats = sandbox.device.stats();
    log::info!(
        "Done: {} allocations, {} barriers, {} draws, {} copies, ~{} KiB VRAM",
        stats.allocation_calls,
        stats.barriers,
        stats.draws,
        stats.copies,
        stats.vram_bytes / 1024,
    );
    Ok(())
}
