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

//! End-to-end frame loops over the headless device: the full deferred
//! pipeline with presentation, frame pacing, resize and shader hot-reload.

use glam::{Mat4, Vec3};
use prism_core::graph::{
    DescriptorHeapCapacities, FrameEnv, FrameInfo, FrameReport, FrameScheduler, FrameSync,
    GraphicContext, ResourceContext, VisualItem,
};
use prism_core::rhi::{
    CommandQueue, Extent2D, Format, QueueKind, ResourceState, RhiDevice, TextureCopyRegion,
};
use prism_core::shader::ShaderLibrary;
use prism_core::surface::{SurfaceDescriptor, Swapchain};
use prism_infra::{FileShaderCompiler, HeadlessDevice, HeadlessSwapchain, RecordedCommand};
use prism_passes::gbuffer::FRAME_CONSTANTS;
use prism_passes::lighting::SCENE_COLOR;
use prism_passes::{
    cube_mesh, upload_mesh, DebugOverlayPass, DeferredLightingPass, EditorGizmoPass, GBufferPass,
    RenderWorld,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const GBUFFER_SHADER: &str = "gbuffer.hlsl";
const LIGHTING_SHADER: &str = "deferred_lighting.hlsl";
const LINES_SHADER: &str = "debug_lines.hlsl";

fn write_shader_sources(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("prism-deferred-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(GBUFFER_SHADER),
        b"struct VSOut { float4 position : SV_Position; };\nVSOut VSMain(uint id : SV_VertexID) { VSOut o; o.position = 0; return o; }\nfloat4 PSMain(VSOut i) : SV_Target { return 1; }\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(LIGHTING_SHADER),
        b"float4 VSFullscreen(uint id : SV_VertexID) : SV_Position { return 0; }\nfloat4 PSLighting(float4 p : SV_Position) : SV_Target { return 1; }\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(LINES_SHADER),
        b"float4 VSLine(float3 p : POSITION, float4 c : COLOR) : SV_Position { return 0; }\nfloat4 PSLine(float4 p : SV_Position) : SV_Target { return 1; }\n",
    )
    .unwrap();
    dir
}

struct TestRenderer {
    device: Arc<HeadlessDevice>,
    queue: CommandQueue,
    graphics: GraphicContext,
    resources: ResourceContext,
    shaders: ShaderLibrary,
    scheduler: FrameScheduler,
    swapchain: HeadlessSwapchain,
    frame_sync: FrameSync,
    world: RenderWorld,
    frame_index: u64,
    shader_dir: PathBuf,
}

impl TestRenderer {
    fn new(tag: &str, extent: Extent2D, lighting_registered_first: bool) -> Self {
        let shader_dir = write_shader_sources(tag);
        let device = Arc::new(HeadlessDevice::new());
        let dyn_device: Arc<dyn RhiDevice> = device.clone();

        let mut queue = CommandQueue::new(dyn_device.clone(), QueueKind::Graphics).unwrap();
        let mut graphics = GraphicContext::new(dyn_device.clone(), QueueKind::Graphics, true).unwrap();
        let mut resources =
            ResourceContext::new(dyn_device.clone(), DescriptorHeapCapacities::default()).unwrap();
        let shaders = ShaderLibrary::new(Box::new(FileShaderCompiler::new(&shader_dir)));
        let swapchain = HeadlessSwapchain::new(
            dyn_device,
            &SurfaceDescriptor {
                extent,
                format: Format::Bgra8Unorm,
                buffer_count: 3,
                window: None,
            },
        )
        .unwrap();

        let mut world = RenderWorld::new();
        world.camera.look_at(Vec3::new(3.0, 3.0, 3.0), Vec3::ZERO, Vec3::Y);
        world
            .camera
            .perspective(std::f32::consts::FRAC_PI_3, extent.aspect_ratio(), 0.1, 100.0);

        // Upload the scene geometry through the staging path and drain it.
        let (vertices, indices) = cube_mesh();
        let mesh = upload_mesh(&mut resources, &mut graphics, "Cube", &vertices, &indices).unwrap();
        graphics.finalize_and_execute(&mut queue, true);

        world.push_visual(VisualItem {
            vertex_buffer: mesh.vertex,
            index_buffer: Some(mesh.index),
            index_count: mesh.index_count,
            vertex_count: mesh.vertex_count,
            model_matrix: Mat4::IDENTITY,
            base_color: [0.8, 0.2, 0.2, 1.0],
        });
        world.push_debug_line(Vec3::ZERO, Vec3::Y * 2.0, [1.0, 1.0, 0.0, 1.0]);
        world.select(Some(Mat4::IDENTITY));

        let mut scheduler = FrameScheduler::new();
        let gbuffer = Box::new(GBufferPass::new(GBUFFER_SHADER));
        let lighting = Box::new(DeferredLightingPass::new(LIGHTING_SHADER, world.lighting()));
        if lighting_registered_first {
            scheduler.register_pass(lighting);
            scheduler.register_pass(gbuffer);
        } else {
            scheduler.register_pass(gbuffer);
            scheduler.register_pass(lighting);
        }
        scheduler.register_pass(Box::new(DebugOverlayPass::new(
            LINES_SHADER,
            world.debug_lines(),
        )));
        scheduler.register_pass(Box::new(EditorGizmoPass::new(
            LINES_SHADER,
            world.gizmo_target(),
        )));

        Self {
            device,
            queue,
            graphics,
            resources,
            shaders,
            scheduler,
            swapchain,
            frame_sync: FrameSync::new(3),
            world,
            frame_index: 0,
            shader_dir,
        }
    }

    fn run_frame(&mut self) -> FrameReport {
        let extent = self.swapchain.extent();
        self.frame_sync.begin_frame(&self.queue);
        self.graphics.reset(&self.queue).unwrap();
        self.graphics.set_view_matrix(self.world.camera.view);
        self.graphics.set_projection_matrix(self.world.camera.projection);

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
            self.scheduler.execute_frame(&frame, &mut env).unwrap()
        };

        // Resolve to the back buffer and present.
        self.graphics
            .transition(self.resources.resource_mut(SCENE_COLOR), ResourceState::CopySource);
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
        self.swapchain.present(1).unwrap();
        self.frame_sync.end_frame(fence_value);
        self.frame_index += 1;
        report
    }

    fn touch_gbuffer_shader(&self) {
        let path = self.shader_dir.join(GBUFFER_SHADER);
        let mut source = std::fs::read(&path).unwrap();
        source.extend_from_slice(b"// edited\n");
        std::fs::write(&path, source).unwrap();
        let file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(2)).unwrap();
    }
}

#[test]
fn steady_state_frames_allocate_nothing_new() {
    let mut renderer = TestRenderer::new("steady", Extent2D::new(1920, 1080), false);

    let first = renderer.run_frame();
    assert_eq!(
        first.execution_order,
        vec!["GBuffer", "DeferredLighting", "DebugOverlay", "EditorGizmo"]
    );

    let allocations_after_first = renderer.device.stats().allocation_calls;
    let draws_after_first = renderer.device.stats().draws;

    renderer.run_frame();
    renderer.run_frame();

    // Redeclaring unchanged resources is free; only draws accumulate.
    assert_eq!(renderer.device.stats().allocation_calls, allocations_after_first);
    assert!(renderer.device.stats().draws > draws_after_first);
    assert_eq!(renderer.swapchain.presented_frames(), 3);

    // The camera constants reached the upload buffer.
    let frame_cb = renderer.resources.resource(FRAME_CONSTANTS).id();
    let contents = renderer.device.upload_contents(frame_cb).unwrap();
    assert!(contents.iter().any(|&byte| byte != 0));
}

#[test]
fn passes_record_inside_named_marker_regions() {
    let mut renderer = TestRenderer::new("markers", Extent2D::new(320, 180), false);
    renderer.run_frame();

    // The list is closed but not yet reset; its command stream is intact.
    let commands = renderer.device.recorded_commands(renderer.graphics.list().id());
    let markers: Vec<&str> = commands
        .iter()
        .filter_map(|command| match command {
            RecordedCommand::BeginMarker(label) => Some(label.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        markers,
        vec!["GBuffer", "DeferredLighting", "DebugOverlay", "EditorGizmo"]
    );
    let begins = markers.len();
    let ends = commands
        .iter()
        .filter(|command| matches!(command, RecordedCommand::EndMarker))
        .count();
    assert_eq!(begins, ends);
}

#[test]
fn fence_values_increase_monotonically_across_frames() {
    let mut renderer = TestRenderer::new("fences", Extent2D::new(640, 360), false);

    let mut last = renderer.queue.last_signaled();
    for _ in 0..4 {
        renderer.run_frame();
        let signaled = renderer.queue.last_signaled();
        assert!(signaled > last);
        last = signaled;
    }
    assert!(renderer.queue.is_fence_complete(last));
}

#[test]
fn dependency_order_overrides_registration_order() {
    let mut renderer = TestRenderer::new("order", Extent2D::new(640, 360), true);
    let report = renderer.run_frame();
    assert_eq!(
        report.execution_order,
        vec!["GBuffer", "DeferredLighting", "DebugOverlay", "EditorGizmo"]
    );
}

#[test]
fn resize_recreates_targets_and_rebuilds_views() {
    let mut renderer = TestRenderer::new("resize", Extent2D::new(1920, 1080), false);
    renderer.run_frame();

    assert_eq!(renderer.resources.resource_version("GBufferAlbedoTexture"), 1);
    let allocations_before = renderer.device.stats().allocation_calls;

    renderer.swapchain.resize(Extent2D::new(1280, 720)).unwrap();
    renderer.run_frame();

    // The frame-sized targets were recreated, their views rebuilt, and the
    // next frame ran cleanly against the new resolution.
    assert_eq!(renderer.resources.resource_version("GBufferAlbedoTexture"), 2);
    assert_eq!(renderer.resources.resource_version(SCENE_COLOR), 2);
    assert!(renderer.device.stats().allocation_calls > allocations_before);
    assert!(!renderer.resources.is_view_stale("GBufferAlbedoTextureSrv"));

    let allocations_after_resize = renderer.device.stats().allocation_calls;
    renderer.run_frame();
    assert_eq!(renderer.device.stats().allocation_calls, allocations_after_resize);
}

#[test]
fn shader_edit_rebuilds_the_dependent_pipeline() {
    let mut renderer = TestRenderer::new("hotreload", Extent2D::new(640, 360), false);
    renderer.run_frame();

    let pipeline_before = renderer.resources.pipeline_state("GBufferPipeline");
    let unrelated_before = renderer.resources.pipeline_state("DebugOverlayPipeline");

    renderer.touch_gbuffer_shader();
    let report = renderer.run_frame();

    assert_eq!(report.reloaded_shaders, 2); // VSMain and PSMain share the file.
    assert_ne!(renderer.resources.pipeline_state("GBufferPipeline"), pipeline_before);
    assert_eq!(
        renderer.resources.pipeline_state("DebugOverlayPipeline"),
        unrelated_before
    );
}

#[test]
fn frame_pacing_tracks_per_buffer_fences() {
    let mut renderer = TestRenderer::new("pacing", Extent2D::new(320, 180), false);

    for _ in 0..3 {
        renderer.run_frame();
    }
    // Slot 0 comes around again carrying the fence of the first present.
    assert_eq!(renderer.frame_sync.slot(), 0);
    let pending = renderer.frame_sync.pending_value();
    assert!(pending > 0);
    assert!(renderer.queue.is_fence_complete(pending));
}
