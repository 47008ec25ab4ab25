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

//! Resource-context diffing, view invalidation, descriptor round trips and
//! pipeline caching over the headless device.

use prism_core::graph::{DescriptorHeapCapacities, ResourceContext};
use prism_core::pipeline::{
    BlendStateDesc, DepthStencilStateDesc, GraphicsPipelineDesc, RasterizerDesc, RootSignatureDesc,
};
use prism_core::rhi::{
    ClearValue, DescriptorHeap, DescriptorHeapKind, Extent2D, Format, HeapType,
    PrimitiveTopology, ResourceState, ResourceUsage, RhiDevice, SampleCount,
    ShaderResourceViewDesc, TextureDesc,
};
use prism_core::shader::{ShaderKey, ShaderLibrary, ShaderRequest, ShaderStage};
use prism_infra::{FileShaderCompiler, HeadlessDevice};
use std::path::PathBuf;
use std::sync::Arc;

fn context() -> (Arc<HeadlessDevice>, ResourceContext) {
    let device = Arc::new(HeadlessDevice::new());
    let context = ResourceContext::new(device.clone(), DescriptorHeapCapacities::default()).unwrap();
    (device, context)
}

fn albedo_desc(extent: Extent2D) -> TextureDesc {
    TextureDesc {
        extent,
        format: Format::Rgba8Unorm,
        mip_levels: 1,
        sample_count: SampleCount::One,
        heap: HeapType::Default,
        usage: ResourceUsage::RENDER_TARGET.with(ResourceUsage::SHADER_RESOURCE),
        initial_state: ResourceState::RenderTarget,
        clear_value: Some(ClearValue::Color([0.0, 0.0, 0.0, 1.0])),
    }
}

#[test]
fn unchanged_description_performs_zero_allocations() {
    let (device, mut context) = context();

    let first = context
        .create_texture_2d_resource("AlbedoTexture", albedo_desc(Extent2D::new(1920, 1080)))
        .unwrap();
    let allocations_after_first = device.stats().allocation_calls;

    let second = context
        .create_texture_2d_resource("AlbedoTexture", albedo_desc(Extent2D::new(1920, 1080)))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(device.stats().allocation_calls, allocations_after_first);
}

#[test]
fn changed_description_recreates_and_invalidates_views() {
    let (device, mut context) = context();

    context
        .create_texture_2d_resource(
            "GBufferAlbedoTexture",
            albedo_desc(Extent2D::new(1920, 1080)),
        )
        .unwrap();
    context
        .create_shader_resource_view(
            "GBufferAlbedoTextureSrv",
            "GBufferAlbedoTexture",
            ShaderResourceViewDesc {
                format: Format::Rgba8Unorm,
                most_detailed_mip: 0,
                mip_levels: 1,
            },
        )
        .unwrap();

    let view_before = context.view("GBufferAlbedoTextureSrv");
    assert_eq!(context.resource_version("GBufferAlbedoTexture"), 1);
    assert!(!context.is_view_stale("GBufferAlbedoTextureSrv"));

    // Viewport resize: same name, new extent.
    let old_id = context.resource("GBufferAlbedoTexture").id();
    context
        .create_texture_2d_resource(
            "GBufferAlbedoTexture",
            albedo_desc(Extent2D::new(1280, 720)),
        )
        .unwrap();

    assert_ne!(context.resource("GBufferAlbedoTexture").id(), old_id);
    assert_eq!(context.resource_version("GBufferAlbedoTexture"), 2);
    assert!(context.is_view_stale("GBufferAlbedoTextureSrv"));

    // Access rebuilds into the same slot against the new resource.
    let writes_before = device.stats().view_writes;
    let view_after = context.view("GBufferAlbedoTextureSrv");
    assert_eq!(device.stats().view_writes, writes_before + 1);
    assert_eq!(view_after.slot(), view_before.slot());
    assert_ne!(view_after.resource(), view_before.resource());
    assert_eq!(view_after.built_version(), 2);
    assert!(!context.is_view_stale("GBufferAlbedoTextureSrv"));

    // A second access is served from the rebuilt descriptor.
    let writes_after = device.stats().view_writes;
    let _ = context.view("GBufferAlbedoTextureSrv");
    assert_eq!(device.stats().view_writes, writes_after);
}

#[test]
fn redeclaring_a_view_is_a_no_op() {
    let (device, mut context) = context();
    context
        .create_texture_2d_resource("Probe", albedo_desc(Extent2D::new(64, 64)))
        .unwrap();

    let desc = ShaderResourceViewDesc {
        format: Format::Rgba8Unorm,
        most_detailed_mip: 0,
        mip_levels: 1,
    };
    context.create_shader_resource_view("ProbeSrv", "Probe", desc).unwrap();
    let writes = device.stats().view_writes;
    context.create_shader_resource_view("ProbeSrv", "Probe", desc).unwrap();
    assert_eq!(device.stats().view_writes, writes);
}

#[test]
fn descriptor_heap_allocations_round_trip() {
    let device = Arc::new(HeadlessDevice::new());
    let mut heap = DescriptorHeap::new(device, DescriptorHeapKind::Rtv, 8, false).unwrap();

    let before = heap.live();
    let a = heap.allocate().unwrap();
    let b = heap.allocate().unwrap();
    assert_ne!(a.cpu, b.cpu);
    assert_ne!(a.index, b.index);
    assert_eq!(heap.live(), before + 2);

    heap.free(a);
    heap.free(b);
    assert_eq!(heap.live(), before);
}

#[test]
fn transient_tables_recycle_on_frame_reset() {
    let (_, mut context) = context();

    let live_before = context.shader_heap().live();
    let table = context.allocate_transient_table(4).unwrap();
    assert!(table.gpu.is_some());
    let another = context.allocate_transient_table(4).unwrap();
    assert_ne!(table.cpu, another.cpu);
    assert_eq!(context.shader_heap().live(), live_before + 8);

    context.reset_frame();
    assert_eq!(context.shader_heap().live(), live_before);
}

#[test]
fn pipeline_cache_rebuilds_on_shader_reload() {
    let (_, mut context) = context();

    let dir = std::env::temp_dir().join(format!("prism-pso-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path: PathBuf = dir.join("probe.hlsl");
    std::fs::write(&path, b"float4 VSMain() { return 0; }").unwrap();

    let mut shaders = ShaderLibrary::new(Box::new(FileShaderCompiler::new(&dir)));
    let key = shaders
        .load(ShaderRequest {
            key: ShaderKey {
                path: "probe.hlsl".to_string(),
                entry_point: "VSMain".to_string(),
                stage: ShaderStage::Vertex,
            },
            target_profile: "vs_6_6".to_string(),
        })
        .unwrap();

    let root_signature = context
        .device()
        .create_root_signature(&RootSignatureDesc::default())
        .unwrap();
    let desc = GraphicsPipelineDesc {
        root_signature,
        vertex_shader: key.clone(),
        pixel_shader: None,
        input_layout: Vec::new(),
        topology: PrimitiveTopology::TriangleList,
        rasterizer: RasterizerDesc::default(),
        depth_stencil: DepthStencilStateDesc::default(),
        blend: BlendStateDesc::default(),
        render_target_formats: vec![Format::Rgba8Unorm],
        depth_format: None,
        sample_count: SampleCount::One,
    };

    let first = context
        .register_pipeline_state(&shaders, "ProbePipeline", desc.clone())
        .unwrap();
    let cached = context
        .register_pipeline_state(&shaders, "ProbePipeline", desc.clone())
        .unwrap();
    assert_eq!(first, cached);

    // Simulate the watcher flagging a recompile.
    shaders.mark_recompiled(&key);
    let rebuilt = context
        .register_pipeline_state(&shaders, "ProbePipeline", desc)
        .unwrap();
    assert_ne!(rebuilt, first);
    assert_eq!(context.pipeline_state("ProbePipeline"), rebuilt);
}

#[test]
fn depth_and_acceleration_helpers_follow_the_same_diff_semantics() {
    let (device, mut context) = context();

    let depth = context
        .create_depth_stencil_resource("SceneDepth", Extent2D::new(1024, 1024), Format::D32Float)
        .unwrap();
    let tlas = context.create_acceleration_structure("SceneTlas", 1 << 16).unwrap();
    let allocations = device.stats().allocation_calls;

    // Unchanged redeclarations are free.
    let depth_again = context
        .create_depth_stencil_resource("SceneDepth", Extent2D::new(1024, 1024), Format::D32Float)
        .unwrap();
    let tlas_again = context.create_acceleration_structure("SceneTlas", 1 << 16).unwrap();
    assert_eq!(depth, depth_again);
    assert_eq!(tlas, tlas_again);
    assert_eq!(device.stats().allocation_calls, allocations);

    // A grown acceleration structure is a new allocation.
    let grown = context.create_acceleration_structure("SceneTlas", 1 << 17).unwrap();
    assert_ne!(grown, tlas);
    assert_eq!(context.resource_version("SceneTlas"), 2);
    assert_eq!(
        context.resource("SceneDepth").state(),
        ResourceState::DepthWrite
    );
}

#[test]
#[should_panic(expected = "before creation")]
fn querying_an_uncreated_resource_panics() {
    let (_, context) = context();
    let _ = context.resource("NeverCreated");
}
