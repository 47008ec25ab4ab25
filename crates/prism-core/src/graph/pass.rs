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

//! The render-pass contract.
//!
//! A pass lives from startup to shutdown: constructed once, initialized
//! once (shader and pipeline setup), then every frame it first declares its
//! inputs and outputs against logical resource names (creating them through
//! the resource context; idempotent, free when nothing changed) and is then
//! asked to record commands in the order the scheduler resolved.

use crate::graph::error::GraphError;
use crate::graph::frame::FrameInfo;
use crate::graph::graphic_context::GraphicContext;
use crate::graph::resource_context::ResourceContext;
use crate::graph::visual::VisualItem;
use crate::rhi::types::ResourceState;
use crate::shader::ShaderLibrary;

/// The declared read and write sets of one pass for one frame.
///
/// Reads and writes are bipartite sets against logical resource names; the
/// scheduler derives pass ordering from them.
#[derive(Debug, Default, Clone)]
pub struct PassIo {
    reads: Vec<(String, ResourceState)>,
    writes: Vec<(String, ResourceState)>,
}

impl PassIo {
    /// The resources the pass reads, with the state it reads them in.
    pub fn reads(&self) -> &[(String, ResourceState)] {
        &self.reads
    }

    /// The resources the pass writes, with the state it writes them in.
    pub fn writes(&self) -> &[(String, ResourceState)] {
        &self.writes
    }

    /// Records a read of `name` in `state`.
    pub fn push_read(&mut self, name: &str, state: ResourceState) {
        self.reads.push((name.to_string(), state));
    }

    /// Records a write of `name` in `state`.
    pub fn push_write(&mut self, name: &str, state: ResourceState) {
        self.writes.push((name.to_string(), state));
    }
}

/// What a pass sees during the declare phase.
pub struct RegisterContext<'a> {
    /// The registry to create resources, views and pipelines through.
    pub resources: &'a mut ResourceContext,
    /// The shader library for module loads.
    pub shaders: &'a mut ShaderLibrary,
    /// Facts about the frame being declared.
    pub frame: &'a FrameInfo,
    io: PassIo,
}

impl<'a> RegisterContext<'a> {
    /// Creates a declare-phase context.
    pub fn new(
        resources: &'a mut ResourceContext,
        shaders: &'a mut ShaderLibrary,
        frame: &'a FrameInfo,
    ) -> Self {
        Self {
            resources,
            shaders,
            frame,
            io: PassIo::default(),
        }
    }

    /// Declares that the pass reads `name` in `state`.
    pub fn reads(&mut self, name: &str, state: ResourceState) {
        self.io.push_read(name, state);
    }

    /// Declares that the pass writes `name` in `state`.
    pub fn writes(&mut self, name: &str, state: ResourceState) {
        self.io.push_write(name, state);
    }

    /// Finishes the declare phase, yielding the collected sets.
    pub fn into_io(self) -> PassIo {
        self.io
    }
}

/// What a pass sees during the execute phase.
pub struct RenderPassContext<'a> {
    /// The frame's graphic context (command list + shadow state).
    pub graphics: &'a mut GraphicContext,
    /// The registry resources and views are fetched from.
    pub resources: &'a mut ResourceContext,
    /// Facts about the frame being recorded.
    pub frame: &'a FrameInfo,
    /// The drawable items extracted for this frame.
    pub visuals: &'a [VisualItem],
}

impl RenderPassContext<'_> {
    /// Transitions the named resource to `state`, recording a barrier when
    /// the tracked state differs.
    pub fn transition(&mut self, resource_name: &str, state: ResourceState) {
        let resource = self.resources.resource_mut(resource_name);
        self.graphics.list_mut().transition_resource(resource, state);
    }
}

/// A named unit of per-frame GPU work with declared inputs and outputs.
///
/// `register_input_output` must be idempotent and free of side effects
/// beyond resource/view/pipeline creation through the resource context, so
/// calling it every frame with unchanged parameters performs no GPU work.
/// `render` must not assume any ordering relative to other passes beyond
/// what the scheduler resolved from the declared sets.
pub trait RenderPass {
    /// The pass name, used for logs, markers and cycle reports.
    fn name(&self) -> &str;

    /// One-time setup: shader loads, root signatures, static state.
    fn initialize(
        &mut self,
        resources: &mut ResourceContext,
        shaders: &mut ShaderLibrary,
    ) -> Result<(), GraphError>;

    /// Per-frame declaration of inputs and outputs.
    fn register_input_output(&mut self, ctx: &mut RegisterContext<'_>) -> Result<(), GraphError>;

    /// Per-frame command recording, in scheduler-resolved order.
    fn render(&mut self, ctx: &mut RenderPassContext<'_>) -> Result<(), GraphError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_sets_are_collected_in_order() {
        let mut io = PassIo::default();
        io.reads.push(("A".to_string(), ResourceState::ShaderResource));
        io.writes.push(("B".to_string(), ResourceState::RenderTarget));
        io.writes.push(("C".to_string(), ResourceState::DepthWrite));

        assert_eq!(io.reads().len(), 1);
        assert_eq!(io.writes().len(), 2);
        assert_eq!(io.writes()[0].0, "B");
    }
}
