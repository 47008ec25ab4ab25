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

//! The frame scheduler: registered passes, per-frame declare and execute
//! phases, and dependency-driven execution ordering.
//!
//! Ordering is resolved from the declared read/write sets each frame:
//! writers come before their readers, and multiple writers of one resource
//! keep their registration order. Ties between independent passes are broken
//! by registration index, so the authored pass order survives wherever no
//! dependency says otherwise.

use crate::graph::error::GraphError;
use crate::graph::frame::FrameInfo;
use crate::graph::graphic_context::GraphicContext;
use crate::graph::pass::{PassIo, RegisterContext, RenderPass, RenderPassContext};
use crate::graph::resource_context::ResourceContext;
use crate::graph::visual::VisualItem;
use crate::rhi::command_queue::CommandQueue;
use crate::shader::ShaderLibrary;
use std::collections::BinaryHeap;
use std::cmp::Reverse;

/// Everything the scheduler needs mutable access to for one frame.
pub struct FrameEnv<'a> {
    /// The graphics queue frames are submitted to.
    pub queue: &'a mut CommandQueue,
    /// The frame's graphic context.
    pub graphics: &'a mut GraphicContext,
    /// The frame-graph resource registry.
    pub resources: &'a mut ResourceContext,
    /// The shader library (polled for hot reloads each frame).
    pub shaders: &'a mut ShaderLibrary,
    /// Drawable items extracted by the world layer.
    pub visuals: &'a [VisualItem],
}

/// Summary of one scheduled frame, for logs and tests.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// Pass names in resolved execution order.
    pub execution_order: Vec<String>,
    /// Number of shader modules that picked up new bytecode this frame.
    pub reloaded_shaders: usize,
}

/// Schedules registered passes against the frame's contexts.
#[derive(Default)]
pub struct FrameScheduler {
    passes: Vec<Box<dyn RenderPass>>,
    initialized: bool,
    shader_generation_seen: u64,
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("passes", &self.passes.len())
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl FrameScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pass. Registration order is the tie-break order for
    /// independent passes.
    pub fn register_pass(&mut self, pass: Box<dyn RenderPass>) {
        log::info!("Registered render pass '{}'", pass.name());
        self.passes.push(pass);
    }

    /// Number of registered passes.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Runs one frame: reconcile shader reloads, declare, order, execute.
    ///
    /// Each pass's `render` is wrapped in a named GPU marker region.
    /// Submission of the recorded list stays with the caller.
    pub fn execute_frame(
        &mut self,
        frame: &FrameInfo,
        env: &mut FrameEnv<'_>,
    ) -> Result<FrameReport, GraphError> {
        // Shader hot-reload is a stall point by design: a pipeline that may
        // still be referenced by in-flight GPU work cannot be rebuilt until
        // the queue drains.
        let reloaded_shaders = env.shaders.poll_changes();
        let shader_generation = env.shaders.generation();
        if shader_generation != self.shader_generation_seen {
            log::info!("Shader changes detected; draining GPU before pipeline rebuild");
            env.queue.flush();
            self.shader_generation_seen = shader_generation;
        }

        env.resources.reset_frame();

        if !self.initialized {
            for pass in &mut self.passes {
                log::debug!("Initializing render pass '{}'", pass.name());
                pass.initialize(env.resources, env.shaders)?;
            }
            self.initialized = true;
        }

        // Declare phase.
        let mut ios = Vec::with_capacity(self.passes.len());
        for pass in &mut self.passes {
            let mut register = RegisterContext::new(env.resources, env.shaders, frame);
            pass.register_input_output(&mut register)?;
            ios.push(register.into_io());
        }

        // Resolve ordering from the declared sets.
        let order = resolve_execution_order(&ios).map_err(|cycle| {
            GraphError::DependencyCycle(
                cycle
                    .into_iter()
                    .map(|i| self.passes[i].name().to_string())
                    .collect(),
            )
        })?;

        // Execute phase.
        let mut execution_order = Vec::with_capacity(order.len());
        for &index in &order {
            let pass = &mut self.passes[index];
            env.graphics.begin_marker(pass.name());
            let mut ctx = RenderPassContext {
                graphics: &mut *env.graphics,
                resources: &mut *env.resources,
                frame,
                visuals: env.visuals,
            };
            pass.render(&mut ctx)?;
            env.graphics.end_marker();
            execution_order.push(pass.name().to_string());
        }

        Ok(FrameReport {
            execution_order,
            reloaded_shaders,
        })
    }
}

/// Topologically orders passes from their declared read/write sets.
///
/// Edges: every writer of a resource precedes every reader of it, and
/// multiple writers of the same resource keep their registration order.
/// Kahn's algorithm with a min-heap over registration indices keeps the
/// result deterministic and faithful to authored order among independent
/// passes. On a cycle, the indices of the passes stuck in it are returned.
pub fn resolve_execution_order(ios: &[PassIo]) -> Result<Vec<usize>, Vec<usize>> {
    let pass_count = ios.len();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); pass_count];
    let mut in_degrees = vec![0usize; pass_count];

    let add_edge = |adjacency: &mut Vec<Vec<usize>>,
                    in_degrees: &mut Vec<usize>,
                    from: usize,
                    to: usize| {
        if from != to && !adjacency[from].contains(&to) {
            adjacency[from].push(to);
            in_degrees[to] += 1;
        }
    };

    // Collect writers and readers per logical resource name.
    let mut names: Vec<&str> = Vec::new();
    for io in ios {
        for (name, _) in io.reads().iter().chain(io.writes()) {
            if !names.contains(&name.as_str()) {
                names.push(name.as_str());
            }
        }
    }

    for name in names {
        let writers: Vec<usize> = (0..pass_count)
            .filter(|&i| ios[i].writes().iter().any(|(n, _)| n == name))
            .collect();
        let readers: Vec<usize> = (0..pass_count)
            .filter(|&i| ios[i].reads().iter().any(|(n, _)| n == name))
            .collect();

        for &writer in &writers {
            for &reader in &readers {
                add_edge(&mut adjacency, &mut in_degrees, writer, reader);
            }
        }
        for pair in writers.windows(2) {
            add_edge(&mut adjacency, &mut in_degrees, pair[0], pair[1]);
        }
    }

    // Kahn's algorithm; the min-heap pops the lowest registration index
    // among ready passes.
    let mut ready: BinaryHeap<Reverse<usize>> = (0..pass_count)
        .filter(|&i| in_degrees[i] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(pass_count);

    while let Some(Reverse(index)) = ready.pop() {
        order.push(index);
        for &next in &adjacency[index] {
            in_degrees[next] -= 1;
            if in_degrees[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() != pass_count {
        let stuck: Vec<usize> = (0..pass_count).filter(|&i| in_degrees[i] > 0).collect();
        Err(stuck)
    } else {
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::types::ResourceState;

    fn io(reads: &[&str], writes: &[&str]) -> PassIo {
        let mut result = PassIo::default();
        for name in reads {
            result.push_read(name, ResourceState::ShaderResource);
        }
        for name in writes {
            result.push_write(name, ResourceState::RenderTarget);
        }
        result
    }

    #[test]
    fn writers_precede_readers() {
        // Pass 1 reads what pass 0 writes; pass 2 is independent.
        let ios = vec![
            io(&[], &["GBufferAlbedoTexture"]),
            io(&["GBufferAlbedoTexture"], &["SceneColorTexture"]),
            io(&[], &["ShadowMapTexture"]),
        ];
        let order = resolve_execution_order(&ios).unwrap();
        let pos = |i: usize| order.iter().position(|&x| x == i).unwrap();
        assert!(pos(0) < pos(1));
    }

    #[test]
    fn registration_order_breaks_ties() {
        let ios = vec![io(&[], &["A"]), io(&[], &["B"]), io(&[], &["C"])];
        assert_eq!(resolve_execution_order(&ios).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn dependency_overrides_registration_order() {
        // Registered consumer-first; resolved order must flip them.
        let ios = vec![
            io(&["SceneColorTexture"], &["BackBuffer"]),
            io(&[], &["SceneColorTexture"]),
        ];
        assert_eq!(resolve_execution_order(&ios).unwrap(), vec![1, 0]);
    }

    #[test]
    fn shared_writers_keep_registration_order() {
        // Lighting, overlay and gizmos all write the scene color; their
        // authored order must hold.
        let ios = vec![
            io(&[], &["SceneColorTexture"]),
            io(&[], &["SceneColorTexture"]),
            io(&[], &["SceneColorTexture"]),
        ];
        assert_eq!(resolve_execution_order(&ios).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn cycles_are_reported() {
        let ios = vec![io(&["A"], &["B"]), io(&["B"], &["A"])];
        let stuck = resolve_execution_order(&ios).unwrap_err();
        assert_eq!(stuck, vec![0, 1]);
    }
}
