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

//! The frame graph: per-frame pass registration, resource lifetime and
//! execution ordering.
//!
//! Each frame the scheduler runs two phases over the registered passes: a
//! declare phase, where every pass creates-or-reuses its resources through
//! the [`ResourceContext`] and declares its read/write sets, and an execute
//! phase, where passes record into the shared [`GraphicContext`] in the
//! order resolved from those sets.

pub mod error;
pub mod frame;
pub mod graphic_context;
pub mod pass;
pub mod resource_context;
pub mod scheduler;
pub mod visual;

pub use self::error::GraphError;
pub use self::frame::{FrameInfo, FrameSync};
pub use self::graphic_context::GraphicContext;
pub use self::pass::{PassIo, RegisterContext, RenderPass, RenderPassContext};
pub use self::resource_context::{DescriptorHeapCapacities, ResourceContext};
pub use self::scheduler::{resolve_execution_order, FrameEnv, FrameReport, FrameScheduler};
pub use self::visual::VisualItem;
