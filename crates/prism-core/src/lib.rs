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

//! # Prism Core
//!
//! Backend-agnostic rendering contracts and the frame-pass scheduler.
//!
//! The [`rhi`] module is the render hardware interface: resource and view
//! primitives, descriptor allocation, the command abstraction and the fence
//! machinery, all generic over the [`rhi::RhiDevice`] backend seam. The
//! [`graph`] module is the frame scheduler built on top of it: logical
//! resources with diff-based recreation, declarative pass inputs/outputs and
//! dependency-resolved execution ordering. Concrete backends live in
//! `prism-infra`.

#![warn(missing_docs)]

pub mod graph;
pub mod pipeline;
pub mod rhi;
pub mod settings;
pub mod shader;
pub mod surface;

pub use settings::RendererSettings;
