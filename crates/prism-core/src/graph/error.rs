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

//! Errors surfaced by the frame scheduler and pass machinery.

use crate::rhi::error::{PipelineError, ResourceError, RhiError, ShaderError};
use std::fmt;

/// An error from frame scheduling or pass execution.
#[derive(Debug)]
pub enum GraphError {
    /// The declared read/write sets of the registered passes form a cycle.
    DependencyCycle(Vec<String>),
    /// A device-level failure during pass setup or recording.
    Rhi(RhiError),
    /// A resource or view operation failed.
    Resource(ResourceError),
    /// A pipeline build failed.
    Pipeline(PipelineError),
    /// A shader load or compile failed.
    Shader(ShaderError),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DependencyCycle(passes) => {
                write!(f, "Pass dependencies form a cycle: {}", passes.join(" -> "))
            }
            GraphError::Rhi(err) => write!(f, "Frame graph device error: {err}"),
            GraphError::Resource(err) => write!(f, "Frame graph resource error: {err}"),
            GraphError::Pipeline(err) => write!(f, "Frame graph pipeline error: {err}"),
            GraphError::Shader(err) => write!(f, "Frame graph shader error: {err}"),
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphError::DependencyCycle(_) => None,
            GraphError::Rhi(err) => Some(err),
            GraphError::Resource(err) => Some(err),
            GraphError::Pipeline(err) => Some(err),
            GraphError::Shader(err) => Some(err),
        }
    }
}

impl From<RhiError> for GraphError {
    fn from(err: RhiError) -> Self {
        GraphError::Rhi(err)
    }
}

impl From<ResourceError> for GraphError {
    fn from(err: ResourceError) -> Self {
        GraphError::Resource(err)
    }
}

impl From<PipelineError> for GraphError {
    fn from(err: PipelineError) -> Self {
        GraphError::Pipeline(err)
    }
}

impl From<ShaderError> for GraphError {
    fn from(err: ShaderError) -> Self {
        GraphError::Shader(err)
    }
}
