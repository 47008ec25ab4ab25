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

//! Defines the hierarchy of error types for the RHI layer.
//!
//! Creation-path failures are logged at error severity where they occur and
//! then surfaced as structured values up the stack; whether a failure is
//! fatal is decided by the binary, not down here. Contract violations
//! (querying uncreated state, recording into a closed list) are not errors;
//! they log and panic at the violation site.

use crate::rhi::descriptor::DescriptorHeapKind;
use std::fmt;

/// An error related to loading or compiling a shader module.
#[derive(Debug)]
pub enum ShaderError {
    /// The shader source could not be loaded from disk.
    LoadError {
        /// The path of the file that failed to load.
        path: String,
        /// The underlying I/O error.
        source_error: String,
    },
    /// The shader source failed to compile to bytecode.
    CompilationError {
        /// A descriptive label for the shader (usually `path:entry`).
        label: String,
        /// Detailed error messages from the compiler.
        details: String,
    },
    /// The requested shader module is not present in the library.
    ModuleNotFound {
        /// The `path:entry` label of the missing module.
        label: String,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::LoadError { path, source_error } => {
                write!(f, "Failed to load shader source from '{path}': {source_error}")
            }
            ShaderError::CompilationError { label, details } => {
                write!(f, "Shader compilation failed for '{label}': {details}")
            }
            ShaderError::ModuleNotFound { label } => {
                write!(f, "Shader module '{label}' is not loaded")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to building a root signature or pipeline state object.
#[derive(Debug)]
pub enum PipelineError {
    /// The backend rejected the pipeline description.
    CompilationFailed {
        /// A descriptive label for the pipeline, if available.
        label: Option<String>,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// The root signature description is malformed.
    InvalidRootSignature(String),
    /// A render-target or depth format in the description is unsupported.
    IncompatibleTargetFormat(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::CompilationFailed { label, details } => {
                write!(
                    f,
                    "Pipeline compilation failed for '{}': {}",
                    label.as_deref().unwrap_or("unnamed"),
                    details
                )
            }
            PipelineError::InvalidRootSignature(msg) => {
                write!(f, "Invalid root signature: {msg}")
            }
            PipelineError::IncompatibleTargetFormat(msg) => {
                write!(f, "Incompatible target format: {msg}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error related to creating or using a GPU resource or view.
#[derive(Debug)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A pipeline-specific error occurred.
    Pipeline(PipelineError),
    /// The backend failed to allocate GPU memory for a resource.
    AllocationFailed {
        /// The debug name of the resource being created.
        name: String,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// The backend failed to write a view descriptor.
    ViewCreationFailed(String),
    /// A descriptor heap has no free slots left.
    OutOfDescriptors {
        /// The heap kind that ran dry.
        kind: DescriptorHeapKind,
        /// The heap's fixed capacity.
        capacity: u32,
    },
    /// A handle referred to an object the backend does not know.
    InvalidHandle,
    /// An error originating from the specific backend implementation.
    BackendError(String),
    /// An access went past the end of a resource.
    OutOfBounds,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::AllocationFailed { name, details } => {
                write!(f, "Failed to allocate resource '{name}': {details}")
            }
            ResourceError::ViewCreationFailed(msg) => {
                write!(f, "Failed to create resource view: {msg}")
            }
            ResourceError::OutOfDescriptors { kind, capacity } => {
                write!(f, "Descriptor heap {kind:?} exhausted ({capacity} slots)")
            }
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            ResourceError::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}

/// A high-level error from the graphics device or submission machinery.
#[derive(Debug)]
pub enum RhiError {
    /// A failure occurred while bringing up the graphics backend.
    InitializationFailed(String),
    /// The graphics device was lost (driver crash or reset).
    DeviceLost,
    /// An error occurred while managing a GPU resource.
    Resource(ResourceError),
    /// An unexpected internal error.
    Internal(String),
}

impl fmt::Display for RhiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RhiError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize graphics backend: {msg}")
            }
            RhiError::DeviceLost => {
                write!(f, "The graphics device was lost and needs to be reinitialized.")
            }
            RhiError::Resource(err) => write!(f, "Graphics resource operation failed: {err}"),
            RhiError::Internal(msg) => write!(f, "An internal error occurred: {msg}"),
        }
    }
}

impl std::error::Error for RhiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RhiError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RhiError {
    fn from(err: ResourceError) -> Self {
        RhiError::Resource(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn shader_error_display() {
        let err = ShaderError::LoadError {
            path: "shaders/gbuffer.hlsl".to_string(),
            source_error: "file not found".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Failed to load shader source from 'shaders/gbuffer.hlsl': file not found"
        );
    }

    #[test]
    fn resource_error_wraps_shader_error() {
        let shader_err = ShaderError::ModuleNotFound {
            label: "lighting.hlsl:PSMain".to_string(),
        };
        let res_err: ResourceError = shader_err.into();
        assert!(res_err.source().is_some());
        assert_eq!(
            format!("{res_err}"),
            "Shader resource error: Shader module 'lighting.hlsl:PSMain' is not loaded"
        );
    }

    #[test]
    fn rhi_error_chain() {
        let err: RhiError = ResourceError::InvalidHandle.into();
        assert!(err.source().is_some());
        assert_eq!(
            format!("{err}"),
            "Graphics resource operation failed: Invalid resource handle or ID."
        );
    }
}
