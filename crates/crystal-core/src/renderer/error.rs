// Copyright 2025 eraflo
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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::api::{DrawListTag, ResourceGroupId, ShaderVariantId};
use std::fmt;

/// An error related to shader reflection data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// A vertex-input semantic name could not be parsed.
    InvalidSemantic {
        /// The semantic name as declared by the shader.
        name: String,
    },
    /// A shader pass declares no variants at all.
    NoVariants {
        /// The name of the pass.
        pass: String,
    },
    /// The default variant index points outside the pass' variant list.
    InvalidDefaultVariant {
        /// The name of the pass.
        pass: String,
        /// The offending index.
        index: usize,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::InvalidSemantic { name } => {
                write!(f, "Invalid vertex input semantic '{name}'")
            }
            ShaderError::NoVariants { pass } => {
                write!(f, "Shader pass '{pass}' declares no variants")
            }
            ShaderError::InvalidDefaultVariant { pass, index } => {
                write!(
                    f,
                    "Default variant index {index} is out of range for shader pass '{pass}'"
                )
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation of a pipeline state object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The backend failed to compile the pipeline state for a variant.
    CompilationFailed {
        /// The variant the pipeline was requested for.
        variant: ShaderVariantId,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// The draw-list tag is not known to the backend.
    UnknownDrawListTag(DrawListTag),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::CompilationFailed { variant, details } => {
                write!(
                    f,
                    "Pipeline compilation failed for variant {variant:?}: {details}"
                )
            }
            PipelineError::UnknownDrawListTag(tag) => {
                write!(f, "Unknown draw-list tag: {tag:?}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error related to the creation or use of a GPU resource (buffers, resource groups, etc.).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A pipeline-specific error occurred.
    Pipeline(PipelineError),
    /// A resource group id does not name a live resource group.
    InvalidResourceGroup(ResourceGroupId),
    /// The handle or ID used to reference a resource is invalid.
    InvalidHandle,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// The device ran out of memory for the requested allocation.
    OutOfMemory,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::InvalidResourceGroup(id) => {
                write!(f, "Invalid resource group: {id:?}")
            }
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfMemory => write!(f, "The device is out of memory."),
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

/// A high-level error raised while compiling or building draw packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The device refused to build a draw packet from the submitted items.
    PacketBuildFailed(String),
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// The graphics device was lost and every device object is invalid.
    DeviceLost,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::PacketBuildFailed(msg) => {
                write!(f, "Failed to build draw packet: {msg}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::DeviceLost => write!(
                f,
                "The graphics device was lost and needs to be reinitialized."
            ),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

impl From<PipelineError> for RenderError {
    fn from(err: PipelineError) -> Self {
        RenderError::ResourceError(err.into())
    }
}
