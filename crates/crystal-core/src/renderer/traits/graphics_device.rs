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

use crate::renderer::api::*;
use crate::renderer::error::{PipelineError, RenderError, ResourceError};
use std::fmt::Debug;

/// The slice of a graphics device the mesh path needs.
///
/// Every method takes `&self`; backends use interior mutability. Calls are
/// confined to the render thread and never block on I/O.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new GPU buffer and initializes it with the provided data.
    /// ## Arguments
    /// * `descriptor` - A reference to a `BufferDescriptor` containing the buffer configuration.
    /// * `data` - A slice of bytes containing the initial data for the buffer.
    /// ## Returns
    /// A `Result` containing the ID of the created buffer or an error if the creation fails.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer.
    /// ## Arguments
    /// * `id` - The ID of the buffer to be destroyed.
    /// ## Returns
    /// A `Result` indicating success or failure of the operation.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Creates a resource group from a binding layout.
    /// ## Arguments
    /// * `layout` - The layout the group must match.
    /// ## Returns
    /// A `Result` containing the ID of the created resource group.
    /// ## Errors
    /// * `ResourceError` - If the device cannot allocate the group.
    fn create_resource_group(
        &self,
        layout: &ResourceGroupLayout,
    ) -> Result<ResourceGroupId, ResourceError>;

    /// Stages new values for a resource group.
    ///
    /// Entries are written in order; a later entry with the same name
    /// overwrites an earlier one.
    /// ## Errors
    /// * `ResourceError::InvalidResourceGroup` - If `id` was released or never created.
    fn write_resource_group(
        &self,
        id: ResourceGroupId,
        entries: &[ResourceGroupEntry],
    ) -> Result<(), ResourceError>;

    /// Releases a resource group.
    ///
    /// The device defers the actual destruction until no frame in flight
    /// references the group, so callers may release as soon as they stop
    /// using the id.
    fn release_resource_group(&self, id: ResourceGroupId);

    /// Compiles a pipeline state for a shader variant in a given pass.
    /// ## Arguments
    /// * `descriptor` - The variant, draw list and multisample configuration.
    /// ## Errors
    /// * `PipelineError` - If the backend rejects the combination.
    fn create_pipeline_state(
        &self,
        descriptor: &PipelineStateDescriptor,
    ) -> Result<PipelineStateId, PipelineError>;

    /// Seals a set of draw items into an immutable draw packet.
    /// ## Errors
    /// * `RenderError` - If the packet cannot be built.
    fn build_draw_packet(&self, request: DrawPacketRequest) -> Result<DrawPacket, RenderError>;
}
