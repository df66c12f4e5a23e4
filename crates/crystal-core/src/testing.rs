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

//! Test doubles for the rendering contracts.
//!
//! Enabled with the `testing` feature. [`RecordingDevice`] hands out ids and
//! records every call so tests can assert on allocations and writes;
//! [`FixedScene`] is a scene with the builtin draw lists and one multisample
//! state.

use crate::renderer::api::*;
use crate::renderer::error::{PipelineError, RenderError, ResourceError};
use crate::renderer::traits::{GraphicsDevice, RenderScene};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct DeviceState {
    next_id: usize,
    next_packet: u64,
    buffers: HashMap<BufferId, (String, Vec<u8>)>,
    live_groups: HashMap<ResourceGroupId, ResourceGroupLayout>,
    released_groups: Vec<ResourceGroupId>,
    writes: Vec<(ResourceGroupId, Vec<ResourceGroupEntry>)>,
    pipelines: Vec<(PipelineStateId, ShaderVariantId, DrawListTag, MultisampleState)>,
    packets_built: usize,
    fail_resource_groups: bool,
    fail_pipelines: bool,
}

impl DeviceState {
    fn next(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

/// A [`GraphicsDevice`] that keeps everything in memory and records calls.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    state: Mutex<DeviceState>,
}

impl RecordingDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `create_resource_group` fail.
    pub fn fail_resource_groups(&self, fail: bool) {
        self.state.lock().fail_resource_groups = fail;
    }

    /// Makes every following `create_pipeline_state` fail.
    pub fn fail_pipelines(&self, fail: bool) {
        self.state.lock().fail_pipelines = fail;
    }

    /// Number of resource groups currently alive.
    pub fn live_resource_group_count(&self) -> usize {
        self.state.lock().live_groups.len()
    }

    /// Whether `id` is alive.
    pub fn is_resource_group_live(&self, id: ResourceGroupId) -> bool {
        self.state.lock().live_groups.contains_key(&id)
    }

    /// The layout a live group was created from.
    pub fn resource_group_layout(&self, id: ResourceGroupId) -> Option<ResourceGroupLayout> {
        self.state.lock().live_groups.get(&id).cloned()
    }

    /// Every released group, in release order.
    pub fn released_resource_groups(&self) -> Vec<ResourceGroupId> {
        self.state.lock().released_groups.clone()
    }

    /// Total number of `write_resource_group` calls.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    /// Number of writes that targeted `id`.
    pub fn writes_to(&self, id: ResourceGroupId) -> usize {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|(target, _)| *target == id)
            .count()
    }

    /// The entries of the last write to `id`.
    pub fn last_write(&self, id: ResourceGroupId) -> Option<Vec<ResourceGroupEntry>> {
        self.state
            .lock()
            .writes
            .iter()
            .rev()
            .find(|(target, _)| *target == id)
            .map(|(_, entries)| entries.clone())
    }

    /// Number of pipeline states compiled.
    pub fn pipeline_count(&self) -> usize {
        self.state.lock().pipelines.len()
    }

    /// The multisample state a pipeline was compiled for.
    pub fn pipeline_multisample(&self, id: PipelineStateId) -> Option<MultisampleState> {
        self.state
            .lock()
            .pipelines
            .iter()
            .find(|(pipeline, ..)| *pipeline == id)
            .map(|(.., multisample)| *multisample)
    }

    /// Number of draw packets built.
    pub fn packets_built(&self) -> usize {
        self.state.lock().packets_built
    }

    /// Number of buffers currently alive.
    pub fn buffer_count(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// The contents a buffer was created with.
    pub fn buffer_data(&self, id: BufferId) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&id).map(|(_, data)| data.clone())
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let mut state = self.state.lock();
        let id = BufferId(state.next());
        let label = descriptor.label.as_deref().unwrap_or_default().to_string();
        state.buffers.insert(id, (label, data.to_vec()));
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.state
            .lock()
            .buffers
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_resource_group(
        &self,
        layout: &ResourceGroupLayout,
    ) -> Result<ResourceGroupId, ResourceError> {
        let mut state = self.state.lock();
        if state.fail_resource_groups {
            return Err(ResourceError::OutOfMemory);
        }
        let id = ResourceGroupId(state.next());
        state.live_groups.insert(id, layout.clone());
        Ok(id)
    }

    fn write_resource_group(
        &self,
        id: ResourceGroupId,
        entries: &[ResourceGroupEntry],
    ) -> Result<(), ResourceError> {
        let mut state = self.state.lock();
        if !state.live_groups.contains_key(&id) {
            return Err(ResourceError::InvalidResourceGroup(id));
        }
        state.writes.push((id, entries.to_vec()));
        Ok(())
    }

    fn release_resource_group(&self, id: ResourceGroupId) {
        let mut state = self.state.lock();
        if state.live_groups.remove(&id).is_some() {
            state.released_groups.push(id);
        }
    }

    fn create_pipeline_state(
        &self,
        descriptor: &PipelineStateDescriptor,
    ) -> Result<PipelineStateId, PipelineError> {
        let mut state = self.state.lock();
        if state.fail_pipelines {
            return Err(PipelineError::CompilationFailed {
                variant: descriptor.variant,
                details: "pipeline creation disabled".to_string(),
            });
        }
        let id = PipelineStateId(state.next());
        state.pipelines.push((
            id,
            descriptor.variant,
            descriptor.draw_list_tag,
            descriptor.multisample,
        ));
        Ok(id)
    }

    fn build_draw_packet(&self, request: DrawPacketRequest) -> Result<DrawPacket, RenderError> {
        let mut state = self.state.lock();
        state.packets_built += 1;
        state.next_packet += 1;
        Ok(DrawPacket::from_request(
            DrawPacketId(state.next_packet),
            request,
        ))
    }
}

/// A [`RenderScene`] with the builtin draw lists and per-tag multisample overrides.
#[derive(Debug, Clone)]
pub struct FixedScene {
    settings: RenderSettings,
    registry: DrawListTagRegistry,
    multisample: MultisampleState,
    overrides: HashMap<DrawListTag, MultisampleState>,
}

impl FixedScene {
    /// A scene using the default settings.
    pub fn new() -> Self {
        Self::with_settings(RenderSettings::default())
    }

    /// A scene using the given settings.
    pub fn with_settings(settings: RenderSettings) -> Self {
        let registry = DrawListTagRegistry::with_builtins(&settings);
        Self {
            settings,
            registry,
            multisample: MultisampleState::default(),
            overrides: HashMap::new(),
        }
    }

    /// Registers (or looks up) a non-builtin draw list.
    pub fn tag(&mut self, name: &str) -> DrawListTag {
        self.registry.acquire_tag(name)
    }

    /// The tag of a builtin draw list.
    pub fn builtin(&self, tag: BuiltinDrawListTag) -> DrawListTag {
        self.registry.builtin(tag)
    }

    /// Sets the multisample state of every pass without an override.
    pub fn set_multisample(&mut self, state: MultisampleState) {
        self.multisample = state;
    }

    /// Overrides the multisample state of one pass.
    pub fn set_pass_multisample(&mut self, tag: DrawListTag, state: MultisampleState) {
        self.overrides.insert(tag, state);
    }
}

impl Default for FixedScene {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScene for FixedScene {
    fn builtin_draw_list_tag(&self, tag: BuiltinDrawListTag) -> DrawListTag {
        self.registry.builtin(tag)
    }

    fn multisample_state(&self, tag: DrawListTag) -> MultisampleState {
        self.overrides
            .get(&tag)
            .copied()
            .unwrap_or(self.multisample)
    }

    fn settings(&self) -> &RenderSettings {
        &self.settings
    }
}
