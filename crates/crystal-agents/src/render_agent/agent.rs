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

//! Defines the MeshRenderAgent, the per-frame orchestrator of static mesh rendering.

use super::feature_processor::{FramePrepareStats, StaticMeshFeatureProcessor};
use super::mesh_preparation::MeshPreparationSystem;
use super::static_mesh_component::StaticMeshComponent;
use crystal_core::math::Mat4;
use crystal_core::renderer::{DrawPacket, GraphicsDevice, RenderScene};

/// The agent driving static mesh components and their feature processor.
///
/// Each frame it ticks every component (so handles are rebuilt, patched or
/// released and transforms are pushed), then lets the feature processor
/// compile packets and flush materials.
///
/// The feature processor is optional: a scene without one still ticks its
/// components, which then simply wait.
#[derive(Debug)]
pub struct MeshRenderAgent {
    // Owner of every mesh registration.
    feature_processor: Option<StaticMeshFeatureProcessor>,
    // Uploads and caches static meshes.
    mesh_preparation_system: MeshPreparationSystem,
    // Counters of the last prepared frame.
    last_stats: FramePrepareStats,
    // Total number of frames prepared since agent creation.
    frame_count: u64,
}

impl MeshRenderAgent {
    /// Creates an agent around an optional feature processor.
    pub fn new(feature_processor: Option<StaticMeshFeatureProcessor>) -> Self {
        Self {
            feature_processor,
            mesh_preparation_system: MeshPreparationSystem::new(),
            last_stats: FramePrepareStats::default(),
            frame_count: 0,
        }
    }

    /// Ticks the given components, then updates the feature processor.
    ///
    /// ## Arguments
    /// * `components` - Every component of the scene with its world transform.
    /// * `scene` - Where draw-list tags and multisample states come from.
    /// * `device` - The device every resource is created on.
    ///
    /// ## Returns
    /// The counters of this frame; all zero without a feature processor.
    pub fn prepare_frame<'a>(
        &mut self,
        components: impl IntoIterator<Item = (&'a mut StaticMeshComponent, Mat4)>,
        scene: &dyn RenderScene,
        device: &dyn GraphicsDevice,
    ) -> FramePrepareStats {
        for (component, world_transform) in components {
            component.tick(self.feature_processor.as_mut(), device, world_transform);
        }

        let stats = match self.feature_processor.as_mut() {
            Some(fp) => fp.update(scene, device),
            None => FramePrepareStats::default(),
        };

        self.frame_count += 1;
        self.last_stats = stats;
        stats
    }

    /// Enables or disables a component against this agent's feature processor.
    pub fn set_component_enabled(&mut self, component: &mut StaticMeshComponent, enabled: bool) {
        component.set_enabled(enabled, self.feature_processor.as_mut());
    }

    /// Gives a component's handle back before the component is destroyed.
    pub fn release_component(
        &mut self,
        component: &mut StaticMeshComponent,
        device: &dyn GraphicsDevice,
    ) {
        component.release(self.feature_processor.as_mut(), device);
    }

    /// The compiled packets to submit this frame.
    pub fn visible_draw_packets(&self) -> impl Iterator<Item = &DrawPacket> {
        self.feature_processor
            .iter()
            .flat_map(|fp| fp.visible_draw_packets())
    }

    /// Releases every registration and prepared mesh.
    ///
    /// Components should release their handles first. Registrations still
    /// alive are released here; a later [`MeshRenderAgent::release_component`]
    /// on their components only forgets the stale handle.
    pub fn shutdown(&mut self, device: &dyn GraphicsDevice) {
        if let Some(fp) = self.feature_processor.as_mut() {
            if !fp.is_empty() {
                log::warn!(
                    "Shutting down with {} mesh handle(s) still registered",
                    fp.len()
                );
            }
            fp.release_all(device);
        }
        self.mesh_preparation_system.release_all(device);
        log::info!("Mesh render agent shut down after {} frame(s)", self.frame_count);
    }

    /// The feature processor, if the scene has one.
    pub fn feature_processor(&self) -> Option<&StaticMeshFeatureProcessor> {
        self.feature_processor.as_ref()
    }

    /// Mutable access to the feature processor.
    pub fn feature_processor_mut(&mut self) -> Option<&mut StaticMeshFeatureProcessor> {
        self.feature_processor.as_mut()
    }

    /// The mesh upload cache.
    pub fn mesh_preparation_system(&mut self) -> &mut MeshPreparationSystem {
        &mut self.mesh_preparation_system
    }

    /// Counters of the last prepared frame.
    pub fn last_stats(&self) -> FramePrepareStats {
        self.last_stats
    }

    /// Total number of frames prepared.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for MeshRenderAgent {
    fn default() -> Self {
        Self::new(Some(StaticMeshFeatureProcessor::new(None)))
    }
}
