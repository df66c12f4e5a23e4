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

//! Defines [`StaticMeshComponent`], the scene-side owner of a mesh render handle.

use super::feature_processor::{MeshHandleDescriptor, ModelHandle, StaticMeshFeatureProcessor};
use crystal_core::asset::AssetHandle;
use crystal_core::math::Mat4;
use crystal_core::renderer::GraphicsDevice;
use crystal_data::component::{MeshComponent, MeshHandleState, TickPlan};
use crystal_data::material::{MaterialMap, SharedMaterial};
use crystal_data::model::StaticMesh;

/// Renders a [`StaticMesh`] through a [`StaticMeshFeatureProcessor`].
///
/// The component holds at most one live [`ModelHandle`]. Assigning a mesh
/// rebuilds the handle on the next tick; changing materials only patches the
/// handle's material map; toggling the component only toggles visibility.
///
/// The handle must be given back with [`StaticMeshComponent::release`] before
/// the component or the feature processor goes away.
#[derive(Debug)]
pub struct StaticMeshComponent {
    debug_name: String,
    mesh: Option<AssetHandle<StaticMesh>>,
    materials: MeshComponent,
    state: MeshHandleState,
    handle: Option<ModelHandle>,
    enabled: bool,
}

impl StaticMeshComponent {
    /// Creates an enabled component with no mesh.
    pub fn new(debug_name: impl Into<String>) -> Self {
        Self {
            debug_name: debug_name.into(),
            mesh: None,
            materials: MeshComponent::new(),
            state: MeshHandleState::default(),
            handle: None,
            enabled: true,
        }
    }

    /// Assigns (or clears) the mesh.
    ///
    /// When no material slot was set yet, the slots are seeded from the mesh's
    /// builtin materials.
    pub fn set_static_mesh(&mut self, mesh: Option<AssetHandle<StaticMesh>>) {
        if let Some(mesh) = &mesh {
            if !self.materials.has_materials() {
                self.materials.seed_from_builtin(mesh);
            }
        }
        self.state = self.state.on_mesh_assigned(mesh.is_some());
        self.materials.mark_material_dirty();
        self.mesh = mesh;
    }

    /// The assigned mesh.
    pub fn static_mesh(&self) -> Option<&AssetHandle<StaticMesh>> {
        self.mesh.as_ref()
    }

    /// Assigns a material to a sub-mesh of a LOD. `None` clears the slot.
    pub fn set_material(&mut self, material: Option<SharedMaterial>, lod: usize, sub_mesh: u32) {
        self.materials.set_material(material, lod, sub_mesh);
    }

    /// The material assigned to a sub-mesh of a LOD.
    pub fn get_material(&self, lod: usize, sub_mesh: u32) -> Option<&SharedMaterial> {
        self.materials.get_material(lod, sub_mesh)
    }

    /// The material slots.
    pub fn materials(&self) -> &MeshComponent {
        &self.materials
    }

    /// Enables or disables the component. A held handle is kept and only its
    /// visibility changes.
    pub fn set_enabled(
        &mut self,
        enabled: bool,
        feature_processor: Option<&mut StaticMeshFeatureProcessor>,
    ) {
        self.enabled = enabled;
        if enabled {
            self.state = self.state.on_enabled(self.mesh.is_some());
        }
        if let (Some(fp), Some(handle)) = (feature_processor, self.handle) {
            fp.set_visible(handle, enabled);
        }
    }

    /// Whether the component is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The held render handle.
    pub fn handle(&self) -> Option<ModelHandle> {
        self.handle
    }

    /// Where the component stands with respect to its handle.
    pub fn state(&self) -> MeshHandleState {
        self.state
    }

    /// Runs one tick: rebuilds, patches or releases the handle as needed and
    /// pushes `world_transform` into it.
    ///
    /// Without a feature processor the tick does nothing and pending work
    /// waits for the next tick that has one.
    pub fn tick(
        &mut self,
        feature_processor: Option<&mut StaticMeshFeatureProcessor>,
        device: &dyn GraphicsDevice,
        world_transform: Mat4,
    ) -> TickPlan {
        let Some(fp) = feature_processor else {
            log::trace!("No feature processor for '{}'; skipping tick", self.debug_name);
            return TickPlan::Idle;
        };

        let plan = self
            .state
            .plan(self.handle.is_some(), self.materials.is_material_dirty());
        match plan {
            TickPlan::Idle => {}
            TickPlan::Release => {
                self.release_handle(fp, device);
                self.state = self.state.on_released();
            }
            TickPlan::Rebuild => self.rebuild(fp, device),
            TickPlan::PatchMaterials => {
                if let Some(handle) = self.handle {
                    let map = self.material_map(fp);
                    fp.set_material_map(handle, map);
                }
            }
        }
        self.materials.clear_material_dirty();

        if let Some(handle) = self.handle {
            fp.set_transform(handle, world_transform);
        }
        plan
    }

    /// Gives the handle back. The assigned mesh is kept but no handle is
    /// acquired again until a mesh is assigned or the component re-enabled.
    pub fn release(
        &mut self,
        feature_processor: Option<&mut StaticMeshFeatureProcessor>,
        device: &dyn GraphicsDevice,
    ) {
        match feature_processor {
            Some(fp) => self.release_handle(fp, device),
            None if self.handle.is_some() => {
                log::warn!(
                    "Releasing '{}' without its feature processor; handle dropped",
                    self.debug_name
                );
                self.handle = None;
            }
            None => {}
        }
        self.state = self.state.on_released();
    }

    fn rebuild(&mut self, fp: &mut StaticMeshFeatureProcessor, device: &dyn GraphicsDevice) {
        self.release_handle(fp, device);
        let Some(mesh) = self.mesh.clone() else {
            self.state = self.state.on_mesh_assigned(false);
            return;
        };

        debug_assert!(self.handle.is_none(), "acquiring while a handle is held");
        let map = self.material_map(fp);
        let mut descriptor = MeshHandleDescriptor::new(mesh);
        descriptor.debug_name = format!("{}/{}", self.debug_name, descriptor.debug_name);
        let handle = fp.acquire_mesh(device, descriptor, map);
        fp.set_visible(handle, self.enabled);
        self.handle = Some(handle);
        self.state = self.state.on_rebuilt(true);
    }

    fn release_handle(&mut self, fp: &mut StaticMeshFeatureProcessor, device: &dyn GraphicsDevice) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        // The processor may already have dropped the registration in `release_all`.
        if fp.contains(handle) {
            fp.release_mesh(device, handle);
        } else {
            log::debug!(
                "Handle {handle:?} of '{}' was already released by its feature processor",
                self.debug_name
            );
        }
    }

    fn material_map(&self, fp: &StaticMeshFeatureProcessor) -> MaterialMap {
        self.materials.material_map(Some(fp.error_material().clone()))
    }
}

impl Drop for StaticMeshComponent {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::error!(
                "Static mesh component '{}' dropped while holding {handle:?}",
                self.debug_name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_core::testing::RecordingDevice;
    use crystal_data::material::Material;
    use crystal_data::model::{primitives, Model};
    use std::sync::Arc;

    fn cube_mesh(device: &RecordingDevice, material: SharedMaterial) -> AssetHandle<StaticMesh> {
        let model = Model::upload("cube", &[primitives::cube(1.0)], device).unwrap();
        AssetHandle::new(StaticMesh::new("cube", AssetHandle::new(model), vec![material]))
    }

    #[test]
    fn test_assigning_mesh_seeds_builtin_materials() {
        let device = RecordingDevice::new();
        let builtin = Material::new("builtin").into_shared();
        let mut component = StaticMeshComponent::new("c");

        component.set_static_mesh(Some(cube_mesh(&device, builtin.clone())));

        assert!(Arc::ptr_eq(component.get_material(0, 0).unwrap(), &builtin));
        assert_eq!(component.state(), MeshHandleState::PendingRebuild);
    }

    #[test]
    fn test_assigning_mesh_keeps_explicit_materials() {
        let device = RecordingDevice::new();
        let explicit = Material::new("explicit").into_shared();
        let mut component = StaticMeshComponent::new("c");
        component.set_material(Some(explicit.clone()), 0, 0);

        component.set_static_mesh(Some(cube_mesh(&device, Material::new("b").into_shared())));

        assert!(Arc::ptr_eq(component.get_material(0, 0).unwrap(), &explicit));
    }

    #[test]
    fn test_release_without_handle_resets_state() {
        let device = RecordingDevice::new();
        let mut component = StaticMeshComponent::new("c");
        component.set_static_mesh(Some(cube_mesh(&device, Material::new("b").into_shared())));

        component.release(None, &device);

        assert_eq!(component.state(), MeshHandleState::NoMesh);
        assert!(component.handle().is_none());
    }
}
