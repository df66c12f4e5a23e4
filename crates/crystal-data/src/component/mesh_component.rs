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

use crate::material::{CustomMaterialId, MaterialMap, SharedMaterial};
use crate::model::StaticMesh;
use std::collections::BTreeMap;

/// Material slots of a mesh component, per LOD and sub-mesh.
///
/// Any change to the slots raises the material-dirty flag; the owning
/// component consumes it on its next tick.
#[derive(Debug, Clone, Default)]
pub struct MeshComponent {
    materials_per_lod: Vec<BTreeMap<u32, SharedMaterial>>,
    material_dirty: bool,
}

impl MeshComponent {
    /// A component with no material slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `material` to a sub-mesh of a LOD. `None` clears the slot.
    pub fn set_material(
        &mut self,
        material: Option<SharedMaterial>,
        lod: usize,
        sub_mesh_index: u32,
    ) {
        match material {
            Some(material) => {
                if self.materials_per_lod.len() <= lod {
                    self.materials_per_lod.resize_with(lod + 1, BTreeMap::new);
                }
                self.materials_per_lod[lod].insert(sub_mesh_index, material);
            }
            None => {
                if let Some(slots) = self.materials_per_lod.get_mut(lod) {
                    slots.remove(&sub_mesh_index);
                }
            }
        }
        self.material_dirty = true;
    }

    /// The material assigned to a sub-mesh of a LOD.
    pub fn get_material(&self, lod: usize, sub_mesh_index: u32) -> Option<&SharedMaterial> {
        self.materials_per_lod.get(lod)?.get(&sub_mesh_index)
    }

    /// Whether any slot is assigned.
    pub fn has_materials(&self) -> bool {
        self.materials_per_lod.iter().any(|slots| !slots.is_empty())
    }

    /// Removes every slot.
    pub fn clear_materials(&mut self) {
        self.materials_per_lod.clear();
        self.material_dirty = true;
    }

    /// Fills every sub-mesh slot from the mesh's builtin materials.
    ///
    /// Seeded materials are marked dirty so their properties are flushed
    /// before they are first bound.
    pub fn seed_from_builtin(&mut self, mesh: &StaticMesh) {
        for lod in 0..mesh.lod_count() {
            for sub_mesh in 0..mesh.lod_sub_mesh_count(lod) {
                let material = mesh
                    .lod_sub_mesh_material_index(lod, sub_mesh)
                    .and_then(|index| mesh.builtin_material(index));
                if let Some(material) = material {
                    material.write().mark_dirty();
                    self.set_material(Some(material.clone()), lod, sub_mesh as u32);
                }
            }
        }
    }

    /// Whether slots changed since the dirty flag was last cleared.
    pub fn is_material_dirty(&self) -> bool {
        self.material_dirty
    }

    /// Raises the material-dirty flag.
    pub fn mark_material_dirty(&mut self) {
        self.material_dirty = true;
    }

    /// Lowers the material-dirty flag.
    pub fn clear_material_dirty(&mut self) {
        self.material_dirty = false;
    }

    /// Builds the map handed to the feature processor. `fallback` fills the
    /// [`CustomMaterialId::DEFAULT`] slot.
    pub fn material_map(&self, fallback: Option<SharedMaterial>) -> MaterialMap {
        let mut map = MaterialMap::new();
        for (lod, slots) in self.materials_per_lod.iter().enumerate() {
            for (sub_mesh, material) in slots {
                map.insert(CustomMaterialId::new(lod as u32, *sub_mesh), material.clone());
            }
        }
        if let Some(fallback) = fallback {
            map.insert(CustomMaterialId::DEFAULT, fallback);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::model::{primitives, Model};
    use crystal_core::asset::AssetHandle;
    use crystal_core::testing::RecordingDevice;
    use std::sync::Arc;

    #[test]
    fn test_set_and_get_material_per_lod_and_sub_mesh() {
        let mut component = MeshComponent::new();
        let red = Material::new("red").into_shared();
        component.set_material(Some(red.clone()), 2, 5);

        assert!(component.is_material_dirty());
        assert!(Arc::ptr_eq(component.get_material(2, 5).unwrap(), &red));
        assert!(component.get_material(0, 5).is_none());
        assert!(component.get_material(2, 4).is_none());

        component.clear_material_dirty();
        component.set_material(None, 2, 5);
        assert!(component.is_material_dirty());
        assert!(!component.has_materials());
    }

    #[test]
    fn test_material_map_includes_fallback_slot() {
        let mut component = MeshComponent::new();
        let own = Material::new("own").into_shared();
        let error = Material::new("error").into_shared();
        component.set_material(Some(own.clone()), 0, 0);

        let map = component.material_map(Some(error.clone()));
        assert_eq!(map.len(), 2);
        assert!(Arc::ptr_eq(map.resolve(0, 0).unwrap(), &own));
        assert!(Arc::ptr_eq(map.resolve(0, 1).unwrap(), &error));
    }

    #[test]
    fn test_seed_from_builtin_marks_materials_dirty() {
        let device = RecordingDevice::new();
        let model = Model::upload("cube", &[primitives::cube(1.0)], &device).unwrap();
        let builtin = Material::new("builtin").into_shared();
        let mesh = StaticMesh::new("cube", AssetHandle::new(model), vec![builtin.clone()]);

        let mut component = MeshComponent::new();
        component.seed_from_builtin(&mesh);

        assert!(Arc::ptr_eq(component.get_material(0, 0).unwrap(), &builtin));
        assert!(builtin.read().is_dirty());
    }
}
