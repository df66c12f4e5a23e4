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

use super::SharedMaterial;
use std::collections::HashMap;

/// Addresses one sub-mesh of one LOD in a [`MaterialMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomMaterialId {
    /// The LOD index.
    pub lod_index: u32,
    /// The sub-mesh index within the LOD.
    pub sub_mesh_index: u32,
}

impl CustomMaterialId {
    /// The reserved slot used for every sub-mesh without its own entry.
    pub const DEFAULT: Self = Self {
        lod_index: u32::MAX,
        sub_mesh_index: u32::MAX,
    };

    /// Creates an id.
    pub const fn new(lod_index: u32, sub_mesh_index: u32) -> Self {
        Self {
            lod_index,
            sub_mesh_index,
        }
    }
}

/// Sub-mesh to material assignments handed to the feature processor.
#[derive(Debug, Clone, Default)]
pub struct MaterialMap {
    entries: HashMap<CustomMaterialId, SharedMaterial>,
}

impl MaterialMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a material to a slot, returning the previous one.
    pub fn insert(
        &mut self,
        id: CustomMaterialId,
        material: SharedMaterial,
    ) -> Option<SharedMaterial> {
        self.entries.insert(id, material)
    }

    /// The material stored at exactly `id`.
    pub fn get(&self, id: CustomMaterialId) -> Option<&SharedMaterial> {
        self.entries.get(&id)
    }

    /// The material a sub-mesh renders with: its own entry, else the
    /// [`CustomMaterialId::DEFAULT`] slot.
    pub fn resolve(&self, lod_index: u32, sub_mesh_index: u32) -> Option<&SharedMaterial> {
        self.entries
            .get(&CustomMaterialId::new(lod_index, sub_mesh_index))
            .or_else(|| self.entries.get(&CustomMaterialId::DEFAULT))
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no slot is assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All slots, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&CustomMaterialId, &SharedMaterial)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use std::sync::Arc;

    #[test]
    fn test_resolve_falls_back_to_default_slot() {
        let own = Material::new("own").into_shared();
        let error = Material::new("error").into_shared();
        let mut map = MaterialMap::new();
        map.insert(CustomMaterialId::new(0, 1), own.clone());

        assert!(map.resolve(0, 0).is_none());

        map.insert(CustomMaterialId::DEFAULT, error.clone());
        assert!(Arc::ptr_eq(map.resolve(0, 1).unwrap(), &own));
        assert!(Arc::ptr_eq(map.resolve(0, 0).unwrap(), &error));
        assert!(Arc::ptr_eq(map.resolve(3, 9).unwrap(), &error));
    }
}
