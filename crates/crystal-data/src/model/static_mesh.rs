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

use super::{ModelLod, ModelLodAsset};
use crate::material::SharedMaterial;
use crystal_core::asset::{Asset, AssetHandle, AssetUUID};
use crystal_core::renderer::{GraphicsDevice, ResourceError};
use std::sync::Arc;

/// An uploaded model: its levels of detail, finest first.
#[derive(Debug)]
pub struct Model {
    name: String,
    uuid: AssetUUID,
    lods: Vec<Arc<ModelLod>>,
}

impl Asset for Model {}

impl Model {
    /// Wraps already uploaded LODs.
    pub fn new(name: impl Into<String>, lods: Vec<ModelLod>) -> Self {
        Self {
            name: name.into(),
            uuid: AssetUUID::new(),
            lods: lods.into_iter().map(Arc::new).collect(),
        }
    }

    /// Uploads every LOD asset.
    ///
    /// ## Errors
    /// * `ResourceError` - If any LOD fails to upload; LODs uploaded so far are released.
    pub fn upload(
        name: impl Into<String>,
        assets: &[ModelLodAsset],
        device: &dyn GraphicsDevice,
    ) -> Result<Self, ResourceError> {
        let mut lods = Vec::with_capacity(assets.len());
        for asset in assets {
            match ModelLod::upload(asset, device) {
                Ok(lod) => lods.push(lod),
                Err(err) => {
                    for lod in &lods {
                        lod.release(device);
                    }
                    return Err(err);
                }
            }
        }
        Ok(Self::new(name, lods))
    }

    /// The model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The persistent asset id.
    pub fn uuid(&self) -> AssetUUID {
        self.uuid
    }

    /// All LODs.
    pub fn lods(&self) -> &[Arc<ModelLod>] {
        &self.lods
    }

    /// The LOD at `index`.
    pub fn lod(&self, index: usize) -> Option<&Arc<ModelLod>> {
        self.lods.get(index)
    }

    /// Number of LODs.
    pub fn lod_count(&self) -> usize {
        self.lods.len()
    }

    /// Destroys the device buffers of every LOD.
    pub fn release(&self, device: &dyn GraphicsDevice) {
        for lod in &self.lods {
            lod.release(device);
        }
    }
}

/// A model plus the materials it was authored with.
#[derive(Debug)]
pub struct StaticMesh {
    name: String,
    uuid: AssetUUID,
    model: AssetHandle<Model>,
    builtin_materials: Vec<SharedMaterial>,
}

impl Asset for StaticMesh {}

impl StaticMesh {
    /// Creates a static mesh. `builtin_materials` is indexed by each sub-mesh's
    /// material index.
    pub fn new(
        name: impl Into<String>,
        model: AssetHandle<Model>,
        builtin_materials: Vec<SharedMaterial>,
    ) -> Self {
        Self {
            name: name.into(),
            uuid: AssetUUID::new(),
            model,
            builtin_materials,
        }
    }

    /// The mesh name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The persistent asset id.
    pub fn uuid(&self) -> AssetUUID {
        self.uuid
    }

    /// The uploaded model.
    pub fn model(&self) -> &AssetHandle<Model> {
        &self.model
    }

    /// Materials authored with the mesh.
    pub fn builtin_materials(&self) -> &[SharedMaterial] {
        &self.builtin_materials
    }

    /// The builtin material at `index`.
    pub fn builtin_material(&self, index: u32) -> Option<&SharedMaterial> {
        self.builtin_materials.get(index as usize)
    }

    /// Number of LODs.
    pub fn lod_count(&self) -> usize {
        self.model.lod_count()
    }

    /// Number of sub-meshes in LOD `lod`, zero if it does not exist.
    pub fn lod_sub_mesh_count(&self, lod: usize) -> usize {
        self.model
            .lod(lod)
            .map_or(0, |lod| lod.sub_meshes().len())
    }

    /// The material index of a sub-mesh.
    pub fn lod_sub_mesh_material_index(&self, lod: usize, sub_mesh: usize) -> Option<u32> {
        self.model
            .lod(lod)?
            .sub_mesh(sub_mesh)
            .map(|sub_mesh| sub_mesh.material_index)
    }
}
