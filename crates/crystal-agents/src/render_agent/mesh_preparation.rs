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

//! Defines the system that uploads imported geometry into static meshes.

use crystal_core::asset::AssetHandle;
use crystal_core::renderer::{GraphicsDevice, ResourceError};
use crystal_data::material::SharedMaterial;
use crystal_data::model::{Model, ModelLodAsset, StaticMesh};
use crystal_data::shader::Shader;
use crystal_lanes::{ImportError, ImportedModel, ModelImportLane};
use std::collections::HashMap;

/// Why a mesh could not be prepared.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshPreparationError {
    /// The source file was rejected by the importer.
    #[error(transparent)]
    Import(#[from] ImportError),
    /// The geometry could not be uploaded.
    #[error("failed to upload mesh geometry: {0}")]
    Upload(#[from] ResourceError),
}

/// Uploads CPU geometry once and caches the resulting [`StaticMesh`] by name.
///
/// Preparing the same name again returns the cached mesh without touching
/// the device.
#[derive(Debug, Default)]
pub struct MeshPreparationSystem {
    // Prepared meshes, keyed by the name they were prepared under.
    prepared: HashMap<String, AssetHandle<StaticMesh>>,
    import_lane: ModelImportLane,
}

impl MeshPreparationSystem {
    /// Creates an empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads the LODs of a mesh, or returns the mesh already prepared under `name`.
    ///
    /// ## Arguments
    /// * `name` - The cache key and mesh name.
    /// * `lods` - The geometry, most detailed LOD first.
    /// * `materials` - Builtin materials, indexed by each sub-mesh's material index.
    ///
    /// ## Errors
    /// * `MeshPreparationError::Upload` - If a buffer could not be created.
    pub fn prepare_lods(
        &mut self,
        name: &str,
        lods: &[ModelLodAsset],
        materials: Vec<SharedMaterial>,
        device: &dyn GraphicsDevice,
    ) -> Result<AssetHandle<StaticMesh>, MeshPreparationError> {
        if let Some(mesh) = self.prepared.get(name) {
            log::trace!("Mesh '{name}' already prepared");
            return Ok(mesh.clone());
        }

        let model = Model::upload(name, lods, device)?;
        log::info!("Prepared mesh '{name}' with {} LOD(s)", model.lod_count());
        let mesh = AssetHandle::new(StaticMesh::new(name, AssetHandle::new(model), materials));
        self.prepared.insert(name.to_string(), mesh.clone());
        Ok(mesh)
    }

    /// Prepares an imported model, turning its materials into builtin materials
    /// rendered with `shader`.
    pub fn prepare_imported(
        &mut self,
        name: &str,
        imported: &ImportedModel,
        shader: Option<AssetHandle<Shader>>,
        device: &dyn GraphicsDevice,
    ) -> Result<AssetHandle<StaticMesh>, MeshPreparationError> {
        let materials = imported
            .materials
            .iter()
            .map(|material| material.to_material(shader.clone()).into_shared())
            .collect();
        self.prepare_lods(name, std::slice::from_ref(&imported.lod), materials, device)
    }

    /// Imports an OBJ source and prepares it.
    ///
    /// ## Errors
    /// * `MeshPreparationError::Import` - If the source is rejected.
    /// * `MeshPreparationError::Upload` - If the geometry could not be uploaded.
    pub fn prepare_obj(
        &mut self,
        name: &str,
        obj: &[u8],
        mtl: Option<&[u8]>,
        shader: Option<AssetHandle<Shader>>,
        device: &dyn GraphicsDevice,
    ) -> Result<AssetHandle<StaticMesh>, MeshPreparationError> {
        if let Some(mesh) = self.prepared.get(name) {
            return Ok(mesh.clone());
        }
        let imported = self.import_lane.import(obj, mtl)?;
        self.prepare_imported(name, &imported, shader, device)
    }

    /// The mesh prepared under `name`.
    pub fn get(&self, name: &str) -> Option<&AssetHandle<StaticMesh>> {
        self.prepared.get(name)
    }

    /// Number of prepared meshes.
    pub fn len(&self) -> usize {
        self.prepared.len()
    }

    /// Whether nothing was prepared.
    pub fn is_empty(&self) -> bool {
        self.prepared.is_empty()
    }

    /// Releases the geometry and builtin materials of every prepared mesh.
    pub fn release_all(&mut self, device: &dyn GraphicsDevice) {
        for (_, mesh) in self.prepared.drain() {
            mesh.model().release(device);
            for material in mesh.builtin_materials() {
                material.write().release(device);
            }
        }
    }
}
