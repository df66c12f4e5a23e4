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

//! Imports OBJ models (with optional MTL materials) from memory.

use super::AssetLoaderLane;
use anyhow::Context;
use crystal_core::asset::{Asset, AssetHandle};
use crystal_core::math::{LinearRgba, Vec2, Vec3, Vec4};
use crystal_data::material::Material;
use crystal_data::model::{ModelLodAsset, SubMeshAsset};
use crystal_data::shader::Shader;
use std::error::Error;
use std::fmt;
use std::io::Cursor;

/// Why an import failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportErrorCode {
    /// The source is not valid UTF-8 text.
    InvalidEncoding,
    /// The mesh importer rejected the model source.
    ParseFailed,
    /// The mesh importer rejected the material library.
    MaterialParseFailed,
    /// The source parsed but contains no vertices.
    NoGeometry,
}

impl fmt::Display for ImportErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportErrorCode::InvalidEncoding => "invalid encoding",
            ImportErrorCode::ParseFailed => "parse failed",
            ImportErrorCode::MaterialParseFailed => "material parse failed",
            ImportErrorCode::NoGeometry => "no geometry",
        };
        f.write_str(name)
    }
}

/// An import failure: a distinct code plus the importer's own message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("model import failed ({code}): {message}")]
pub struct ImportError {
    /// What went wrong.
    pub code: ImportErrorCode,
    /// The message reported by the importing library.
    pub message: String,
}

impl ImportError {
    fn new(code: ImportErrorCode, message: impl fmt::Display) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }
}

/// A material description read from a material library.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMaterial {
    /// The material name.
    pub name: String,
    /// Diffuse color.
    pub diffuse: LinearRgba,
    /// Specular color.
    pub specular: LinearRgba,
    /// Ambient color.
    pub ambient: LinearRgba,
    /// Emissive color.
    pub emissive: LinearRgba,
    /// Specular exponent.
    pub shininess: f32,
    /// Opacity, 1.0 being opaque.
    pub opacity: f32,
    /// Path of the diffuse map, as written in the library.
    pub diffuse_texture: Option<String>,
    /// Path of the normal map.
    pub normal_texture: Option<String>,
    /// Path of the specular map.
    pub specular_texture: Option<String>,
}

impl ImportedMaterial {
    fn from_mtl(mtl: &tobj::Material) -> Self {
        let color = |c: Option<[f32; 3]>, default: LinearRgba| c.map_or(default, LinearRgba::from);
        let emissive = mtl
            .unknown_param
            .get("Ke")
            .and_then(|value| parse_color(value))
            .unwrap_or(LinearRgba::BLACK);
        Self {
            name: mtl.name.clone(),
            diffuse: color(mtl.diffuse, LinearRgba::WHITE),
            specular: color(mtl.specular, LinearRgba::BLACK),
            ambient: color(mtl.ambient, LinearRgba::BLACK),
            emissive,
            shininess: mtl.shininess.unwrap_or(0.0),
            opacity: mtl.dissolve.unwrap_or(1.0),
            diffuse_texture: mtl.diffuse_texture.clone(),
            normal_texture: mtl.normal_texture.clone(),
            specular_texture: mtl.specular_texture.clone(),
        }
    }

    /// Builds an engine material rendering with `shader`, its properties
    /// filled from this description.
    pub fn to_material(&self, shader: Option<AssetHandle<Shader>>) -> Material {
        let mut material = Material::new(self.name.clone());
        material.set_shader(shader);
        material.set_property("base_color", self.diffuse);
        material.set_property("specular_color", self.specular);
        material.set_property("ambient_color", self.ambient);
        material.set_property("emissive_color", self.emissive);
        material.set_property("shininess", self.shininess);
        material.set_property("opacity", self.opacity);
        material
    }
}

fn parse_color(value: &str) -> Option<LinearRgba> {
    let mut components = value.split_whitespace().map(str::parse::<f32>);
    let mut next = || components.next()?.ok();
    Some(LinearRgba::rgb(next()?, next()?, next()?))
}

/// The CPU result of importing a model file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedModel {
    /// The geometry, one sub-mesh per object in the file.
    pub lod: ModelLodAsset,
    /// Materials, indexed by each sub-mesh's material index.
    pub materials: Vec<ImportedMaterial>,
}

impl Asset for ImportedModel {}

/// Lane importing OBJ geometry, triangulated and with a single index stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelImportLane;

impl ModelImportLane {
    /// Imports an OBJ source. `mtl` is used for any `mtllib` the source names.
    ///
    /// ## Errors
    /// * `ImportError` - With the importer's message if either source is rejected,
    ///   or [`ImportErrorCode::NoGeometry`] if nothing was found.
    pub fn import(&self, obj: &[u8], mtl: Option<&[u8]>) -> Result<ImportedModel, ImportError> {
        let obj_text = std::str::from_utf8(obj)
            .map_err(|err| ImportError::new(ImportErrorCode::InvalidEncoding, err))?;

        let (models, materials) = tobj::load_obj_buf(
            &mut Cursor::new(obj_text),
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
            |_| match mtl {
                Some(bytes) => tobj::load_mtl_buf(&mut Cursor::new(bytes)),
                None => Ok((Vec::new(), Default::default())),
            },
        )
        .map_err(|err| ImportError::new(ImportErrorCode::ParseFailed, err))?;
        let materials =
            materials.map_err(|err| ImportError::new(ImportErrorCode::MaterialParseFailed, err))?;

        let sub_meshes: Vec<SubMeshAsset> = models
            .iter()
            .map(Self::sub_mesh)
            .filter(|sub_mesh| sub_mesh.vertex_count() > 0)
            .collect();
        if sub_meshes.is_empty() {
            return Err(ImportError::new(
                ImportErrorCode::NoGeometry,
                "the source contains no vertices",
            ));
        }

        let name = models
            .first()
            .map(|model| model.name.clone())
            .unwrap_or_default();
        log::debug!(
            "Imported model '{name}': {} sub-mesh(es), {} material(s)",
            sub_meshes.len(),
            materials.len()
        );
        Ok(ImportedModel {
            lod: ModelLodAsset { name, sub_meshes },
            materials: materials.iter().map(ImportedMaterial::from_mtl).collect(),
        })
    }

    fn sub_mesh(model: &tobj::Model) -> SubMeshAsset {
        let mesh = &model.mesh;
        let positions: Vec<Vec3> = mesh
            .positions
            .chunks_exact(3)
            .map(|v| Vec3::new(v[0], v[1], v[2]))
            .collect();
        let vertex_count = positions.len();
        let per_vertex = |len: usize| len == vertex_count;

        let normals: Vec<Vec3> = mesh
            .normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect();
        let uv0: Vec<Vec2> = mesh
            .texcoords
            .chunks_exact(2)
            .map(|t| Vec2::new(t[0], t[1]))
            .collect();
        let colors: Vec<Vec4> = mesh
            .vertex_color
            .chunks_exact(3)
            .map(|c| Vec4::new(c[0], c[1], c[2], 1.0))
            .collect();

        SubMeshAsset {
            name: model.name.clone(),
            normals: if per_vertex(normals.len()) { normals } else { Vec::new() },
            uv0: if per_vertex(uv0.len()) { uv0 } else { Vec::new() },
            colors: if per_vertex(colors.len()) { colors } else { Vec::new() },
            positions,
            indices: mesh.indices.clone(),
            material_index: mesh.material_id.unwrap_or(0) as u32,
            ..Default::default()
        }
    }
}

impl AssetLoaderLane<ImportedModel> for ModelImportLane {
    fn load(&self, bytes: &[u8]) -> Result<ImportedModel, Box<dyn Error + Send + Sync>> {
        let model = self
            .import(bytes, None)
            .context("Failed to import OBJ model")?;
        Ok(model)
    }
}
