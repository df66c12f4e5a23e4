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

//! # Crystal Data
//!
//! The data the mesh renderer consumes: shaders and their collections,
//! materials with their property stores, uploaded models and static meshes,
//! and the per-component material slots and handle state machine.

pub mod component;
pub mod config;
pub mod material;
pub mod model;
pub mod shader;

pub use component::{MeshComponent, MeshHandleState, TickPlan};
pub use material::{
    CustomMaterialId, Material, MaterialMap, MaterialTextureValue, RenderMaterialView,
    SharedMaterial,
};
pub use model::{Model, ModelLod, ModelLodAsset, StaticMesh, SubMesh, SubMeshAsset};
pub use shader::{Shader, ShaderCollection, ShaderCollectionItem, ShaderPass, ShaderVariant};
