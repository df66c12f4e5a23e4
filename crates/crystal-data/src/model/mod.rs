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

//! Geometry consumed by the draw-packet compiler.
//!
//! [`ModelLodAsset`] is CPU-side geometry; uploading it yields an immutable
//! [`ModelLod`] whose sub-meshes describe their vertex streams by semantic.

mod lod;
pub mod primitives;
mod static_mesh;

pub use self::lod::*;
pub use self::static_mesh::*;
