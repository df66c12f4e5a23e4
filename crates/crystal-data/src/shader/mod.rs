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

//! Shaders as the mesh path sees them.
//!
//! A [`Shader`] asset is an ordered [`ShaderCollection`]. Each
//! [`ShaderCollectionItem`] references one [`ShaderPass`] (a shader routed to
//! one draw list) and carries an enable flag and an optional draw-list
//! override. A pass owns its compiled [`ShaderVariant`]s; variants cache one
//! pipeline state per pass configuration.

mod collection;
mod variant;

pub use self::collection::*;
pub use self::variant::*;
