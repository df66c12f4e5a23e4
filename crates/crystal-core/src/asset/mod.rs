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

//! Asset primitives shared by the renderer data types.
//!
//! Models, static meshes and shaders are loaded once and then referenced by
//! many scene components. This module only provides the marker trait, the
//! shared handle and a persistent identifier; loading lives in the lanes crate.

mod handle;
mod uuid;

pub use handle::*;
pub use uuid::*;

/// A marker trait for types that can be managed by the asset system.
///
/// The supertraits enforce that an asset can be shared between the render
/// thread and whatever produced it, and that it carries no borrowed data.
///
/// # Examples
///
/// ```
/// use crystal_core::asset::Asset;
///
/// struct Texture {
///     // ... fields
/// }
///
/// impl Asset for Texture {}
/// ```
pub trait Asset: Send + Sync + 'static {}
