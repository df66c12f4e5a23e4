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

//! Contracts and value types of the mesh rendering subsystem.
//!
//! The [`api`] module holds plain data (ids, draw items, shader reflection,
//! resource-group values, settings). The [`traits`] module holds the
//! capability interfaces the subsystem consumes from a graphics backend and a
//! rendering scene.

pub mod api;
pub mod error;
pub mod traits;

pub use self::api::*;
pub use self::error::*;
pub use self::traits::*;
