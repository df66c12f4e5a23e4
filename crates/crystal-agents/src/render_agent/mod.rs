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

//! Acts as the agent for static mesh rendering.
//!
//! Components decide *when* a mesh must be registered, re-registered or only
//! patched; the feature processor owns the registrations and compiles their
//! draw packets through the render lane.

mod agent;
mod feature_processor;
mod mesh_preparation;
mod static_mesh_component;

pub use agent::*;
pub use feature_processor::*;
pub use mesh_preparation::*;
pub use static_mesh_component::*;
