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

//! Mathematics primitives used by the renderer contracts.
//!
//! Vector and matrix types come from `glam`; this module only re-exports them
//! under a stable path and adds the engine's linear color type.

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

pub use std::f32::consts::{PI, TAU};

pub mod color;

pub use self::color::LinearRgba;
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
