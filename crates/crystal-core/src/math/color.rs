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

//! Defines the `LinearRgba` color type used for material color properties.

use crate::math::Vec4;
use serde::{Deserialize, Serialize};

/// Represents a color in a **linear RGBA** color space using `f32` components.
///
/// Material color properties are stored and uploaded in linear space; sRGB
/// authored values must be converted with [`LinearRgba::from_srgb`] first.
///
/// `#[repr(C)]` keeps the layout identical to a `vec4<f32>` so the value can be
/// copied straight into resource-group memory.
#[derive(
    Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct LinearRgba {
    /// The red component in linear space.
    pub r: f32,
    /// The green component in linear space.
    pub g: f32,
    /// The blue component in linear space.
    pub b: f32,
    /// The alpha (opacity) component.
    pub a: f32,
}

impl LinearRgba {
    /// Opaque white (`[1.0, 1.0, 1.0, 1.0]`).
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black (`[0.0, 0.0, 0.0, 1.0]`).
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque magenta, the engine's "something is broken" color.
    pub const MAGENTA: Self = Self::rgb(1.0, 0.0, 1.0);
    /// Fully transparent black (`[0.0, 0.0, 0.0, 0.0]`).
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a new `LinearRgba` with explicit RGBA values.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a new opaque `LinearRgba` (alpha = 1.0).
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a `LinearRgba` from sRGB-encoded components. Alpha is kept as is.
    pub fn from_srgb(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::new(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a)
    }

    /// Creates a `LinearRgba` from a [`Vec4`].
    #[inline]
    pub fn from_vec4(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }

    /// Converts this `LinearRgba` to a [`Vec4`].
    #[inline]
    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

impl Default for LinearRgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 3]> for LinearRgba {
    fn from(c: [f32; 3]) -> Self {
        Self::rgb(c[0], c[1], c[2])
    }
}

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vec4_round_trip_keeps_components() {
        let color = LinearRgba::new(0.25, 0.5, 0.75, 0.1);
        assert_eq!(LinearRgba::from_vec4(color.to_vec4()), color);
    }

    #[test]
    fn test_from_srgb_converts_midpoint() {
        let color = LinearRgba::from_srgb(0.5, 0.0, 1.0, 0.5);
        assert_relative_eq!(color.r, 0.214_041, epsilon = 1e-5);
        assert_eq!(color.g, 0.0);
        assert_relative_eq!(color.b, 1.0, epsilon = 1e-6);
        assert_eq!(color.a, 0.5);
    }

    #[test]
    fn test_from_rgb_array_is_opaque() {
        let color: LinearRgba = [0.1, 0.2, 0.3].into();
        assert_eq!(color.a, 1.0);
    }
}
