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

//! Identifiers, descriptors and values for device-resident resources.

use crate::math::{LinearRgba, Mat4, Vec2, Vec4};
use std::borrow::Cow;

/// An opaque handle to a GPU buffer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// An opaque handle to a resource group: a bound set of buffers and textures
/// matching one binding layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceGroupId(pub usize);

/// What a buffer will be bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Vertex attribute data.
    Vertex,
    /// Index data.
    Index,
    /// Uniform (constant) data.
    Uniform,
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// How the buffer will be bound.
    pub usage: BufferUsage,
}

/// A window into a vertex buffer: one attribute stream of a sub-mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferView {
    /// The backing buffer.
    pub buffer: BufferId,
    /// Offset of the first byte of the stream.
    pub byte_offset: u32,
    /// Number of bytes covered by the view.
    pub byte_count: u32,
    /// Distance in bytes between two consecutive elements.
    pub stride: u32,
}

/// The width of each index in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit unsigned indices.
    Uint16,
    /// 32-bit unsigned indices.
    Uint32,
}

impl IndexFormat {
    /// Size of one index in bytes.
    pub const fn size(self) -> u32 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// A window into an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferView {
    /// The backing buffer.
    pub buffer: BufferId,
    /// Offset of the first index in bytes.
    pub byte_offset: u32,
    /// Number of bytes covered by the view.
    pub byte_count: u32,
    /// The index width.
    pub format: IndexFormat,
}

/// The binding frequency of a resource group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SrgType {
    /// Allocated per draw item; owned by the draw packet that created it.
    PerDraw,
    /// Owned by a material and shared by every draw that uses it.
    PerMaterial,
    /// Owned by a mesh instance; carries its transform.
    PerObject,
}

/// The binding layout a resource group is created from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceGroupLayout {
    /// A debug name, usually `<shader>/<srg type>`.
    pub name: String,
    /// The binding frequency of groups created from this layout.
    pub srg_type: SrgType,
}

impl ResourceGroupLayout {
    /// Creates a layout with the given name and binding frequency.
    pub fn new(name: impl Into<String>, srg_type: SrgType) -> Self {
        Self {
            name: name.into(),
            srg_type,
        }
    }
}

/// A single typed value that can be written into a resource group.
///
/// The set is closed; material properties and object constants are all one of
/// these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    /// An unsigned 32-bit integer.
    U32(u32),
    /// A signed 32-bit integer.
    I32(i32),
    /// A 32-bit float.
    F32(f32),
    /// A four component vector.
    Vec4(Vec4),
    /// A linear color.
    Color(LinearRgba),
    /// A 4x4 column-major matrix.
    Mat4(Mat4),
    /// A texture reference with a UV transform.
    Texture {
        /// The referenced texture.
        texture: TextureId,
        /// UV offset applied before sampling.
        uv_offset: Vec2,
        /// UV scale applied before sampling.
        uv_scale: Vec2,
    },
}

impl PropertyValue {
    /// A short name for the variant, for logs.
    pub const fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::U32(_) => "u32",
            PropertyValue::I32(_) => "i32",
            PropertyValue::F32(_) => "f32",
            PropertyValue::Vec4(_) => "vec4",
            PropertyValue::Color(_) => "color",
            PropertyValue::Mat4(_) => "mat4",
            PropertyValue::Texture { .. } => "texture",
        }
    }

    /// Appends the GPU representation of the value to `out`.
    ///
    /// Texture references are written as `[uv_offset, uv_scale]` followed by
    /// the texture index; the backend resolves the index to a binding.
    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        match self {
            PropertyValue::U32(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            PropertyValue::I32(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            PropertyValue::F32(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            PropertyValue::Vec4(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            PropertyValue::Color(c) => out.extend_from_slice(bytemuck::bytes_of(c)),
            PropertyValue::Mat4(m) => out.extend_from_slice(bytemuck::bytes_of(m)),
            PropertyValue::Texture {
                texture,
                uv_offset,
                uv_scale,
            } => {
                let uv = [uv_offset.x, uv_offset.y, uv_scale.x, uv_scale.y];
                out.extend_from_slice(bytemuck::cast_slice(&uv));
                out.extend_from_slice(bytemuck::bytes_of(&(texture.0 as u32)));
            }
        }
    }
}

macro_rules! impl_property_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::$variant(value)
                }
            }
        )*
    };
}

impl_property_from! {
    u32 => U32,
    i32 => I32,
    f32 => F32,
    Vec4 => Vec4,
    LinearRgba => Color,
    Mat4 => Mat4,
}

/// A named value written into a resource group.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceGroupEntry {
    /// The binding name as declared by the shader.
    pub name: String,
    /// The value to write.
    pub value: PropertyValue,
}

impl ResourceGroupEntry {
    /// Creates an entry.
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_values_pack_to_four_bytes() {
        let mut out = Vec::new();
        PropertyValue::U32(1).write_bytes(&mut out);
        PropertyValue::I32(-1).write_bytes(&mut out);
        PropertyValue::F32(0.5).write_bytes(&mut out);
        assert_eq!(out.len(), 12);
        assert_eq!(&out[4..8], &(-1i32).to_ne_bytes());
    }

    #[test]
    fn test_matrix_packs_sixteen_floats() {
        let mut out = Vec::new();
        PropertyValue::Mat4(Mat4::IDENTITY).write_bytes(&mut out);
        assert_eq!(out.len(), 64);
        let floats: [f32; 16] = bytemuck::pod_read_unaligned(&out);
        assert_eq!(floats[0], 1.0);
        assert_eq!(floats[1], 0.0);
        assert_eq!(floats[15], 1.0);
    }

    #[test]
    fn test_texture_packs_uv_transform_then_index() {
        let mut out = Vec::new();
        PropertyValue::Texture {
            texture: TextureId(9),
            uv_offset: Vec2::new(0.5, 0.25),
            uv_scale: Vec2::splat(2.0),
        }
        .write_bytes(&mut out);
        assert_eq!(out.len(), 20);
        let uv: [f32; 4] = bytemuck::pod_read_unaligned(&out[..16]);
        assert_eq!(uv, [0.5, 0.25, 2.0, 2.0]);
        assert_eq!(&out[16..], &9u32.to_ne_bytes());
    }
}
