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

//! The name-keyed property store behind a material.

use crystal_core::math::Vec2;
use crystal_core::renderer::{PropertyValue, ResourceGroupEntry, TextureId};
use std::collections::HashMap;

/// A texture reference with the UV transform applied before sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialTextureValue {
    /// The referenced texture.
    pub texture: TextureId,
    /// UV offset.
    pub uv_offset: Vec2,
    /// UV scale.
    pub uv_scale: Vec2,
}

impl MaterialTextureValue {
    /// A texture with the identity UV transform.
    pub fn new(texture: TextureId) -> Self {
        Self {
            texture,
            uv_offset: Vec2::ZERO,
            uv_scale: Vec2::ONE,
        }
    }

    /// Sets the UV offset and scale.
    pub fn with_uv_transform(mut self, offset: Vec2, scale: Vec2) -> Self {
        self.uv_offset = offset;
        self.uv_scale = scale;
        self
    }
}

impl From<MaterialTextureValue> for PropertyValue {
    fn from(value: MaterialTextureValue) -> Self {
        PropertyValue::Texture {
            texture: value.texture,
            uv_offset: value.uv_offset,
            uv_scale: value.uv_scale,
        }
    }
}

/// Ordered, name-keyed property values with a single "needs flush" flag.
///
/// The name index always points into the ordered list; values keep the
/// position of their first insertion even when overwritten with another type.
#[derive(Debug, Clone, Default)]
pub struct MaterialPropertyStore {
    properties: Vec<(String, PropertyValue)>,
    index: HashMap<String, usize>,
    dirty: bool,
}

impl MaterialPropertyStore {
    /// An empty, clean store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `name`. Last write wins, including its type.
    pub fn set(&mut self, name: &str, value: PropertyValue) {
        match self.index.get(name) {
            Some(&slot) => self.properties[slot].1 = value,
            None => {
                self.index.insert(name.to_string(), self.properties.len());
                self.properties.push((name.to_string(), value));
            }
        }
        self.dirty = true;
    }

    /// The current value of `name`.
    pub fn get(&self, name: &str) -> Option<PropertyValue> {
        self.index.get(name).map(|&slot| self.properties[slot].1)
    }

    /// Properties in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the store holds no property.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Whether values changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forces the next flush to write.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// The values as resource-group entries, in declaration order.
    pub fn entries(&self) -> Vec<ResourceGroupEntry> {
        self.properties
            .iter()
            .map(|(name, value)| ResourceGroupEntry::new(name.clone(), *value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_core::math::{LinearRgba, Mat4, Vec4};

    #[test]
    fn test_read_back_returns_last_written_value_and_type() {
        let mut store = MaterialPropertyStore::new();
        let texture = MaterialTextureValue::new(TextureId(4))
            .with_uv_transform(Vec2::new(0.1, 0.2), Vec2::splat(3.0));
        let values = [
            PropertyValue::U32(7),
            PropertyValue::I32(-7),
            PropertyValue::F32(0.75),
            PropertyValue::Vec4(Vec4::new(1.0, 2.0, 3.0, 4.0)),
            PropertyValue::Color(LinearRgba::MAGENTA),
            PropertyValue::Mat4(Mat4::from_scale(crystal_core::math::Vec3::splat(2.0))),
            texture.into(),
        ];
        for (i, value) in values.iter().enumerate() {
            store.set(&format!("p{i}"), *value);
        }
        for (i, value) in values.iter().enumerate() {
            assert_eq!(store.get(&format!("p{i}")), Some(*value));
        }
    }

    #[test]
    fn test_overwrite_changes_type_but_keeps_position() {
        let mut store = MaterialPropertyStore::new();
        store.set("roughness", PropertyValue::F32(0.5));
        store.set("tint", PropertyValue::Color(LinearRgba::WHITE));
        store.set("roughness", PropertyValue::U32(1));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("roughness"), Some(PropertyValue::U32(1)));
        let names: Vec<_> = store.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["roughness", "tint"]);
    }

    #[test]
    fn test_set_marks_dirty_and_unknown_names_are_missing() {
        let mut store = MaterialPropertyStore::new();
        assert!(!store.is_dirty());
        assert_eq!(store.get("missing"), None);

        store.set("a", PropertyValue::F32(1.0));
        assert!(store.is_dirty());
        store.clear_dirty();
        assert!(!store.is_dirty());
    }
}
