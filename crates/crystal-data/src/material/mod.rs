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

//! Materials: a shader reference plus a property store compiled into a
//! device-resident resource group on demand.
//!
//! Property writes only mark the material dirty; [`Material::apply_properties`]
//! batches them into a single resource-group write. Applying a clean material
//! is a no-op.

mod map;
mod property;

pub use self::map::*;
pub use self::property::*;

use crate::shader::{Shader, ShaderCollection, ShaderPass};
use crystal_core::asset::AssetHandle;
use crystal_core::renderer::{
    GraphicsDevice, PropertyValue, ResourceError, ResourceGroupId, ResourceGroupLayout, SrgType,
};
use parking_lot::RwLock;
use std::sync::Arc;

/// A material shared between every component that references it.
///
/// Editing a shared material affects all referencing components.
pub type SharedMaterial = Arc<RwLock<Material>>;

/// What the draw-packet compiler needs from a material that can render.
#[derive(Debug, Clone, Copy)]
pub struct RenderMaterialView<'a> {
    /// The material's shader collection.
    pub collection: &'a ShaderCollection,
    /// The pass that counts as the material's current shader.
    pub current_pass: Option<&'a Arc<ShaderPass>>,
    /// The material's resource group, once properties have been applied.
    pub resource_group: Option<ResourceGroupId>,
}

/// A shader plus named property values.
#[derive(Debug)]
pub struct Material {
    name: String,
    shader: Option<AssetHandle<Shader>>,
    properties: MaterialPropertyStore,
    resource_group: Option<ResourceGroupId>,
    retired_groups: Vec<ResourceGroupId>,
    custom_pass: usize,
    shader_revision: u64,
}

impl Material {
    /// A material with no shader; it cannot render until one is set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader: None,
            properties: MaterialPropertyStore::new(),
            resource_group: None,
            retired_groups: Vec::new(),
            custom_pass: 0,
            shader_revision: 0,
        }
    }

    /// A material rendering with `shader`.
    pub fn with_shader(name: impl Into<String>, shader: AssetHandle<Shader>) -> Self {
        let mut material = Self::new(name);
        material.set_shader(Some(shader));
        material
    }

    /// Wraps the material for sharing between components.
    pub fn into_shared(self) -> SharedMaterial {
        Arc::new(RwLock::new(self))
    }

    /// The material name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the shader.
    ///
    /// The current resource group was created for the old shader's layout; it
    /// is retired and released on the next apply. Packets compiled against
    /// this material notice the change through [`Material::shader_revision`].
    pub fn set_shader(&mut self, shader: Option<AssetHandle<Shader>>) {
        if let Some(group) = self.resource_group.take() {
            self.retired_groups.push(group);
        }
        self.shader = shader;
        self.custom_pass = 0;
        self.shader_revision += 1;
        self.properties.mark_dirty();
    }

    /// The assigned shader.
    pub fn shader(&self) -> Option<&AssetHandle<Shader>> {
        self.shader.as_ref()
    }

    /// The shader collection, or `None` while no shader is assigned.
    pub fn shader_collection(&self) -> Option<&ShaderCollection> {
        self.shader.as_ref().map(|shader| shader.collection())
    }

    /// Selects which collection entry counts as the material's current shader.
    pub fn set_custom_pass(&mut self, index: usize) {
        if self.custom_pass != index {
            self.custom_pass = index;
            self.shader_revision += 1;
        }
    }

    /// The pass selected by [`Material::set_custom_pass`], if it exists.
    pub fn current_pass(&self) -> Option<&Arc<ShaderPass>> {
        self.shader_collection()?
            .get(self.custom_pass)
            .map(|item| item.pass())
    }

    /// Bumped whenever the shader or the current pass changes.
    pub fn shader_revision(&self) -> u64 {
        self.shader_revision
    }

    /// Inserts or overwrites a property and marks the material dirty.
    pub fn set_property(&mut self, name: &str, value: impl Into<PropertyValue>) {
        self.properties.set(name, value.into());
    }

    /// The current value of a property.
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        self.properties.get(name)
    }

    /// The property store.
    pub fn properties(&self) -> &MaterialPropertyStore {
        &self.properties
    }

    /// Whether the next apply will write.
    pub fn is_dirty(&self) -> bool {
        self.properties.is_dirty()
    }

    /// Forces the next apply to write.
    pub fn mark_dirty(&mut self) {
        self.properties.mark_dirty();
    }

    /// The device resource group holding the property values.
    pub fn resource_group(&self) -> Option<ResourceGroupId> {
        self.resource_group
    }

    /// The compiled view of this material, or `None` if it cannot render.
    pub fn render_view(&self) -> Option<RenderMaterialView<'_>> {
        let collection = self.shader_collection()?;
        Some(RenderMaterialView {
            collection,
            current_pass: self.current_pass(),
            resource_group: self.resource_group,
        })
    }

    /// Writes all property values into the material's resource group if any
    /// changed since the last apply.
    ///
    /// The resource group is created lazily from the per-material layout of
    /// the current pass. Returns `Ok(true)` when a write was issued.
    ///
    /// ## Errors
    /// * `ResourceError` - If the device fails to create or write the group.
    ///   The material stays dirty so the next apply retries.
    pub fn apply_properties(&mut self, device: &dyn GraphicsDevice) -> Result<bool, ResourceError> {
        if !self.properties.is_dirty() && self.retired_groups.is_empty() {
            return Ok(false);
        }
        for group in self.retired_groups.drain(..) {
            device.release_resource_group(group);
        }
        if !self.properties.is_dirty() || self.shader.is_none() {
            return Ok(false);
        }

        let group = match self.resource_group {
            Some(group) => group,
            None => match self.material_layout() {
                Some(layout) => {
                    let group = device.create_resource_group(&layout)?;
                    log::debug!("Material '{}' created resource group {group:?}", self.name);
                    self.resource_group = Some(group);
                    group
                }
                None => {
                    log::trace!(
                        "Material '{}' has no per-material layout, nothing to write",
                        self.name
                    );
                    self.properties.clear_dirty();
                    return Ok(false);
                }
            },
        };

        device.write_resource_group(group, &self.properties.entries())?;
        self.properties.clear_dirty();
        log::debug!(
            "Material '{}' flushed {} properties",
            self.name,
            self.properties.len()
        );
        Ok(true)
    }

    /// Releases the material's resource groups. The next apply recreates them.
    pub fn release(&mut self, device: &dyn GraphicsDevice) {
        for group in self.retired_groups.drain(..).chain(self.resource_group.take()) {
            device.release_resource_group(group);
        }
        self.properties.mark_dirty();
    }

    fn material_layout(&self) -> Option<ResourceGroupLayout> {
        let collection = self.shader_collection()?;
        let from_pass = |pass: &ShaderPass| {
            pass.default_variant()
                .reflection()
                .layout(SrgType::PerMaterial)
                .cloned()
        };
        self.current_pass()
            .and_then(|pass| from_pass(pass.as_ref()))
            .or_else(|| collection.iter().find_map(|item| from_pass(item.pass().as_ref())))
    }
}

impl Drop for Material {
    fn drop(&mut self) {
        let leaked = self.retired_groups.len() + usize::from(self.resource_group.is_some());
        if leaked > 0 {
            log::error!(
                "Material '{}' dropped with {leaked} unreleased resource group(s)",
                self.name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{ShaderCollectionItem, ShaderVariant};
    use crystal_core::math::LinearRgba;
    use crystal_core::renderer::{DrawListTag, ShaderReflection, ShaderVariantId};
    use crystal_core::testing::RecordingDevice;

    fn shader_with_material_layout() -> AssetHandle<Shader> {
        let reflection = ShaderReflection {
            vertex_inputs: vec!["POSITION".into()],
            resource_groups: vec![ResourceGroupLayout::new("lit/material", SrgType::PerMaterial)],
        };
        let variant = ShaderVariant::new(ShaderVariantId(1), "lit", reflection);
        let pass = Arc::new(ShaderPass::new("lit", DrawListTag(0), vec![variant]).unwrap());
        AssetHandle::new(Shader::new(
            "lit",
            ShaderCollection::new(vec![ShaderCollectionItem::new(pass)]),
        ))
    }

    #[test]
    fn test_apply_twice_writes_once() {
        let device = RecordingDevice::new();
        let mut material = Material::with_shader("m", shader_with_material_layout());
        material.set_property("tint", LinearRgba::MAGENTA);
        material.set_property("roughness", 0.4f32);

        assert!(material.apply_properties(&device).unwrap());
        assert!(!material.apply_properties(&device).unwrap());

        let group = material.resource_group().unwrap();
        assert_eq!(device.writes_to(group), 1);
        assert_eq!(device.write_count(), 1);
        let entries = device.last_write(group).unwrap();
        assert_eq!(entries[0].name, "tint");
        assert_eq!(entries[1].value, PropertyValue::F32(0.4));

        material.release(&device);
    }

    #[test]
    fn test_material_without_shader_cannot_render_or_write() {
        let device = RecordingDevice::new();
        let mut material = Material::new("bare");
        material.set_property("tint", LinearRgba::WHITE);

        assert!(material.shader_collection().is_none());
        assert!(material.render_view().is_none());
        assert!(!material.apply_properties(&device).unwrap());
        assert_eq!(device.live_resource_group_count(), 0);
        assert_eq!(device.write_count(), 0);
    }

    #[test]
    fn test_set_shader_retires_old_group_and_bumps_revision() {
        let device = RecordingDevice::new();
        let mut material = Material::with_shader("m", shader_with_material_layout());
        material.apply_properties(&device).unwrap();
        let old = material.resource_group().unwrap();
        let revision = material.shader_revision();

        material.set_shader(Some(shader_with_material_layout()));
        assert!(material.shader_revision() > revision);
        assert!(material.is_dirty());

        material.apply_properties(&device).unwrap();
        assert!(!device.is_resource_group_live(old));
        assert_ne!(material.resource_group(), Some(old));

        material.release(&device);
        assert_eq!(device.live_resource_group_count(), 0);
    }

    #[test]
    fn test_failed_group_creation_keeps_material_dirty() {
        let device = RecordingDevice::new();
        let mut material = Material::with_shader("m", shader_with_material_layout());
        device.fail_resource_groups(true);

        assert!(material.apply_properties(&device).is_err());
        assert!(material.is_dirty());

        device.fail_resource_groups(false);
        assert!(material.apply_properties(&device).unwrap());
        material.release(&device);
    }
}
