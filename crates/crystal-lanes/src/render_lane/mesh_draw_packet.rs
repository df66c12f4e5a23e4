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

//! Compiles one sub-mesh of a model LOD and its material into a draw packet.

use crystal_core::renderer::{
    BuiltinDrawListTag, DrawItem, DrawFilterMask, DrawPacket, DrawPacketRequest, GraphicsDevice,
    RenderError, RenderScene, ResourceGroupId, SrgType,
};
use crystal_data::material::SharedMaterial;
use crystal_data::model::ModelLod;
use std::sync::Arc;

/// The draw packet of one sub-mesh, recompiled only when something it was
/// built from changed.
///
/// A packet recompiles when it is invalidated (material swap, stencil or
/// object group change), when the material's shader revision moves, or when
/// forced. Material property edits alone take the cheap path through
/// [`MeshDrawPacket::flush_material`].
///
/// Per-draw resource groups created by a compilation belong to this packet
/// and are released when it recompiles or is released.
#[derive(Debug)]
pub struct MeshDrawPacket {
    model_lod: Arc<ModelLod>,
    mesh_index: usize,
    object_srg: Option<ResourceGroupId>,
    material: Option<SharedMaterial>,
    draw_packet: Option<DrawPacket>,
    per_draw_srgs: Vec<ResourceGroupId>,
    stencil_ref: Option<u8>,
    needs_update: bool,
    compiled_shader_revision: Option<u64>,
    debug_name: String,
}

impl MeshDrawPacket {
    /// Creates a packet for sub-mesh `mesh_index` of `model_lod`. Nothing is
    /// compiled until the first [`MeshDrawPacket::update`].
    pub fn new(
        model_lod: Arc<ModelLod>,
        mesh_index: usize,
        material: Option<SharedMaterial>,
        object_srg: Option<ResourceGroupId>,
    ) -> Self {
        let debug_name = format!("{}[{mesh_index}]", model_lod.name());
        Self {
            model_lod,
            mesh_index,
            object_srg,
            material,
            draw_packet: None,
            per_draw_srgs: Vec::new(),
            stencil_ref: None,
            needs_update: true,
            compiled_shader_revision: None,
            debug_name,
        }
    }

    /// Swaps the material and schedules a recompile.
    pub fn set_material(&mut self, material: Option<SharedMaterial>) {
        self.material = material;
        self.compiled_shader_revision = None;
        self.needs_update = true;
    }

    /// The material the packet compiles against.
    pub fn material(&self) -> Option<&SharedMaterial> {
        self.material.as_ref()
    }

    /// Overrides the stencil reference of every item; `None` uses the scene default.
    pub fn set_stencil_ref(&mut self, stencil_ref: Option<u8>) {
        if self.stencil_ref != stencil_ref {
            self.stencil_ref = stencil_ref;
            self.needs_update = true;
        }
    }

    /// Replaces the object resource group bound to every item.
    pub fn set_object_resource_group(&mut self, object_srg: Option<ResourceGroupId>) {
        if self.object_srg != object_srg {
            self.object_srg = object_srg;
            self.needs_update = true;
        }
    }

    /// Schedules a recompile on the next update.
    pub fn invalidate(&mut self) {
        self.needs_update = true;
    }

    /// Whether the next non-forced update will recompile.
    pub fn needs_update(&self) -> bool {
        self.needs_update || self.shader_changed()
    }

    /// The sub-mesh index within the LOD.
    pub fn mesh_index(&self) -> usize {
        self.mesh_index
    }

    /// The compiled packet; `None` while the sub-mesh cannot render.
    pub fn draw_packet(&self) -> Option<&DrawPacket> {
        self.draw_packet.as_ref()
    }

    /// Recompiles the packet if needed (or if `force` is set).
    ///
    /// Returns `true` when a compilation ran, even if it produced no packet.
    /// Failures are logged and leave the packet empty for this frame; the
    /// next update tries again.
    pub fn update(
        &mut self,
        scene: &dyn RenderScene,
        device: &dyn GraphicsDevice,
        force: bool,
    ) -> bool {
        if !force && !self.needs_update() {
            log::trace!("Draw packet '{}' unchanged", self.debug_name);
            return false;
        }

        self.needs_update = false;
        self.draw_packet = None;
        self.release_per_draw_groups(device);

        match self.compile(scene, device) {
            Ok(Some(packet)) => {
                log::debug!(
                    "Compiled draw packet '{}' with {} item(s)",
                    self.debug_name,
                    packet.item_count()
                );
                self.draw_packet = Some(packet);
            }
            Ok(None) => {}
            Err(err) => {
                log::error!("Failed to compile draw packet '{}': {err}", self.debug_name);
                self.release_per_draw_groups(device);
                // Retry on the next update.
                self.needs_update = true;
            }
        }
        true
    }

    /// Applies pending material property edits without rebuilding items.
    ///
    /// Returns `true` when a resource-group write was issued. If the flush had
    /// to create the material's resource group, the packet is scheduled for a
    /// recompile so the new group gets bound.
    pub fn flush_material(&mut self, device: &dyn GraphicsDevice) -> bool {
        let Some(material) = &self.material else {
            return false;
        };
        let mut material = material.write();
        if !material.is_dirty() {
            return false;
        }
        let group_before = material.resource_group();
        match material.apply_properties(device) {
            Ok(written) => {
                if material.resource_group() != group_before {
                    self.needs_update = true;
                }
                written
            }
            Err(err) => {
                log::error!(
                    "Failed to flush material '{}' for '{}': {err}",
                    material.name(),
                    self.debug_name
                );
                false
            }
        }
    }

    /// Drops the compiled packet and releases its per-draw resource groups.
    pub fn release(&mut self, device: &dyn GraphicsDevice) {
        self.draw_packet = None;
        self.release_per_draw_groups(device);
        self.needs_update = true;
    }

    fn shader_changed(&self) -> bool {
        match (&self.material, self.compiled_shader_revision) {
            (Some(material), Some(revision)) => material.read().shader_revision() != revision,
            _ => false,
        }
    }

    fn release_per_draw_groups(&mut self, device: &dyn GraphicsDevice) {
        for group in self.per_draw_srgs.drain(..) {
            device.release_resource_group(group);
        }
    }

    fn compile(
        &mut self,
        scene: &dyn RenderScene,
        device: &dyn GraphicsDevice,
    ) -> Result<Option<DrawPacket>, RenderError> {
        let Some(material) = self.material.clone() else {
            log::trace!("Draw packet '{}' has no material", self.debug_name);
            return Ok(None);
        };
        let mut material = material.write();
        self.compiled_shader_revision = Some(material.shader_revision());

        if material.shader_collection().is_none() {
            log::warn!(
                "Material '{}' has no shader, '{}' renders nothing",
                material.name(),
                self.debug_name
            );
            return Ok(None);
        }
        let lod = Arc::clone(&self.model_lod);
        let Some(sub_mesh) = lod.sub_mesh(self.mesh_index) else {
            log::warn!("Draw packet '{}' points past the LOD's sub-meshes", self.debug_name);
            return Ok(None);
        };

        // Items must bind current values.
        material.apply_properties(device)?;
        let Some(view) = material.render_view() else {
            return Ok(None);
        };

        let settings = scene.settings();
        let opaque = scene.builtin_draw_list_tag(BuiltinDrawListTag::Opaque);
        let transparent = scene.builtin_draw_list_tag(BuiltinDrawListTag::Transparent);
        let stencil_ref = self.stencil_ref.unwrap_or(settings.default_stencil_ref);

        let mut items = Vec::with_capacity(view.collection.len());
        for entry in view.collection {
            let tag = entry.draw_list_tag();
            if !entry.is_enabled() || !tag.is_valid() {
                continue;
            }
            let variant = entry.pass().default_variant();
            let reflection = variant.reflection();

            let mut unique_resource_groups = Vec::new();
            if let Some(layout) = reflection.layout(SrgType::PerDraw) {
                let group = device.create_resource_group(layout)?;
                self.per_draw_srgs.push(group);
                unique_resource_groups.push(group);
            }

            let is_current_shader = view
                .current_pass
                .is_some_and(|pass| Arc::ptr_eq(pass, entry.pass()));
            if tag == opaque || tag == transparent || is_current_shader {
                unique_resource_groups.extend(view.resource_group);
            }

            let pipeline_state = variant.pipeline(device, tag, scene.multisample_state(tag))?;

            let mut vertex_buffer_views = Vec::with_capacity(reflection.vertex_inputs.len());
            for input in reflection.vertex_input_semantics() {
                let semantic = match input {
                    Ok(semantic) => semantic,
                    Err(err) => {
                        log::warn!("Variant '{}': {err}", variant.name());
                        continue;
                    }
                };
                let buffer_view = sub_mesh
                    .vertex_buffer_infos
                    .iter()
                    .find(|info| info.semantic.matches(&semantic, settings.semantic_matching))
                    .and_then(|info| lod.vertex_buffer_view(info));
                match buffer_view {
                    Some(buffer_view) => vertex_buffer_views.push(buffer_view),
                    None => log::trace!(
                        "'{}' has no {semantic} stream for variant '{}'",
                        self.debug_name,
                        variant.name()
                    ),
                }
            }

            items.push(DrawItem {
                draw_list_tag: tag,
                draw_filter_mask: DrawFilterMask::ALL,
                stencil_ref,
                pipeline_state,
                unique_resource_groups,
                vertex_buffer_views,
                index_buffer_view: sub_mesh.index_buffer_view,
            });
        }

        let request = DrawPacketRequest {
            debug_name: self.debug_name.clone(),
            draw_arguments: sub_mesh.draw_arguments,
            resource_groups: self.object_srg.into_iter().collect(),
            items,
        };
        Ok(Some(device.build_draw_packet(request)?))
    }
}

impl Drop for MeshDrawPacket {
    fn drop(&mut self) {
        if !self.per_draw_srgs.is_empty() {
            log::error!(
                "Draw packet '{}' dropped with {} unreleased per-draw resource group(s)",
                self.debug_name,
                self.per_draw_srgs.len()
            );
        }
    }
}
