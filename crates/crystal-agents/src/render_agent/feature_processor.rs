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

//! Defines the static mesh feature processor, the owner of every registered mesh.

use crystal_core::asset::AssetHandle;
use crystal_core::math::{LinearRgba, Mat4};
use crystal_core::renderer::{
    DrawPacket, GraphicsDevice, RenderScene, ResourceGroupEntry, ResourceGroupId,
    ResourceGroupLayout, SrgType,
};
use crystal_data::material::{Material, MaterialMap, SharedMaterial};
use crystal_data::model::{Model, StaticMesh};
use crystal_data::shader::Shader;
use crystal_lanes::MeshDrawPacket;
use slotmap::SlotMap;
use std::sync::Arc;

slotmap::new_key_type! {
    /// A generational handle to a mesh registered with the feature processor.
    ///
    /// A released handle never aliases a later registration.
    pub struct ModelHandle;
}

/// Name of the object resource-group entry holding the world transform.
pub const LOCAL_TO_WORLD_ENTRY: &str = "local_to_world";
/// Name of the object resource-group entry holding the normal matrix.
pub const NORMAL_MATRIX_ENTRY: &str = "normal_matrix";

/// What to register with [`StaticMeshFeatureProcessor::acquire_mesh`].
#[derive(Debug, Clone)]
pub struct MeshHandleDescriptor {
    /// A debug name for logs.
    pub debug_name: String,
    /// The mesh whose model is drawn.
    pub mesh: AssetHandle<StaticMesh>,
}

impl MeshHandleDescriptor {
    /// Describes a registration of `mesh`, named after it.
    pub fn new(mesh: AssetHandle<StaticMesh>) -> Self {
        Self {
            debug_name: mesh.name().to_string(),
            mesh,
        }
    }
}

/// Counters of one [`StaticMeshFeatureProcessor::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramePrepareStats {
    /// Draw packets that went through a full compilation.
    pub packets_compiled: usize,
    /// Material resource-group writes issued on the cheap path.
    pub materials_flushed: usize,
    /// Transforms written to object resource groups.
    pub transforms_pushed: usize,
    /// Draw items ready for submission from visible instances.
    pub draw_items: usize,
}

/// The render-side state behind a [`ModelHandle`].
#[derive(Debug)]
pub struct ModelDataInstance {
    debug_name: String,
    model: AssetHandle<Model>,
    material_map: MaterialMap,
    local_to_world: Mat4,
    transform_dirty: bool,
    visible: bool,
    object_srg: Option<ResourceGroupId>,
    // One list of packets per LOD, indexed by sub-mesh.
    packets: Vec<Vec<MeshDrawPacket>>,
}

impl ModelDataInstance {
    /// The debug name given at registration.
    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    /// The registered model.
    pub fn model(&self) -> &AssetHandle<Model> {
        &self.model
    }

    /// The material map the packets were resolved from.
    pub fn material_map(&self) -> &MaterialMap {
        &self.material_map
    }

    /// The last transform pushed into the handle.
    pub fn local_to_world(&self) -> Mat4 {
        self.local_to_world
    }

    /// Whether the instance is submitted for drawing.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The per-object resource group, if its creation succeeded.
    pub fn object_resource_group(&self) -> Option<ResourceGroupId> {
        self.object_srg
    }

    /// The draw packets of one LOD.
    pub fn lod_packets(&self, lod: usize) -> &[MeshDrawPacket] {
        self.packets.get(lod).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The material bound to a sub-mesh of a LOD.
    pub fn sub_mesh_material(&self, lod: usize, sub_mesh: usize) -> Option<&SharedMaterial> {
        self.packets.get(lod)?.get(sub_mesh)?.material()
    }

    fn packets_mut(&mut self) -> impl Iterator<Item = &mut MeshDrawPacket> {
        self.packets.iter_mut().flatten()
    }

    fn release(&mut self, device: &dyn GraphicsDevice) {
        for packet in self.packets_mut() {
            packet.release(device);
        }
        self.packets.clear();
        if let Some(srg) = self.object_srg.take() {
            device.release_resource_group(srg);
        }
    }
}

/// Registers static meshes and keeps their draw packets current.
///
/// Each registration gets one [`MeshDrawPacket`] per sub-mesh of every LOD,
/// resolved against the registration's [`MaterialMap`]. Sub-meshes without an
/// entry use the map's default slot; when that is empty too they render
/// nothing. Components fill the default slot with [`Self::error_material`].
#[derive(Debug)]
pub struct StaticMeshFeatureProcessor {
    // Live registrations.
    instances: SlotMap<ModelHandle, ModelDataInstance>,
    // Handed to components for the default material slot.
    error_material: SharedMaterial,
    // Layout of the per-object resource group of each registration.
    object_layout: ResourceGroupLayout,
}

impl StaticMeshFeatureProcessor {
    /// Creates a processor whose error material renders with `error_shader`.
    ///
    /// Without a shader the error material compiles to empty packets.
    pub fn new(error_shader: Option<AssetHandle<Shader>>) -> Self {
        let mut error_material = Material::new("error");
        error_material.set_shader(error_shader);
        error_material.set_property("base_color", LinearRgba::MAGENTA);
        Self {
            instances: SlotMap::with_key(),
            error_material: error_material.into_shared(),
            object_layout: ResourceGroupLayout::new("object", SrgType::PerObject),
        }
    }

    /// The fallback material.
    pub fn error_material(&self) -> &SharedMaterial {
        &self.error_material
    }

    /// Registers a mesh and returns its handle.
    ///
    /// Packets are created immediately but compiled on the next
    /// [`StaticMeshFeatureProcessor::update`]. A failure to create the
    /// per-object resource group is logged; the registration still succeeds and
    /// its packets are built without one.
    pub fn acquire_mesh(
        &mut self,
        device: &dyn GraphicsDevice,
        descriptor: MeshHandleDescriptor,
        material_map: MaterialMap,
    ) -> ModelHandle {
        let object_srg = match device.create_resource_group(&self.object_layout) {
            Ok(srg) => Some(srg),
            Err(err) => {
                log::error!(
                    "Failed to create object resource group for '{}': {err}",
                    descriptor.debug_name
                );
                None
            }
        };

        let model = descriptor.mesh.model().clone();
        let packets: Vec<Vec<MeshDrawPacket>> = model
            .lods()
            .iter()
            .enumerate()
            .map(|(lod_index, lod)| {
                (0..lod.sub_meshes().len())
                    .map(|sub_mesh| {
                        let material = material_map
                            .resolve(lod_index as u32, sub_mesh as u32)
                            .cloned();
                        MeshDrawPacket::new(Arc::clone(lod), sub_mesh, material, object_srg)
                    })
                    .collect()
            })
            .collect();

        let handle = self.instances.insert(ModelDataInstance {
            debug_name: descriptor.debug_name,
            model,
            material_map,
            local_to_world: Mat4::IDENTITY,
            transform_dirty: true,
            visible: true,
            object_srg,
            packets,
        });
        log::debug!(
            "Acquired mesh handle {handle:?} for '{}'",
            self.instances[handle].debug_name
        );
        handle
    }

    /// Releases a registration and everything its packets hold.
    ///
    /// Returns `false` for a handle that is not live. Releasing a handle twice
    /// is a caller bug and asserts in debug builds.
    pub fn release_mesh(&mut self, device: &dyn GraphicsDevice, handle: ModelHandle) -> bool {
        debug_assert!(
            self.instances.contains_key(handle),
            "mesh handle {handle:?} released twice"
        );
        match self.instances.remove(handle) {
            Some(mut instance) => {
                instance.release(device);
                log::debug!(
                    "Released mesh handle {handle:?} for '{}'",
                    instance.debug_name
                );
                true
            }
            None => {
                log::warn!("Ignoring release of stale mesh handle {handle:?}");
                false
            }
        }
    }

    /// Replaces the material map of a registration.
    ///
    /// Only packets whose resolved material actually changed are scheduled for
    /// a recompile.
    pub fn set_material_map(&mut self, handle: ModelHandle, material_map: MaterialMap) {
        let Some(instance) = self.instances.get_mut(handle) else {
            log::warn!("Material map pushed to stale mesh handle {handle:?}");
            return;
        };
        for (lod_index, packets) in instance.packets.iter_mut().enumerate() {
            for packet in packets.iter_mut() {
                let material =
                    material_map.resolve(lod_index as u32, packet.mesh_index() as u32);
                let unchanged = match (packet.material(), material) {
                    (Some(current), Some(material)) => Arc::ptr_eq(current, material),
                    (None, None) => true,
                    _ => false,
                };
                if !unchanged {
                    packet.set_material(material.cloned());
                }
            }
        }
        instance.material_map = material_map;
    }

    /// Pushes the world transform of a registration. Unchanged transforms are
    /// not rewritten.
    pub fn set_transform(&mut self, handle: ModelHandle, local_to_world: Mat4) {
        if let Some(instance) = self.instances.get_mut(handle) {
            if instance.local_to_world != local_to_world {
                instance.local_to_world = local_to_world;
                instance.transform_dirty = true;
            }
        }
    }

    /// Shows or hides a registration without touching its packets.
    pub fn set_visible(&mut self, handle: ModelHandle, visible: bool) {
        if let Some(instance) = self.instances.get_mut(handle) {
            instance.visible = visible;
        }
    }

    /// The state behind a handle.
    pub fn get(&self, handle: ModelHandle) -> Option<&ModelDataInstance> {
        self.instances.get(handle)
    }

    /// Whether `handle` is live.
    pub fn contains(&self, handle: ModelHandle) -> bool {
        self.instances.contains_key(handle)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Brings every registration up to date for this frame.
    ///
    /// Packets that need it are recompiled; the rest only flush pending
    /// material edits. Changed transforms are written into the object resource
    /// groups afterwards.
    pub fn update(
        &mut self,
        scene: &dyn RenderScene,
        device: &dyn GraphicsDevice,
    ) -> FramePrepareStats {
        let mut stats = FramePrepareStats::default();

        for instance in self.instances.values_mut() {
            for packet in instance.packets_mut() {
                if packet.needs_update() {
                    packet.update(scene, device, false);
                    stats.packets_compiled += 1;
                } else if packet.flush_material(device) {
                    stats.materials_flushed += 1;
                }
            }

            if instance.transform_dirty {
                if let Some(srg) = instance.object_srg {
                    match device.write_resource_group(srg, &object_entries(instance.local_to_world))
                    {
                        Ok(()) => stats.transforms_pushed += 1,
                        Err(err) => log::error!(
                            "Failed to write transform of '{}': {err}",
                            instance.debug_name
                        ),
                    }
                }
                instance.transform_dirty = false;
            }

            if instance.visible {
                stats.draw_items += instance
                    .lod_packets(0)
                    .iter()
                    .filter_map(MeshDrawPacket::draw_packet)
                    .map(DrawPacket::item_count)
                    .sum::<usize>();
            }
        }

        log::trace!(
            "Prepared {} mesh(es): {} compiled, {} flushed, {} item(s)",
            self.instances.len(),
            stats.packets_compiled,
            stats.materials_flushed,
            stats.draw_items
        );
        stats
    }

    /// The compiled packets of every visible registration.
    ///
    /// LOD selection is not performed; the first LOD is submitted.
    pub fn visible_draw_packets(&self) -> impl Iterator<Item = &DrawPacket> {
        self.instances
            .values()
            .filter(|instance| instance.visible)
            .flat_map(|instance| instance.lod_packets(0))
            .filter_map(MeshDrawPacket::draw_packet)
    }

    /// Releases every registration and the error material's resources.
    pub fn release_all(&mut self, device: &dyn GraphicsDevice) {
        for (_, mut instance) in self.instances.drain() {
            instance.release(device);
        }
        self.error_material.write().release(device);
    }
}

impl Drop for StaticMeshFeatureProcessor {
    fn drop(&mut self) {
        if !self.instances.is_empty() {
            log::error!(
                "Static mesh feature processor dropped with {} live handle(s)",
                self.instances.len()
            );
        }
    }
}

fn object_entries(local_to_world: Mat4) -> [ResourceGroupEntry; 2] {
    [
        ResourceGroupEntry::new(LOCAL_TO_WORLD_ENTRY, local_to_world.into()),
        ResourceGroupEntry::new(
            NORMAL_MATRIX_ENTRY,
            local_to_world.inverse().transpose().into(),
        ),
    ]
}
