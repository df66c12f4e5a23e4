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

use crystal_agents::{
    MeshHandleDescriptor, MeshRenderAgent, StaticMeshComponent, StaticMeshFeatureProcessor,
    LOCAL_TO_WORLD_ENTRY,
};
use crystal_core::asset::AssetHandle;
use crystal_core::math::{LinearRgba, Mat4, Vec3};
use crystal_core::renderer::{
    BuiltinDrawListTag, PropertyValue, ResourceGroupEntry, ResourceGroupLayout, ShaderReflection,
    ShaderVariantId, SrgType,
};
use crystal_core::testing::{FixedScene, RecordingDevice};
use crystal_data::component::{MeshHandleState, TickPlan};
use crystal_data::material::{CustomMaterialId, Material, MaterialMap, SharedMaterial};
use crystal_data::model::{primitives, Model, ModelLodAsset, StaticMesh};
use crystal_data::shader::{
    Shader, ShaderCollection, ShaderCollectionItem, ShaderPass, ShaderVariant,
};
use std::sync::Arc;

// --- Fixtures ---

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn lit_shader(scene: &FixedScene) -> AssetHandle<Shader> {
    let reflection = ShaderReflection {
        vertex_inputs: vec!["POSITION".into(), "NORMAL".into()],
        resource_groups: vec![ResourceGroupLayout::new("lit/material", SrgType::PerMaterial)],
    };
    let variant = ShaderVariant::new(ShaderVariantId(1), "lit", reflection);
    let pass = ShaderPass::new("lit", scene.builtin(BuiltinDrawListTag::Opaque), vec![variant])
        .unwrap();
    AssetHandle::new(Shader::new(
        "lit",
        ShaderCollection::new(vec![ShaderCollectionItem::new(Arc::new(pass))]),
    ))
}

fn material(name: &str, shader: &AssetHandle<Shader>) -> SharedMaterial {
    let mut material = Material::with_shader(name, shader.clone());
    material.set_property("base_color", LinearRgba::rgb(0.8, 0.8, 0.8));
    material.into_shared()
}

fn mesh(
    device: &RecordingDevice,
    lod: ModelLodAsset,
    materials: Vec<SharedMaterial>,
) -> AssetHandle<StaticMesh> {
    let model = Model::upload("model", &[lod], device).unwrap();
    AssetHandle::new(StaticMesh::new("mesh", AssetHandle::new(model), materials))
}

/// A cube and a sphere in one LOD, using material slots 0 and 1.
fn two_part_lod() -> ModelLodAsset {
    let mut lod = primitives::cube(1.0);
    let mut sphere = primitives::uv_sphere(0.5, 8, 4).sub_meshes.remove(0);
    sphere.material_index = 1;
    lod.sub_meshes.push(sphere);
    lod
}

struct Fixture {
    device: RecordingDevice,
    scene: FixedScene,
    shader: AssetHandle<Shader>,
    fp: StaticMeshFeatureProcessor,
}

impl Fixture {
    fn new() -> Self {
        init_logger();
        let scene = FixedScene::new();
        let shader = lit_shader(&scene);
        Self {
            device: RecordingDevice::new(),
            fp: StaticMeshFeatureProcessor::new(Some(shader.clone())),
            scene,
            shader,
        }
    }

    fn frame(&mut self, component: &mut StaticMeshComponent, transform: Mat4) -> TickPlan {
        let plan = component.tick(Some(&mut self.fp), &self.device, transform);
        self.fp.update(&self.scene, &self.device);
        plan
    }

    fn teardown(mut self, component: &mut StaticMeshComponent, materials: &[SharedMaterial]) {
        component.release(Some(&mut self.fp), &self.device);
        self.fp.release_all(&self.device);
        for material in materials {
            material.write().release(&self.device);
        }
    }
}

// --- Tests ---

#[test]
fn test_material_change_patches_existing_handle() {
    let mut fx = Fixture::new();
    let first = material("first", &fx.shader);
    let second = material("second", &fx.shader);
    let mut component = StaticMeshComponent::new("crate");
    component.set_static_mesh(Some(mesh(&fx.device, primitives::cube(1.0), vec![first.clone()])));

    assert_eq!(fx.frame(&mut component, Mat4::IDENTITY), TickPlan::Rebuild);
    let handle = component.handle().unwrap();

    component.set_material(Some(second.clone()), 0, 0);
    assert_eq!(fx.frame(&mut component, Mat4::IDENTITY), TickPlan::PatchMaterials);

    assert_eq!(component.handle(), Some(handle));
    assert_eq!(fx.fp.len(), 1);
    let bound = fx.fp.get(handle).unwrap().sub_mesh_material(0, 0).unwrap();
    assert!(Arc::ptr_eq(bound, &second));

    fx.teardown(&mut component, &[first, second]);
}

#[test]
fn test_unchanged_material_map_does_not_recompile() {
    let mut fx = Fixture::new();
    let mat = material("m", &fx.shader);
    let mut component = StaticMeshComponent::new("crate");
    component.set_static_mesh(Some(mesh(&fx.device, primitives::cube(1.0), vec![mat.clone()])));
    fx.frame(&mut component, Mat4::IDENTITY);

    // Reassigning the same material raises the dirty flag but resolves identically.
    component.set_material(Some(mat.clone()), 0, 0);
    component.tick(Some(&mut fx.fp), &fx.device, Mat4::IDENTITY);
    let stats = fx.fp.update(&fx.scene, &fx.device);

    assert_eq!(stats.packets_compiled, 0);
    fx.teardown(&mut component, &[mat]);
}

#[test]
fn test_mesh_reassignment_acquires_new_handle() {
    let mut fx = Fixture::new();
    let mat = material("m", &fx.shader);
    let mut component = StaticMeshComponent::new("crate");
    component.set_static_mesh(Some(mesh(&fx.device, primitives::cube(1.0), vec![mat.clone()])));
    fx.frame(&mut component, Mat4::IDENTITY);
    let old = component.handle().unwrap();

    component.set_static_mesh(Some(mesh(&fx.device, primitives::cube(2.0), vec![mat.clone()])));
    assert_eq!(component.state(), MeshHandleState::PendingRebuild);
    assert_eq!(fx.frame(&mut component, Mat4::IDENTITY), TickPlan::Rebuild);

    let new = component.handle().unwrap();
    assert_ne!(new, old);
    assert!(!fx.fp.contains(old));
    assert_eq!(fx.fp.len(), 1);
    assert_eq!(component.state(), MeshHandleState::HandleValid);

    fx.teardown(&mut component, &[mat]);
}

#[test]
fn test_disable_toggles_visibility_without_rebuild() {
    let mut fx = Fixture::new();
    let mat = material("m", &fx.shader);
    let mut component = StaticMeshComponent::new("crate");
    component.set_static_mesh(Some(mesh(&fx.device, primitives::cube(1.0), vec![mat.clone()])));
    fx.frame(&mut component, Mat4::IDENTITY);
    let handle = component.handle().unwrap();

    component.set_enabled(false, Some(&mut fx.fp));
    component.tick(Some(&mut fx.fp), &fx.device, Mat4::IDENTITY);
    let hidden = fx.fp.update(&fx.scene, &fx.device);

    assert_eq!(component.handle(), Some(handle));
    assert!(!fx.fp.get(handle).unwrap().is_visible());
    assert_eq!(hidden.packets_compiled, 0);
    assert_eq!(hidden.draw_items, 0);
    assert_eq!(fx.fp.visible_draw_packets().count(), 0);

    component.set_enabled(true, Some(&mut fx.fp));
    component.tick(Some(&mut fx.fp), &fx.device, Mat4::IDENTITY);
    let shown = fx.fp.update(&fx.scene, &fx.device);

    assert_eq!(component.handle(), Some(handle));
    assert_eq!(shown.packets_compiled, 0);
    assert_eq!(shown.draw_items, 1);

    fx.teardown(&mut component, &[mat]);
}

#[test]
fn test_tick_without_feature_processor_is_a_no_op() {
    let mut fx = Fixture::new();
    let mat = material("m", &fx.shader);
    let mut component = StaticMeshComponent::new("crate");
    component.set_static_mesh(Some(mesh(&fx.device, primitives::cube(1.0), vec![mat.clone()])));

    assert_eq!(component.tick(None, &fx.device, Mat4::IDENTITY), TickPlan::Idle);
    assert!(component.handle().is_none());
    assert_eq!(component.state(), MeshHandleState::PendingRebuild);

    // The pending rebuild runs once a feature processor is available.
    assert_eq!(fx.frame(&mut component, Mat4::IDENTITY), TickPlan::Rebuild);
    assert!(component.handle().is_some());

    fx.teardown(&mut component, &[mat]);
}

#[test]
fn test_unassigned_sub_mesh_falls_back_to_error_material() {
    let mut fx = Fixture::new();
    let cube_material = material("cube", &fx.shader);
    let mut component = StaticMeshComponent::new("props");
    // Only slot 0 exists; the sphere's slot 1 resolves to nothing.
    component.set_static_mesh(Some(mesh(&fx.device, two_part_lod(), vec![cube_material.clone()])));
    fx.frame(&mut component, Mat4::IDENTITY);

    let instance = fx.fp.get(component.handle().unwrap()).unwrap();
    assert!(Arc::ptr_eq(instance.sub_mesh_material(0, 0).unwrap(), &cube_material));
    let fallback = instance.sub_mesh_material(0, 1).unwrap();
    assert!(Arc::ptr_eq(fallback, fx.fp.error_material()));
    assert_eq!(
        fallback.read().property("base_color"),
        Some(PropertyValue::Color(LinearRgba::MAGENTA))
    );
    assert_eq!(fx.fp.visible_draw_packets().count(), 2);

    fx.teardown(&mut component, &[cube_material]);
}

#[test]
fn test_transform_is_written_when_it_changes() {
    let mut fx = Fixture::new();
    let mat = material("m", &fx.shader);
    let mut component = StaticMeshComponent::new("crate");
    component.set_static_mesh(Some(mesh(&fx.device, primitives::cube(1.0), vec![mat.clone()])));
    let moved = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

    component.tick(Some(&mut fx.fp), &fx.device, moved);
    let first = fx.fp.update(&fx.scene, &fx.device);
    component.tick(Some(&mut fx.fp), &fx.device, moved);
    let steady = fx.fp.update(&fx.scene, &fx.device);

    assert_eq!(first.transforms_pushed, 1);
    assert_eq!(steady.transforms_pushed, 0);

    let instance = fx.fp.get(component.handle().unwrap()).unwrap();
    assert_eq!(instance.local_to_world(), moved);
    let srg = instance.object_resource_group().unwrap();
    let written = fx.device.last_write(srg).unwrap();
    assert_eq!(written[0], ResourceGroupEntry::new(LOCAL_TO_WORLD_ENTRY, moved.into()));

    fx.teardown(&mut component, &[mat]);
}

#[test]
fn test_clearing_mesh_releases_handle() {
    let mut fx = Fixture::new();
    let mat = material("m", &fx.shader);
    let mut component = StaticMeshComponent::new("crate");
    component.set_static_mesh(Some(mesh(&fx.device, primitives::cube(1.0), vec![mat.clone()])));
    fx.frame(&mut component, Mat4::IDENTITY);
    let srg = fx
        .fp
        .get(component.handle().unwrap())
        .unwrap()
        .object_resource_group()
        .unwrap();

    component.set_static_mesh(None);
    assert_eq!(fx.frame(&mut component, Mat4::IDENTITY), TickPlan::Release);

    assert!(component.handle().is_none());
    assert!(fx.fp.is_empty());
    assert!(!fx.device.is_resource_group_live(srg));
    assert_eq!(component.state(), MeshHandleState::NoMesh);

    fx.teardown(&mut component, &[mat]);
}

#[test]
fn test_property_edit_is_flushed_without_recompile() {
    let mut fx = Fixture::new();
    let mat = material("m", &fx.shader);
    let mut component = StaticMeshComponent::new("crate");
    component.set_static_mesh(Some(mesh(&fx.device, primitives::cube(1.0), vec![mat.clone()])));
    fx.frame(&mut component, Mat4::IDENTITY);

    mat.write().set_property("base_color", LinearRgba::rgb(1.0, 0.0, 0.0));
    component.tick(Some(&mut fx.fp), &fx.device, Mat4::IDENTITY);
    let stats = fx.fp.update(&fx.scene, &fx.device);

    assert_eq!(stats.packets_compiled, 0);
    assert_eq!(stats.materials_flushed, 1);

    fx.teardown(&mut component, &[mat]);
}

#[test]
fn test_agent_prepares_frames_end_to_end() {
    init_logger();
    let device = RecordingDevice::new();
    let scene = FixedScene::new();
    let shader = lit_shader(&scene);
    let mut agent = MeshRenderAgent::new(Some(StaticMeshFeatureProcessor::new(None)));

    let mat = material("m", &shader);
    let mesh = agent
        .mesh_preparation_system()
        .prepare_lods("props", &[two_part_lod()], vec![mat.clone(), mat.clone()], &device)
        .unwrap();
    let mut left = StaticMeshComponent::new("left");
    let mut right = StaticMeshComponent::new("right");
    left.set_static_mesh(Some(mesh.clone()));
    right.set_static_mesh(Some(mesh));

    let first = agent.prepare_frame(
        [(&mut left, Mat4::IDENTITY), (&mut right, Mat4::from_scale(Vec3::splat(2.0)))],
        &scene,
        &device,
    );
    let second = agent.prepare_frame(
        [(&mut left, Mat4::IDENTITY), (&mut right, Mat4::from_scale(Vec3::splat(2.0)))],
        &scene,
        &device,
    );

    assert_eq!(first.packets_compiled, 4);
    assert_eq!(first.draw_items, 4);
    assert_eq!(second.packets_compiled, 0);
    assert_eq!(second.draw_items, 4);
    assert_eq!(agent.visible_draw_packets().count(), 4);
    assert_eq!(agent.frame_count(), 2);
    assert_eq!(agent.last_stats(), second);

    agent.release_component(&mut left, &device);
    agent.release_component(&mut right, &device);
    agent.shutdown(&device);
    assert_eq!(device.buffer_count(), 0);
    assert_eq!(device.live_resource_group_count(), 0);
}

#[test]
fn test_agent_without_feature_processor_prepares_nothing() {
    init_logger();
    let device = RecordingDevice::new();
    let scene = FixedScene::new();
    let shader = lit_shader(&scene);
    let mut agent = MeshRenderAgent::new(None);
    let mat = material("m", &shader);
    let mut component = StaticMeshComponent::new("crate");
    component.set_static_mesh(Some(mesh(&device, primitives::cube(1.0), vec![mat.clone()])));

    let stats = agent.prepare_frame([(&mut component, Mat4::IDENTITY)], &scene, &device);

    assert_eq!(stats, Default::default());
    assert!(component.handle().is_none());
    assert_eq!(agent.visible_draw_packets().count(), 0);
    assert_eq!(device.packets_built(), 0);
}

#[test]
fn test_registration_without_default_slot_renders_nothing_for_unresolved_sub_mesh() {
    let mut fx = Fixture::new();
    let mat = material("cube", &fx.shader);
    let mut map = MaterialMap::new();
    map.insert(CustomMaterialId::new(0, 0), mat.clone());
    let descriptor = MeshHandleDescriptor::new(mesh(&fx.device, two_part_lod(), Vec::new()));

    let handle = fx.fp.acquire_mesh(&fx.device, descriptor, map);
    let stats = fx.fp.update(&fx.scene, &fx.device);

    let instance = fx.fp.get(handle).unwrap();
    assert!(instance.sub_mesh_material(0, 1).is_none());
    assert!(instance.lod_packets(0)[1].draw_packet().is_none());
    assert_eq!(stats.draw_items, 1);

    assert!(fx.fp.release_mesh(&fx.device, handle));
    assert!(fx.fp.is_empty());
    fx.fp.release_all(&fx.device);
    mat.write().release(&fx.device);
}

#[test]
fn test_release_after_shutdown_forgets_stale_handle() {
    init_logger();
    let device = RecordingDevice::new();
    let scene = FixedScene::new();
    let shader = lit_shader(&scene);
    let mut agent = MeshRenderAgent::new(Some(StaticMeshFeatureProcessor::new(None)));
    let mat = material("m", &shader);
    let mut component = StaticMeshComponent::new("crate");
    component.set_static_mesh(Some(mesh(&device, primitives::cube(1.0), vec![mat.clone()])));
    agent.prepare_frame([(&mut component, Mat4::IDENTITY)], &scene, &device);
    assert!(component.handle().is_some());

    // Shutting down first invalidates the component's handle.
    agent.shutdown(&device);
    agent.release_component(&mut component, &device);

    assert!(component.handle().is_none());
    assert_eq!(component.state(), MeshHandleState::NoMesh);
    assert!(agent.feature_processor().unwrap().is_empty());
    mat.write().release(&device);
}

#[test]
fn test_dropped_component_leaves_its_registration_behind() {
    let mut fx = Fixture::new();
    let mat = material("m", &fx.shader);
    let mut component = StaticMeshComponent::new("crate");
    component.set_static_mesh(Some(mesh(&fx.device, primitives::cube(1.0), vec![mat.clone()])));
    fx.frame(&mut component, Mat4::IDENTITY);

    drop(component);

    // Dropping without release only logs; the registration stays until teardown.
    assert_eq!(fx.fp.len(), 1);
    fx.fp.release_all(&fx.device);
    assert!(fx.fp.is_empty());
    mat.write().release(&fx.device);
}
