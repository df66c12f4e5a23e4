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

use criterion::{criterion_group, criterion_main, Criterion};
use crystal_core::asset::AssetHandle;
use crystal_core::math::LinearRgba;
use crystal_core::renderer::{
    BuiltinDrawListTag, ResourceGroupLayout, ShaderReflection, ShaderVariantId, SrgType,
};
use crystal_core::testing::{FixedScene, RecordingDevice};
use crystal_data::material::Material;
use crystal_data::model::{primitives, ModelLod};
use crystal_data::shader::{
    Shader, ShaderCollection, ShaderCollectionItem, ShaderPass, ShaderVariant,
};
use crystal_lanes::MeshDrawPacket;
use std::hint::black_box;
use std::sync::Arc;

fn lit_shader(scene: &FixedScene) -> AssetHandle<Shader> {
    let make_pass = |id: usize, tag: BuiltinDrawListTag, inputs: &[&str], groups: &[SrgType]| {
        let reflection = ShaderReflection {
            vertex_inputs: inputs.iter().map(|s| s.to_string()).collect(),
            resource_groups: groups
                .iter()
                .map(|srg| ResourceGroupLayout::new(format!("{srg:?}"), *srg))
                .collect(),
        };
        let variant = ShaderVariant::new(ShaderVariantId(id), format!("{tag:?}"), reflection);
        Arc::new(ShaderPass::new(format!("{tag:?}"), scene.builtin(tag), vec![variant]).unwrap())
    };
    let items = vec![
        ShaderCollectionItem::new(make_pass(
            1,
            BuiltinDrawListTag::Opaque,
            &["POSITION", "NORMAL", "TANGENT", "TEXCOORD0"],
            &[SrgType::PerDraw, SrgType::PerMaterial],
        )),
        ShaderCollectionItem::new(make_pass(
            2,
            BuiltinDrawListTag::Shadow,
            &["POSITION"],
            &[],
        )),
        ShaderCollectionItem::new(make_pass(
            3,
            BuiltinDrawListTag::Depth,
            &["POSITION"],
            &[],
        )),
    ];
    AssetHandle::new(Shader::new("lit", ShaderCollection::new(items)))
}

fn bench_draw_packets(c: &mut Criterion) {
    let device = RecordingDevice::new();
    let scene = FixedScene::new();
    let lod = Arc::new(ModelLod::upload(&primitives::uv_sphere(1.0, 32, 16), &device).unwrap());
    let mut material = Material::with_shader("bench", lit_shader(&scene));
    material.set_property("base_color", LinearRgba::WHITE);
    let material = material.into_shared();

    let mut packet = MeshDrawPacket::new(lod, 0, Some(material.clone()), None);
    packet.update(&scene, &device, true);

    let mut group = c.benchmark_group("Mesh Draw Packet");

    group.bench_function("Steady state (no change)", |b| {
        b.iter(|| black_box(packet.update(&scene, &device, false)));
    });

    group.bench_function("Property flush", |b| {
        b.iter(|| {
            material.write().set_property("roughness", black_box(0.5f32));
            black_box(packet.flush_material(&device))
        });
    });

    group.bench_function("Forced recompile", |b| {
        b.iter(|| black_box(packet.update(&scene, &device, true)));
    });

    group.finish();

    packet.release(&device);
    material.write().release(&device);
}

criterion_group!(benches, bench_draw_packets);
criterion_main!(benches);
