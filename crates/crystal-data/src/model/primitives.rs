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

//! Procedural geometry for tests, previews and placeholder meshes.

use super::{ModelLodAsset, SubMeshAsset};
use crystal_core::math::{Vec2, Vec3, PI, TAU};

/// An axis-aligned cube centered on the origin, one sub-mesh with four
/// vertices per face so normals stay flat.
pub fn cube(size: f32) -> ModelLodAsset {
    let h = size * 0.5;
    // (normal, u, v) with u x v == normal
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut sub_mesh = SubMeshAsset {
        name: "cube".to_string(),
        ..Default::default()
    };
    for (normal, u, v) in faces {
        let base = sub_mesh.positions.len() as u32;
        for (sx, sy) in corners {
            sub_mesh.positions.push((normal + u * sx + v * sy) * h);
            sub_mesh.normals.push(normal);
            sub_mesh.tangents.push(u.extend(1.0));
            sub_mesh
                .uv0
                .push(Vec2::new((sx + 1.0) * 0.5, 1.0 - (sy + 1.0) * 0.5));
        }
        sub_mesh
            .indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    ModelLodAsset {
        name: "cube".to_string(),
        sub_meshes: vec![sub_mesh],
    }
}

/// A UV sphere centered on the origin.
///
/// `segments` is clamped to at least 3 and `rings` to at least 2. The seam
/// column is duplicated so UVs wrap cleanly.
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> ModelLodAsset {
    let segments = segments.max(3);
    let rings = rings.max(2);

    let mut sub_mesh = SubMeshAsset {
        name: "sphere".to_string(),
        ..Default::default()
    };
    for r in 0..=rings {
        let theta = PI * r as f32 / rings as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for s in 0..=segments {
            let phi = TAU * s as f32 / segments as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let normal = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
            sub_mesh.positions.push(normal * radius);
            sub_mesh.normals.push(normal);
            sub_mesh
                .tangents
                .push(Vec3::new(-sin_phi, 0.0, cos_phi).extend(1.0));
            sub_mesh.uv0.push(Vec2::new(
                s as f32 / segments as f32,
                r as f32 / rings as f32,
            ));
        }
    }

    let stride = segments + 1;
    for r in 0..rings {
        for s in 0..segments {
            let a = r * stride + s;
            let b = a + stride;
            sub_mesh
                .indices
                .extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }

    ModelLodAsset {
        name: "sphere".to_string(),
        sub_meshes: vec![sub_mesh],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_outward_winding(asset: &ModelLodAsset) {
        let mesh = &asset.sub_meshes[0];
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.positions[i as usize]);
            let face = (b - a).cross(c - a);
            if face.length_squared() < 1e-12 {
                // Degenerate triangles at the sphere poles.
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(face.dot(centroid) > 0.0, "triangle {tri:?} faces inward");
        }
    }

    #[test]
    fn test_cube_layout_and_winding() {
        let cube = cube(2.0);
        let mesh = &cube.sub_meshes[0];
        assert_eq!(mesh.positions.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!(mesh.positions.iter().all(|p| p.abs().max_element() == 1.0));
        assert_outward_winding(&cube);
    }

    #[test]
    fn test_sphere_vertices_lie_on_radius() {
        let sphere = uv_sphere(0.5, 12, 6);
        let mesh = &sphere.sub_meshes[0];
        assert_eq!(mesh.positions.len(), 13 * 7);
        assert_eq!(mesh.indices.len(), 12 * 6 * 6);
        for p in &mesh.positions {
            assert_relative_eq!(p.length(), 0.5, epsilon = 1e-5);
        }
        assert_outward_winding(&sphere);
    }

    #[test]
    fn test_sphere_clamps_degenerate_tessellation() {
        let sphere = uv_sphere(1.0, 0, 0);
        assert_eq!(sphere.sub_meshes[0].positions.len(), 4 * 3);
    }
}
