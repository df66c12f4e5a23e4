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

use crystal_core::asset::Asset;
use crystal_core::math::{Vec2, Vec3, Vec4};
use crystal_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, BufferView, DrawIndexed, GraphicsDevice,
    IndexBufferView, IndexFormat, ResourceError, ShaderSemantic, ShaderSemanticAttribute,
};
use std::borrow::Cow;

/// CPU-side geometry of one sub-mesh.
///
/// Optional streams are either empty or hold exactly one element per position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubMeshAsset {
    /// A debug name.
    pub name: String,
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Vertex normals.
    pub normals: Vec<Vec3>,
    /// Tangents, `w` holding the bitangent sign.
    pub tangents: Vec<Vec4>,
    /// Vertex colors.
    pub colors: Vec<Vec4>,
    /// First UV channel.
    pub uv0: Vec<Vec2>,
    /// Second UV channel.
    pub uv1: Vec<Vec2>,
    /// Triangle list indices. Empty means "draw vertices in order".
    pub indices: Vec<u32>,
    /// Index of the material slot in the owning mesh.
    pub material_index: u32,
}

impl SubMeshAsset {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn streams(&self) -> [(ShaderSemantic, u32, &[u8]); 6] {
        use ShaderSemanticAttribute as A;
        [
            (ShaderSemantic::new(A::Position, 0), 12, bytemuck::cast_slice(&self.positions)),
            (ShaderSemantic::new(A::Normal, 0), 12, bytemuck::cast_slice(&self.normals)),
            (ShaderSemantic::new(A::Tangent, 0), 16, bytemuck::cast_slice(&self.tangents)),
            (ShaderSemantic::new(A::Color, 0), 16, bytemuck::cast_slice(&self.colors)),
            (ShaderSemantic::new(A::Uv, 0), 8, bytemuck::cast_slice(&self.uv0)),
            (ShaderSemantic::new(A::Uv, 1), 8, bytemuck::cast_slice(&self.uv1)),
        ]
    }
}

/// CPU-side geometry of one level of detail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelLodAsset {
    /// A debug name.
    pub name: String,
    /// The sub-meshes, in material-slot order.
    pub sub_meshes: Vec<SubMeshAsset>,
}

impl Asset for ModelLodAsset {}

/// Where one vertex stream of a sub-mesh lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferInfo {
    /// What the stream holds.
    pub semantic: ShaderSemantic,
    /// Index into [`ModelLod::buffers`].
    pub buffer_index: usize,
    /// Offset of the sub-mesh's first element.
    pub byte_offset: u32,
    /// Size of the sub-mesh's elements.
    pub byte_count: u32,
    /// Size of one element.
    pub stride: u32,
}

/// An uploaded sub-mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    /// A debug name.
    pub name: String,
    /// Vertex streams present for this sub-mesh.
    pub vertex_buffer_infos: Vec<VertexBufferInfo>,
    /// The sub-mesh's indices.
    pub index_buffer_view: IndexBufferView,
    /// Arguments for drawing the whole sub-mesh.
    pub draw_arguments: DrawIndexed,
    /// Index of the material slot in the owning mesh.
    pub material_index: u32,
}

/// An uploaded, immutable level of detail.
///
/// All sub-meshes share one device buffer per vertex stream plus one index
/// buffer; each sub-mesh addresses its range by offset.
#[derive(Debug)]
pub struct ModelLod {
    name: String,
    buffers: Vec<BufferId>,
    sub_meshes: Vec<SubMesh>,
}

impl Asset for ModelLod {}

struct StreamBuilder {
    semantic: ShaderSemantic,
    stride: u32,
    data: Vec<u8>,
    ranges: Vec<Option<(u32, u32)>>,
}

impl ModelLod {
    /// Uploads `asset` into device buffers.
    ///
    /// Streams whose length does not match the vertex count are dropped for
    /// that sub-mesh with a warning. Sub-meshes without indices get a
    /// sequential index list.
    ///
    /// ## Errors
    /// * `ResourceError` - If a buffer cannot be created. Buffers created so
    ///   far are destroyed.
    pub fn upload(asset: &ModelLodAsset, device: &dyn GraphicsDevice) -> Result<Self, ResourceError> {
        let mut streams: Vec<StreamBuilder> = Vec::new();
        for sub_mesh in &asset.sub_meshes {
            let vertex_count = sub_mesh.vertex_count();
            for (slot, (semantic, stride, bytes)) in sub_mesh.streams().into_iter().enumerate() {
                if streams.len() <= slot {
                    streams.push(StreamBuilder {
                        semantic,
                        stride,
                        data: Vec::new(),
                        ranges: Vec::new(),
                    });
                }
                let stream = &mut streams[slot];
                let element_count = bytes.len() / stride as usize;
                if bytes.is_empty() {
                    stream.ranges.push(None);
                } else if element_count != vertex_count {
                    log::warn!(
                        "Sub-mesh '{}' has {element_count} {semantic} elements for {vertex_count} vertices, dropping the stream",
                        sub_mesh.name
                    );
                    stream.ranges.push(None);
                } else {
                    let offset = stream.data.len() as u32;
                    stream.data.extend_from_slice(bytes);
                    stream.ranges.push(Some((offset, bytes.len() as u32)));
                }
            }
        }

        let mut index_data: Vec<u32> = Vec::new();
        let mut index_ranges = Vec::with_capacity(asset.sub_meshes.len());
        for sub_mesh in &asset.sub_meshes {
            let first = index_data.len();
            if sub_mesh.indices.is_empty() {
                index_data.extend(0..sub_mesh.vertex_count() as u32);
            } else {
                index_data.extend_from_slice(&sub_mesh.indices);
            }
            index_ranges.push((first, index_data.len() - first));
        }

        let mut buffers = Vec::new();
        let result = Self::create_buffers(asset, device, &streams, &index_data, &mut buffers);
        let (stream_buffers, index_buffer) = match result {
            Ok(ids) => ids,
            Err(err) => {
                for id in buffers {
                    if let Err(destroy_err) = device.destroy_buffer(id) {
                        log::error!("Failed to destroy buffer {id:?}: {destroy_err}");
                    }
                }
                return Err(err);
            }
        };

        let sub_meshes = asset
            .sub_meshes
            .iter()
            .enumerate()
            .map(|(i, sub_mesh)| {
                let vertex_buffer_infos = streams
                    .iter()
                    .zip(&stream_buffers)
                    .filter_map(|(stream, buffer_index)| {
                        let (byte_offset, byte_count) = stream.ranges[i]?;
                        Some(VertexBufferInfo {
                            semantic: stream.semantic,
                            buffer_index: (*buffer_index)?,
                            byte_offset,
                            byte_count,
                            stride: stream.stride,
                        })
                    })
                    .collect();
                let (first, count) = index_ranges[i];
                SubMesh {
                    name: sub_mesh.name.clone(),
                    vertex_buffer_infos,
                    index_buffer_view: IndexBufferView {
                        buffer: index_buffer,
                        byte_offset: (first * 4) as u32,
                        byte_count: (count * 4) as u32,
                        format: IndexFormat::Uint32,
                    },
                    draw_arguments: DrawIndexed::new(count as u32),
                    material_index: sub_mesh.material_index,
                }
            })
            .collect();

        log::debug!(
            "Uploaded LOD '{}' ({} sub-meshes, {} buffers)",
            asset.name,
            asset.sub_meshes.len(),
            buffers.len()
        );
        Ok(Self {
            name: asset.name.clone(),
            buffers,
            sub_meshes,
        })
    }

    fn create_buffers(
        asset: &ModelLodAsset,
        device: &dyn GraphicsDevice,
        streams: &[StreamBuilder],
        index_data: &[u32],
        buffers: &mut Vec<BufferId>,
    ) -> Result<(Vec<Option<usize>>, BufferId), ResourceError> {
        let mut stream_buffers = Vec::with_capacity(streams.len());
        for stream in streams {
            if stream.data.is_empty() {
                stream_buffers.push(None);
                continue;
            }
            let id = device.create_buffer_with_data(
                &BufferDescriptor {
                    label: Some(Cow::Owned(format!("{}/{}", asset.name, stream.semantic))),
                    size: stream.data.len() as u64,
                    usage: BufferUsage::Vertex,
                },
                &stream.data,
            )?;
            stream_buffers.push(Some(buffers.len()));
            buffers.push(id);
        }

        let index_bytes: &[u8] = bytemuck::cast_slice(index_data);
        let index_buffer = device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some(Cow::Owned(format!("{}/indices", asset.name))),
                size: index_bytes.len() as u64,
                usage: BufferUsage::Index,
            },
            index_bytes,
        )?;
        buffers.push(index_buffer);
        Ok((stream_buffers, index_buffer))
    }

    /// The debug name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The device buffers backing this LOD.
    pub fn buffers(&self) -> &[BufferId] {
        &self.buffers
    }

    /// The uploaded sub-meshes.
    pub fn sub_meshes(&self) -> &[SubMesh] {
        &self.sub_meshes
    }

    /// The sub-mesh at `index`.
    pub fn sub_mesh(&self, index: usize) -> Option<&SubMesh> {
        self.sub_meshes.get(index)
    }

    /// The buffer view described by `info`.
    pub fn vertex_buffer_view(&self, info: &VertexBufferInfo) -> Option<BufferView> {
        self.buffers.get(info.buffer_index).map(|buffer| BufferView {
            buffer: *buffer,
            byte_offset: info.byte_offset,
            byte_count: info.byte_count,
            stride: info.stride,
        })
    }

    /// Destroys the device buffers.
    pub fn release(&self, device: &dyn GraphicsDevice) {
        for id in &self.buffers {
            if let Err(err) = device.destroy_buffer(*id) {
                log::error!("Failed to destroy buffer {id:?} of LOD '{}': {err}", self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_core::testing::RecordingDevice;

    fn triangle(name: &str, material_index: u32) -> SubMeshAsset {
        SubMeshAsset {
            name: name.to_string(),
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 3],
            uv0: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            indices: vec![0, 1, 2],
            material_index,
            ..Default::default()
        }
    }

    #[test]
    fn test_upload_shares_stream_buffers_across_sub_meshes() {
        let device = RecordingDevice::new();
        let asset = ModelLodAsset {
            name: "pair".into(),
            sub_meshes: vec![triangle("a", 0), triangle("b", 1)],
        };

        let lod = ModelLod::upload(&asset, &device).unwrap();

        // position, normal, uv0, indices
        assert_eq!(lod.buffers().len(), 4);
        let second = lod.sub_mesh(1).unwrap();
        assert_eq!(second.vertex_buffer_infos.len(), 3);
        assert_eq!(second.vertex_buffer_infos[0].byte_offset, 36);
        assert_eq!(second.index_buffer_view.byte_offset, 12);
        assert_eq!(second.draw_arguments.index_count, 3);
        assert_eq!(second.material_index, 1);
    }

    #[test]
    fn test_mismatched_stream_is_dropped_and_missing_indices_are_generated() {
        let device = RecordingDevice::new();
        let mut sub_mesh = triangle("broken", 0);
        sub_mesh.normals.pop();
        sub_mesh.indices.clear();
        let asset = ModelLodAsset {
            name: "broken".into(),
            sub_meshes: vec![sub_mesh],
        };

        let lod = ModelLod::upload(&asset, &device).unwrap();
        let uploaded = lod.sub_mesh(0).unwrap();

        assert!(uploaded
            .vertex_buffer_infos
            .iter()
            .all(|info| info.semantic.attribute != ShaderSemanticAttribute::Normal));
        assert_eq!(uploaded.draw_arguments.index_count, 3);
        let index_bytes = device.buffer_data(uploaded.index_buffer_view.buffer).unwrap();
        let indices: [u32; 3] = bytemuck::pod_read_unaligned(&index_bytes);
        assert_eq!(indices, [0, 1, 2]);
    }

    #[test]
    fn test_release_destroys_every_buffer() {
        let device = RecordingDevice::new();
        let asset = ModelLodAsset {
            name: "one".into(),
            sub_meshes: vec![triangle("a", 0)],
        };
        let lod = ModelLod::upload(&asset, &device).unwrap();
        assert_eq!(device.buffer_count(), 4);

        lod.release(&device);
        assert_eq!(device.buffer_count(), 0);
    }
}
