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

//! Draw items, draw packets and the draw-list tags that route them to passes.

use super::resource::{BufferView, IndexBufferView, ResourceGroupId};
use super::settings::RenderSettings;
use super::shader::ShaderVariantId;
use std::borrow::Cow;

/// Identifies the rendering pass a draw item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawListTag(pub u32);

impl DrawListTag {
    /// The tag that names no draw list.
    pub const INVALID: Self = Self(u32::MAX);
    /// Maximum number of distinct draw lists a registry hands out.
    pub const MAX_COUNT: usize = 64;

    /// Whether the tag names a draw list.
    #[inline]
    pub const fn is_valid(self) -> bool {
        (self.0 as usize) < Self::MAX_COUNT
    }
}

impl Default for DrawListTag {
    fn default() -> Self {
        Self::INVALID
    }
}

/// The draw lists every scene provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinDrawListTag {
    /// Opaque geometry.
    Opaque,
    /// Alpha-blended geometry.
    Transparent,
    /// Shadow map casters.
    Shadow,
    /// Depth pre-pass.
    Depth,
}

impl BuiltinDrawListTag {
    /// All builtin tags, in registration order.
    pub const ALL: [BuiltinDrawListTag; 4] = [
        BuiltinDrawListTag::Opaque,
        BuiltinDrawListTag::Transparent,
        BuiltinDrawListTag::Shadow,
        BuiltinDrawListTag::Depth,
    ];
}

/// Assigns dense [`DrawListTag`]s to draw-list names.
///
/// Scenes own one registry and use it to answer
/// [`RenderScene::builtin_draw_list_tag`](crate::renderer::RenderScene::builtin_draw_list_tag).
#[derive(Debug, Clone, Default)]
pub struct DrawListTagRegistry {
    names: Vec<String>,
    builtins: [Option<DrawListTag>; 4],
}

impl DrawListTagRegistry {
    /// Creates a registry with the builtin draw lists named by `settings`.
    pub fn with_builtins(settings: &RenderSettings) -> Self {
        let mut registry = Self::default();
        for (slot, builtin) in BuiltinDrawListTag::ALL.iter().enumerate() {
            let tag = registry.acquire_tag(settings.tag_name(*builtin));
            registry.builtins[slot] = Some(tag);
        }
        registry
    }

    /// Returns the tag for `name`, registering it if needed.
    ///
    /// Returns [`DrawListTag::INVALID`] when the registry is full.
    pub fn acquire_tag(&mut self, name: &str) -> DrawListTag {
        let existing = self.find_tag(name);
        if existing.is_valid() {
            return existing;
        }
        if self.names.len() >= DrawListTag::MAX_COUNT {
            log::warn!("Draw-list registry is full, cannot register '{name}'");
            return DrawListTag::INVALID;
        }
        self.names.push(name.to_string());
        DrawListTag((self.names.len() - 1) as u32)
    }

    /// Returns the tag registered for `name`, or [`DrawListTag::INVALID`].
    pub fn find_tag(&self, name: &str) -> DrawListTag {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| DrawListTag(i as u32))
            .unwrap_or(DrawListTag::INVALID)
    }

    /// Returns the tag of a builtin draw list, or [`DrawListTag::INVALID`]
    /// if the registry was not created with builtins.
    pub fn builtin(&self, tag: BuiltinDrawListTag) -> DrawListTag {
        let slot = BuiltinDrawListTag::ALL
            .iter()
            .position(|b| *b == tag)
            .unwrap_or_default();
        self.builtins[slot].unwrap_or(DrawListTag::INVALID)
    }

    /// The name a tag was registered under.
    pub fn name(&self, tag: DrawListTag) -> Option<&str> {
        self.names.get(tag.0 as usize).map(String::as_str)
    }

    /// The number of registered draw lists.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no draw list has been registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A mask selecting which views a draw item is submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawFilterMask(pub u32);

impl DrawFilterMask {
    /// Submitted to every view.
    pub const ALL: Self = Self(u32::MAX);
}

/// The multisample configuration a pipeline state is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultisampleState {
    /// Number of samples per pixel.
    pub sample_count: u32,
    /// Bitmask of the samples that are written.
    pub sample_mask: u32,
}

impl Default for MultisampleState {
    fn default() -> Self {
        Self {
            sample_count: 1,
            sample_mask: u32::MAX,
        }
    }
}

/// An opaque handle to a compiled pipeline state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineStateId(pub usize);

/// The inputs a device needs to compile a pipeline state for a shader variant.
#[derive(Debug, Clone)]
pub struct PipelineStateDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The compiled variant.
    pub variant: ShaderVariantId,
    /// The pass the pipeline renders into.
    pub draw_list_tag: DrawListTag,
    /// The pass' multisample configuration.
    pub multisample: MultisampleState,
}

/// Arguments of an indexed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DrawIndexed {
    /// Number of indices to draw.
    pub index_count: u32,
    /// Number of instances to draw.
    pub instance_count: u32,
    /// First index in the index buffer view.
    pub first_index: u32,
    /// Value added to each index before fetching vertices.
    pub base_vertex: i32,
}

impl DrawIndexed {
    /// A single-instance draw of `index_count` indices.
    pub const fn new(index_count: u32) -> Self {
        Self {
            index_count,
            instance_count: 1,
            first_index: 0,
            base_vertex: 0,
        }
    }
}

/// One executable draw in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    /// The pass the item is routed to.
    pub draw_list_tag: DrawListTag,
    /// Views the item is submitted to.
    pub draw_filter_mask: DrawFilterMask,
    /// Stencil reference value.
    pub stencil_ref: u8,
    /// The compiled pipeline state.
    pub pipeline_state: PipelineStateId,
    /// Resource groups bound for this item only (per-draw, then material).
    pub unique_resource_groups: Vec<ResourceGroupId>,
    /// Vertex streams, in shader vertex-input order.
    pub vertex_buffer_views: Vec<BufferView>,
    /// The index buffer.
    pub index_buffer_view: IndexBufferView,
}

/// An identifier the device assigns to each built packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawPacketId(pub u64);

/// The collected inputs the device turns into a [`DrawPacket`].
#[derive(Debug, Clone, Default)]
pub struct DrawPacketRequest {
    /// A debug name, usually the model and sub-mesh.
    pub debug_name: String,
    /// Draw arguments shared by all items.
    pub draw_arguments: DrawIndexed,
    /// Resource groups shared by all items (the object group).
    pub resource_groups: Vec<ResourceGroupId>,
    /// The items, in shader-collection order.
    pub items: Vec<DrawItem>,
}

/// The immutable, submission-ready bundle of draw items for one sub-mesh.
#[derive(Debug, Clone)]
pub struct DrawPacket {
    id: DrawPacketId,
    debug_name: String,
    draw_arguments: DrawIndexed,
    resource_groups: Vec<ResourceGroupId>,
    items: Vec<DrawItem>,
}

impl DrawPacket {
    /// Seals a request. Called by device implementations.
    pub fn from_request(id: DrawPacketId, request: DrawPacketRequest) -> Self {
        Self {
            id,
            debug_name: request.debug_name,
            draw_arguments: request.draw_arguments,
            resource_groups: request.resource_groups,
            items: request.items,
        }
    }

    /// The packet id.
    pub fn id(&self) -> DrawPacketId {
        self.id
    }

    /// The debug name.
    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    /// Draw arguments shared by all items.
    pub fn draw_arguments(&self) -> DrawIndexed {
        self.draw_arguments
    }

    /// Resource groups shared by all items.
    pub fn resource_groups(&self) -> &[ResourceGroupId] {
        &self.resource_groups
    }

    /// The draw items.
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    /// The number of draw items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// The full, ordered list of resource groups bound for item `index`:
    /// packet groups first, then the item's own.
    pub fn item_resource_groups(&self, index: usize) -> Vec<ResourceGroupId> {
        let mut groups = self.resource_groups.clone();
        if let Some(item) = self.items.get(index) {
            groups.extend_from_slice(&item.unique_resource_groups);
        }
        groups
    }

    /// Items routed to the given draw list.
    pub fn items_for(&self, tag: DrawListTag) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(move |item| item.draw_list_tag == tag)
    }
}
