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

//! Renderer-wide settings for the mesh path.

use super::draw::BuiltinDrawListTag;
use serde::{Deserialize, Serialize};

/// How a mesh vertex stream is matched against a shader vertex input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SemanticMatching {
    /// Attribute and channel index must both match (`TEXCOORD1` only feeds `TEXCOORD1`).
    #[default]
    AttributeAndIndex,
    /// Only the attribute must match; the first stream of that attribute wins.
    AttributeOnly,
}

/// Settings consumed by the draw-packet compiler and the scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Name of the draw list for opaque geometry.
    pub opaque_tag: String,
    /// Name of the draw list for transparent geometry.
    pub transparent_tag: String,
    /// Name of the draw list for shadow casters.
    pub shadow_tag: String,
    /// Name of the draw list for the depth pre-pass.
    pub depth_tag: String,
    /// The stencil reference written into every compiled draw item.
    pub default_stencil_ref: u8,
    /// Vertex stream matching rule.
    pub semantic_matching: SemanticMatching,
}

impl RenderSettings {
    /// The configured draw-list name for a builtin tag.
    pub fn tag_name(&self, tag: BuiltinDrawListTag) -> &str {
        match tag {
            BuiltinDrawListTag::Opaque => &self.opaque_tag,
            BuiltinDrawListTag::Transparent => &self.transparent_tag,
            BuiltinDrawListTag::Shadow => &self.shadow_tag,
            BuiltinDrawListTag::Depth => &self.depth_tag,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            opaque_tag: "forward".to_string(),
            transparent_tag: "transparent".to_string(),
            shadow_tag: "shadow".to_string(),
            depth_tag: "depth".to_string(),
            default_stencil_ref: 0,
            semantic_matching: SemanticMatching::default(),
        }
    }
}
