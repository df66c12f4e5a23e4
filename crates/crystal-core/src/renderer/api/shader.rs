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

//! Shader reflection data consumed by the draw-packet compiler.
//!
//! Only the parts of reflection the mesh path needs are modelled: the ordered
//! vertex-input semantics a variant declares, and which resource-group layouts
//! it binds.

use super::resource::{ResourceGroupLayout, SrgType};
use super::settings::SemanticMatching;
use crate::renderer::error::ShaderError;
use std::fmt;
use std::str::FromStr;

/// An opaque identifier for a compiled shader variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderVariantId(pub usize);

/// The attribute part of a vertex-input semantic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderSemanticAttribute {
    /// `POSITION`
    Position,
    /// `NORMAL`
    Normal,
    /// `TANGENT`
    Tangent,
    /// `BITANGENT`
    Bitangent,
    /// `COLOR`
    Color,
    /// `TEXCOORD`, the UV channels.
    Uv,
}

impl ShaderSemanticAttribute {
    const ALL: [(&'static str, ShaderSemanticAttribute); 6] = [
        ("POSITION", ShaderSemanticAttribute::Position),
        ("NORMAL", ShaderSemanticAttribute::Normal),
        ("TANGENT", ShaderSemanticAttribute::Tangent),
        ("BITANGENT", ShaderSemanticAttribute::Bitangent),
        ("COLOR", ShaderSemanticAttribute::Color),
        ("TEXCOORD", ShaderSemanticAttribute::Uv),
    ];

    /// The upper-case name used in shader source.
    pub fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(_, attribute)| *attribute == self)
            .map(|(name, _)| *name)
            .unwrap_or("UNKNOWN")
    }
}

/// A vertex-input semantic: an attribute and its channel index.
///
/// `TEXCOORD1` is `{ attribute: Uv, index: 1 }`; a semantic without a trailing
/// number has index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderSemantic {
    /// The attribute kind.
    pub attribute: ShaderSemanticAttribute,
    /// The channel index.
    pub index: u32,
}

impl ShaderSemantic {
    /// Creates a semantic.
    pub const fn new(attribute: ShaderSemanticAttribute, index: u32) -> Self {
        Self { attribute, index }
    }

    /// Parses a semantic name such as `POSITION`, `TEXCOORD1` or `color0`.
    ///
    /// ## Errors
    /// * `ShaderError::InvalidSemantic` - If the attribute is unknown or the
    ///   trailing index is not a number.
    pub fn parse(name: &str) -> Result<Self, ShaderError> {
        let invalid = || ShaderError::InvalidSemantic {
            name: name.to_string(),
        };
        let upper = name.trim().to_ascii_uppercase();
        let split = upper
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(upper.len());
        let (attribute_name, index_str) = upper.split_at(split);

        let attribute = ShaderSemanticAttribute::ALL
            .iter()
            .find(|(candidate, _)| *candidate == attribute_name)
            .map(|(_, attribute)| *attribute)
            .ok_or_else(invalid)?;
        let index = if index_str.is_empty() {
            0
        } else {
            index_str.parse::<u32>().map_err(|_| invalid())?
        };

        Ok(Self { attribute, index })
    }

    /// Whether a mesh stream tagged `self` can feed a shader input declaring `input`.
    pub fn matches(&self, input: &ShaderSemantic, mode: SemanticMatching) -> bool {
        match mode {
            SemanticMatching::AttributeAndIndex => self == input,
            SemanticMatching::AttributeOnly => self.attribute == input.attribute,
        }
    }
}

impl FromStr for ShaderSemantic {
    type Err = ShaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ShaderSemantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.attribute.name(), self.index)
    }
}

/// Reflection data of one compiled shader variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderReflection {
    /// Vertex-input semantic names, in declaration order.
    pub vertex_inputs: Vec<String>,
    /// The resource-group layouts the variant binds.
    pub resource_groups: Vec<ResourceGroupLayout>,
}

impl ShaderReflection {
    /// Returns the layout bound at the given frequency, if any.
    pub fn layout(&self, srg_type: SrgType) -> Option<&ResourceGroupLayout> {
        self.resource_groups
            .iter()
            .find(|layout| layout.srg_type == srg_type)
    }

    /// Whether the variant binds a resource group at the given frequency.
    pub fn has_resource_group(&self, srg_type: SrgType) -> bool {
        self.layout(srg_type).is_some()
    }

    /// Parses every declared vertex input, in declaration order.
    pub fn vertex_input_semantics(
        &self,
    ) -> impl Iterator<Item = Result<ShaderSemantic, ShaderError>> + '_ {
        self.vertex_inputs
            .iter()
            .map(|name| ShaderSemantic::parse(name))
    }
}
