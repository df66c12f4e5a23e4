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

use super::ShaderPass;
use crystal_core::asset::{Asset, AssetUUID};
use crystal_core::renderer::DrawListTag;
use std::sync::Arc;

/// One entry of a shader collection.
#[derive(Debug, Clone)]
pub struct ShaderCollectionItem {
    pass: Arc<ShaderPass>,
    enabled: bool,
    draw_list_override: Option<DrawListTag>,
}

impl ShaderCollectionItem {
    /// An enabled entry rendering into the pass' own draw list.
    pub fn new(pass: Arc<ShaderPass>) -> Self {
        Self {
            pass,
            enabled: true,
            draw_list_override: None,
        }
    }

    /// Sets the enable flag.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Routes the entry to another draw list.
    pub fn with_draw_list_override(mut self, tag: DrawListTag) -> Self {
        self.draw_list_override = Some(tag);
        self
    }

    /// The referenced pass.
    pub fn pass(&self) -> &Arc<ShaderPass> {
        &self.pass
    }

    /// Whether the entry produces draw items.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The override, if one is set.
    pub fn draw_list_override(&self) -> Option<DrawListTag> {
        self.draw_list_override
    }

    /// The draw list the entry renders into: a valid override wins over the
    /// pass' own tag. May be [`DrawListTag::INVALID`].
    pub fn draw_list_tag(&self) -> DrawListTag {
        match self.draw_list_override {
            Some(tag) if tag.is_valid() => tag,
            _ => self.pass.draw_list_tag(),
        }
    }
}

/// The read-only, ordered list of passes a material renders with.
#[derive(Debug, Clone, Default)]
pub struct ShaderCollection {
    items: Vec<ShaderCollectionItem>,
}

impl ShaderCollection {
    /// Creates a collection from its entries, keeping their order.
    pub fn new(items: Vec<ShaderCollectionItem>) -> Self {
        Self { items }
    }

    /// Iterates the entries in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ShaderCollectionItem> {
        self.items.iter()
    }

    /// The entry at `index`.
    pub fn get(&self, index: usize) -> Option<&ShaderCollectionItem> {
        self.items.get(index)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection has no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a ShaderCollection {
    type Item = &'a ShaderCollectionItem;
    type IntoIter = std::slice::Iter<'a, ShaderCollectionItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A shader asset: a named collection of passes.
#[derive(Debug)]
pub struct Shader {
    name: String,
    uuid: AssetUUID,
    collection: ShaderCollection,
}

impl Asset for Shader {}

impl Shader {
    /// Creates a shader asset.
    pub fn new(name: impl Into<String>, collection: ShaderCollection) -> Self {
        Self {
            name: name.into(),
            uuid: AssetUUID::new(),
            collection,
        }
    }

    /// The shader name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The persistent asset id.
    pub fn uuid(&self) -> AssetUUID {
        self.uuid
    }

    /// The passes of the shader.
    pub fn collection(&self) -> &ShaderCollection {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::ShaderVariant;
    use crystal_core::renderer::{ShaderReflection, ShaderVariantId};

    fn pass(tag: DrawListTag) -> Arc<ShaderPass> {
        let variant = ShaderVariant::new(ShaderVariantId(1), "v", ShaderReflection::default());
        Arc::new(ShaderPass::new("p", tag, vec![variant]).unwrap())
    }

    #[test]
    fn test_override_wins_only_when_valid() {
        let item = ShaderCollectionItem::new(pass(DrawListTag(2)));
        assert_eq!(item.draw_list_tag(), DrawListTag(2));

        let routed = item.clone().with_draw_list_override(DrawListTag(5));
        assert_eq!(routed.draw_list_tag(), DrawListTag(5));

        let invalid = item.with_draw_list_override(DrawListTag::INVALID);
        assert_eq!(invalid.draw_list_tag(), DrawListTag(2));
    }

    #[test]
    fn test_collection_preserves_declaration_order() {
        let collection = ShaderCollection::new(vec![
            ShaderCollectionItem::new(pass(DrawListTag(1))),
            ShaderCollectionItem::new(pass(DrawListTag(0))).enabled(false),
        ]);
        let tags: Vec<_> = collection.iter().map(|i| i.draw_list_tag()).collect();
        assert_eq!(tags, vec![DrawListTag(1), DrawListTag(0)]);
        assert!(!collection.get(1).unwrap().is_enabled());
    }
}
