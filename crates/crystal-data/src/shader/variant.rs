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

use crystal_core::renderer::{
    DrawListTag, GraphicsDevice, MultisampleState, PipelineError, PipelineStateDescriptor,
    PipelineStateId, ShaderError, ShaderReflection, ShaderVariantId,
};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::HashMap;

/// A compiled permutation of a shader pass.
#[derive(Debug)]
pub struct ShaderVariant {
    id: ShaderVariantId,
    name: String,
    reflection: ShaderReflection,
    pipelines: Mutex<HashMap<(DrawListTag, MultisampleState), PipelineStateId>>,
}

impl ShaderVariant {
    /// Creates a variant from its reflection data.
    pub fn new(id: ShaderVariantId, name: impl Into<String>, reflection: ShaderReflection) -> Self {
        Self {
            id,
            name: name.into(),
            reflection,
            pipelines: Mutex::new(HashMap::new()),
        }
    }

    /// The variant id.
    pub fn id(&self) -> ShaderVariantId {
        self.id
    }

    /// The variant name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reflection data of the variant.
    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    /// Returns the pipeline state for `tag` under `multisample`, compiling it
    /// through the device on first use.
    ///
    /// ## Errors
    /// * `PipelineError` - If the device fails to compile the pipeline; nothing is cached.
    pub fn pipeline(
        &self,
        device: &dyn GraphicsDevice,
        tag: DrawListTag,
        multisample: MultisampleState,
    ) -> Result<PipelineStateId, PipelineError> {
        let mut pipelines = self.pipelines.lock();
        if let Some(id) = pipelines.get(&(tag, multisample)) {
            return Ok(*id);
        }

        let id = device.create_pipeline_state(&PipelineStateDescriptor {
            label: Some(Cow::Borrowed(self.name.as_str())),
            variant: self.id,
            draw_list_tag: tag,
            multisample,
        })?;
        log::debug!(
            "Compiled pipeline {id:?} for variant '{}' ({tag:?}, {} samples)",
            self.name,
            multisample.sample_count
        );
        pipelines.insert((tag, multisample), id);
        Ok(id)
    }

    /// Number of cached pipeline states.
    pub fn cached_pipeline_count(&self) -> usize {
        self.pipelines.lock().len()
    }
}

/// A shader routed to one draw list, with its compiled variants.
#[derive(Debug)]
pub struct ShaderPass {
    name: String,
    draw_list_tag: DrawListTag,
    variants: Vec<ShaderVariant>,
    default_variant: usize,
}

impl ShaderPass {
    /// Creates a pass whose default variant is the first one.
    ///
    /// ## Errors
    /// * `ShaderError::NoVariants` - If `variants` is empty.
    pub fn new(
        name: impl Into<String>,
        draw_list_tag: DrawListTag,
        variants: Vec<ShaderVariant>,
    ) -> Result<Self, ShaderError> {
        Self::with_default_variant(name, draw_list_tag, variants, 0)
    }

    /// Creates a pass with an explicit default variant.
    ///
    /// ## Errors
    /// * `ShaderError::NoVariants` - If `variants` is empty.
    /// * `ShaderError::InvalidDefaultVariant` - If `default_variant` is out of range.
    pub fn with_default_variant(
        name: impl Into<String>,
        draw_list_tag: DrawListTag,
        variants: Vec<ShaderVariant>,
        default_variant: usize,
    ) -> Result<Self, ShaderError> {
        let name = name.into();
        if variants.is_empty() {
            return Err(ShaderError::NoVariants { pass: name });
        }
        if default_variant >= variants.len() {
            return Err(ShaderError::InvalidDefaultVariant {
                pass: name,
                index: default_variant,
            });
        }
        Ok(Self {
            name,
            draw_list_tag,
            variants,
            default_variant,
        })
    }

    /// The pass name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The draw list this pass renders into unless overridden.
    pub fn draw_list_tag(&self) -> DrawListTag {
        self.draw_list_tag
    }

    /// The variant used when no shader options are set.
    pub fn default_variant(&self) -> &ShaderVariant {
        &self.variants[self.default_variant]
    }

    /// All variants.
    pub fn variants(&self) -> &[ShaderVariant] {
        &self.variants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_core::testing::RecordingDevice;

    fn variant(id: usize) -> ShaderVariant {
        ShaderVariant::new(ShaderVariantId(id), format!("v{id}"), ShaderReflection::default())
    }

    #[test]
    fn test_pipeline_is_cached_per_multisample_state() {
        let device = RecordingDevice::new();
        let v = variant(1);
        let tag = DrawListTag(0);
        let msaa4 = MultisampleState {
            sample_count: 4,
            ..Default::default()
        };

        let a = v.pipeline(&device, tag, MultisampleState::default()).unwrap();
        let b = v.pipeline(&device, tag, MultisampleState::default()).unwrap();
        let c = v.pipeline(&device, tag, msaa4).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(device.pipeline_count(), 2);
        assert_eq!(device.pipeline_multisample(c), Some(msaa4));
    }

    #[test]
    fn test_failed_pipeline_is_not_cached() {
        let device = RecordingDevice::new();
        let v = variant(1);
        device.fail_pipelines(true);
        assert!(v
            .pipeline(&device, DrawListTag(0), MultisampleState::default())
            .is_err());
        assert_eq!(v.cached_pipeline_count(), 0);

        device.fail_pipelines(false);
        assert!(v
            .pipeline(&device, DrawListTag(0), MultisampleState::default())
            .is_ok());
        assert_eq!(v.cached_pipeline_count(), 1);
    }

    #[test]
    fn test_pass_rejects_empty_and_out_of_range_defaults() {
        assert!(matches!(
            ShaderPass::new("empty", DrawListTag(0), Vec::new()),
            Err(ShaderError::NoVariants { .. })
        ));
        assert!(matches!(
            ShaderPass::with_default_variant("p", DrawListTag(0), vec![variant(1)], 1),
            Err(ShaderError::InvalidDefaultVariant { index: 1, .. })
        ));
        let pass = ShaderPass::with_default_variant(
            "p",
            DrawListTag(0),
            vec![variant(1), variant(2)],
            1,
        )
        .unwrap();
        assert_eq!(pass.default_variant().id(), ShaderVariantId(2));
    }
}
