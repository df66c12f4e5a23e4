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

use crate::renderer::api::{BuiltinDrawListTag, DrawListTag, MultisampleState, RenderSettings};

/// The rendering scene a draw packet is compiled against.
///
/// The scene decides which draw lists exist and how each pass is
/// multisampled; the compiler never picks sample counts or formats itself.
pub trait RenderScene {
    /// Resolves a builtin draw list to the scene's tag for it.
    fn builtin_draw_list_tag(&self, tag: BuiltinDrawListTag) -> DrawListTag;

    /// The multisample configuration of the pass behind `tag`.
    fn multisample_state(&self, tag: DrawListTag) -> MultisampleState;

    /// The renderer settings active for this scene.
    fn settings(&self) -> &RenderSettings;
}
