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

//! Loading and saving [`RenderSettings`] as RON.

use crystal_core::renderer::RenderSettings;

/// Parses render settings from RON text. Omitted fields keep their defaults.
pub fn load_render_settings(text: &str) -> Result<RenderSettings, ron::error::SpannedError> {
    let settings: RenderSettings = ron::from_str(text)?;
    log::debug!(
        "Loaded render settings (opaque list '{}', stencil ref {})",
        settings.opaque_tag,
        settings.default_stencil_ref
    );
    Ok(settings)
}

/// Serializes render settings to pretty RON.
pub fn save_render_settings(settings: &RenderSettings) -> Result<String, ron::Error> {
    let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
    ron::ser::to_string_pretty(settings, pretty_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_core::renderer::SemanticMatching;

    #[test]
    fn test_partial_settings_fall_back_to_defaults() {
        let settings = load_render_settings(
            r#"(
                opaque_tag: "gbuffer",
                default_stencil_ref: 3,
                semantic_matching: AttributeOnly,
            )"#,
        )
        .unwrap();

        assert_eq!(settings.opaque_tag, "gbuffer");
        assert_eq!(settings.transparent_tag, RenderSettings::default().transparent_tag);
        assert_eq!(settings.default_stencil_ref, 3);
        assert_eq!(settings.semantic_matching, SemanticMatching::AttributeOnly);
    }

    #[test]
    fn test_saved_settings_load_back() {
        let settings = RenderSettings {
            shadow_tag: "cascades".to_string(),
            ..Default::default()
        };
        let text = save_render_settings(&settings).unwrap();
        assert_eq!(load_render_settings(&text).unwrap(), settings);
    }

    #[test]
    fn test_malformed_settings_are_rejected() {
        assert!(load_render_settings("(opaque_tag: 12)").is_err());
    }
}
