//! Per-request pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::audio::ChannelPolicy;
use crate::model::Category;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Run the preprocessing stage (peak normalization) before inference.
    pub use_preprocessing: bool,
    /// Run the postprocessing stage after inference.
    pub use_postprocessing: bool,
    /// Collect (input, output) segment pairs for the training collaborator.
    pub training_mode: bool,
    /// Refine the enhanced signal's phase during postprocessing.
    pub preserve_quality: bool,
    /// Skip model selection by classification and force a category.
    pub forced_audio_type: Option<Category>,
    /// How multi-channel input reaches the mono inference path.
    pub channel_policy: ChannelPolicy,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            use_preprocessing: false,
            use_postprocessing: false,
            training_mode: false,
            preserve_quality: false,
            forced_audio_type: None,
            channel_policy: ChannelPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_deserializes_with_partial_fields() {
        let config: EnhanceConfig =
            serde_json::from_str(r#"{"use_preprocessing": true, "forced_audio_type": "music"}"#)
                .unwrap();
        assert!(config.use_preprocessing);
        assert_eq!(config.forced_audio_type, Some(Category::Music));
        assert!(!config.training_mode);
    }
}
