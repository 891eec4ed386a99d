//! Request-level error taxonomy.

use thiserror::Error;

use crate::audio::AudioError;
use crate::enhance::EnhanceError;
use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unreadable, corrupt or unsupported input; surfaced immediately with
    /// no partial output written.
    #[error("Input rejected: {0}")]
    Input(AudioError),
    /// Shorter than one analysis frame; nothing to transform.
    #[error("Input too short to analyze ({frames} frames)")]
    InputTooShort { frames: usize },
    /// No model could be resolved for any category, including the general
    /// fallback.
    #[error("No usable model: {0}")]
    ModelUnavailable(ModelError),
    /// A model invocation failed or returned a malformed shape; the whole
    /// request aborts.
    #[error("Inference failed: {0}")]
    Inference(ModelError),
    /// Request cancelled at a segment boundary.
    #[error("Request cancelled")]
    Cancelled,
    /// Temporary resource creation failed. Cleanup failures are logged
    /// instead, never surfaced.
    #[error("Failed to create temporary resources: {source}")]
    Resource { source: std::io::Error },
    /// Final output could not be encoded.
    #[error("Output encode failed: {0}")]
    Encode(AudioError),
    /// A transform stage rejected its input.
    #[error("Transform failed: {message}")]
    Transform { message: String },
}

impl From<EnhanceError> for PipelineError {
    fn from(err: EnhanceError) -> Self {
        match err {
            EnhanceError::Cancelled => PipelineError::Cancelled,
            EnhanceError::Model(model) => PipelineError::Inference(model),
        }
    }
}
