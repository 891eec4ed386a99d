//! Opaque inference models, their persistence and the process-scoped
//! registry.
//!
//! Model selection is a closed category enum mapped to trait objects; the
//! network topology behind each category is an implementation detail of
//! the variant, not a class hierarchy.

pub mod classifier;
pub mod enhancer;
pub mod registry;
pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use classifier::ClassifierMlp;
pub use enhancer::EnhancerNet;
pub use registry::ModelRegistry;
pub use store::ModelStore;

/// Content categories a specialized model can exist for. `General` is the
/// fallback used when classification is unavailable or uncertain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Voice,
    Music,
    Ambient,
    General,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Voice,
        Category::Music,
        Category::Ambient,
        Category::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Voice => "voice",
            Category::Music => "music",
            Category::Ambient => "ambient",
            Category::General => "general",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "voice" => Some(Category::Voice),
            "music" => Some(Category::Music),
            "ambient" => Some(Category::Ambient),
            "general" => Some(Category::General),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model file {path} could not be read: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Model file {path} could not be written: {source}")]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Model file {path} is not valid JSON: {source}")]
    Parse {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },
    #[error("Model {name} failed validation: {message}")]
    Invalid { name: String, message: String },
    #[error("No loadable or constructible model for category {category}")]
    Unavailable { category: String },
    #[error("Inference failed: {message}")]
    Inference { message: String },
    #[error("Model output length {got} does not match segment length {expected}")]
    OutputShape { got: usize, expected: usize },
}

/// An opaque callable mapping a fixed-length segment to an equal-length
/// enhanced segment. Implementations must be immutable while serving;
/// replacement goes through the registry's swap.
pub trait SegmentModel: Send + Sync {
    /// Nominal input/output length in samples.
    fn segment_len(&self) -> usize;

    /// Run one segment through the network. The input slice length always
    /// equals `segment_len`; the output must too, or the caller rejects it.
    fn infer(&self, segment: &[f32]) -> Result<Vec<f32>, ModelError>;
}
