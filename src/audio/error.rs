use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Unsupported audio format for {path}: {detail}")]
    Unsupported { path: PathBuf, detail: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },
}
