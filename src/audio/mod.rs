//! PCM container I/O and sample-domain utilities.
//!
//! The core's native format is uncompressed PCM: WAV for read and write,
//! AIFF for read. Lossy codecs are an external transcoder's job; anything
//! else surfaces as an unsupported-format error.

mod decode;
pub mod error;
pub mod signal;
pub mod wav;

use std::path::Path;

pub use error::AudioError;
pub use signal::{
    ChannelPolicy, Signal, normalize_peak_in_place, resample_linear, sanitize_samples_in_place,
};
pub use wav::{WavEncoding, read_wav, write_wav};

/// Decode a supported PCM container by extension.
pub fn read_pcm(path: &Path) -> Result<Signal, AudioError> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("wav") => wav::read_wav(path),
        Some("aiff" | "aif") => decode::decode_aiff(path),
        other => Err(AudioError::Unsupported {
            path: path.to_path_buf(),
            detail: match other {
                Some(ext) => format!(".{ext} (transcode to WAV or AIFF first)"),
                None => "missing file extension".to_string(),
            },
        }),
    }
}
