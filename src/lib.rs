//! Content-adaptive neural audio super-resolution core.
/// Application directory helpers.
pub mod app_dirs;
/// PCM container I/O and signal utilities.
pub mod audio;
/// Content classification.
pub mod classify;
/// Time/frequency transform engine.
pub mod dsp;
/// Segmented neural inference.
pub mod enhance;
/// Logging setup.
pub mod logging;
/// Inference models, persistence and registry.
pub mod model;
/// Upscale request orchestration.
pub mod pipeline;
