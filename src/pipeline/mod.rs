//! Upscale request orchestration.
//!
//! One request walks `Idle -> Analyzing -> Preprocessing? -> Inferring ->
//! Postprocessing? -> Cleanup -> Done`, with `Failed` reachable from any
//! stage. The orchestrator is the only component that sees the whole
//! pipeline; everything below it is a pure function over buffers.
//! Temporary artifacts are scoped to the request and released on every
//! exit path; stages that consume a scratch artifact always run before
//! that release.

pub mod config;
pub mod error;
pub mod progress;

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

pub use config::EnhanceConfig;
pub use error::PipelineError;
pub use progress::ProgressReporter;

pub use crate::enhance::CancelToken;

use crate::audio::{
    ChannelPolicy, Signal, WavEncoding, normalize_peak_in_place, read_pcm,
    sanitize_samples_in_place, read_wav, write_wav,
};
use crate::classify::{ContentClassification, classify_features, extract_features};
use crate::dsp::{PhaseOptions, compute_spectrogram, reconstruct_phase, synthesize};
use crate::enhance::{CollectedPairs, TrainingSink, enhance_mono};
use crate::model::{Category, ModelRegistry};

/// Progress weights per stage, in percent.
const ANALYSIS_END: u8 = 10;
const PREPROCESS_END: u8 = 25;
const INFERENCE_END: u8 = 75;
const POSTPROCESS_END: u8 = 95;

const REFINE_FFT_SIZE: usize = 1024;
const REFINE_HOP_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Analyzing,
    Preprocessing,
    Inferring,
    Postprocessing,
    Cleanup,
    Done,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Idle => "idle",
            Stage::Analyzing => "analyzing",
            Stage::Preprocessing => "preprocessing",
            Stage::Inferring => "inferring",
            Stage::Postprocessing => "postprocessing",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
            Stage::Failed => "failed",
        })
    }
}

/// What an upscale produced, alongside the enhanced audio itself.
#[derive(Debug)]
pub struct UpscaleOutcome {
    pub request_id: Uuid,
    pub classification: ContentClassification,
    pub category_used: Category,
    /// Training candidates captured when `training_mode` is on: the exact
    /// segment tensors that crossed the model boundary.
    pub training_pairs: Vec<(Vec<f32>, Vec<f32>)>,
}

pub struct Orchestrator {
    registry: Arc<ModelRegistry>,
}

impl Orchestrator {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Upscale an audio file into `output` (16-bit WAV).
    pub fn upscale_file(
        &self,
        input: &Path,
        output: &Path,
        config: &EnhanceConfig,
        progress_sink: impl FnMut(u8),
        cancel: &CancelToken,
    ) -> Result<UpscaleOutcome, PipelineError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("upscale", request = %request_id);
        let _guard = span.enter();
        let mut reporter = ProgressReporter::new(progress_sink);
        let result = self.run_file(input, output, config, &mut reporter, cancel, request_id);
        match &result {
            Ok(outcome) => {
                tracing::info!(stage = %Stage::Done, category = %outcome.category_used, "upscale complete")
            }
            Err(err) => tracing::error!(stage = %Stage::Failed, "upscale failed: {err}"),
        }
        result
    }

    /// Upscale a decoded signal in memory. Used by the file path and
    /// directly by embedders that manage their own I/O.
    pub fn upscale_signal(
        &self,
        signal: &Signal,
        config: &EnhanceConfig,
        progress_sink: impl FnMut(u8),
        cancel: &CancelToken,
    ) -> Result<(Signal, UpscaleOutcome), PipelineError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("upscale", request = %request_id);
        let _guard = span.enter();
        let mut reporter = ProgressReporter::new(progress_sink);
        let result = self.run_stages(signal, config, &mut reporter, cancel, request_id, None);
        match &result {
            Ok((_, outcome)) => {
                reporter.finish();
                tracing::info!(stage = %Stage::Done, category = %outcome.category_used, "upscale complete")
            }
            Err(err) => tracing::error!(stage = %Stage::Failed, "upscale failed: {err}"),
        }
        result
    }

    fn run_file(
        &self,
        input: &Path,
        output: &Path,
        config: &EnhanceConfig,
        reporter: &mut ProgressReporter<'_>,
        cancel: &CancelToken,
        request_id: Uuid,
    ) -> Result<UpscaleOutcome, PipelineError> {
        let signal = read_pcm(input).map_err(PipelineError::Input)?;
        // Request-scoped scratch space; the TempDir guard releases it on
        // every exit path, after every stage that reads from it.
        let scratch = tempfile::Builder::new()
            .prefix("audiolift-")
            .tempdir()
            .map_err(|source| PipelineError::Resource { source })?;
        let (enhanced, outcome) = self.run_stages(
            &signal,
            config,
            reporter,
            cancel,
            request_id,
            Some(scratch.path()),
        )?;

        write_wav(output, &enhanced, WavEncoding::Int16).map_err(PipelineError::Encode)?;
        reporter.report(POSTPROCESS_END);

        tracing::debug!(stage = %Stage::Cleanup, "releasing request scratch space");
        if let Err(err) = scratch.close() {
            tracing::warn!("scratch cleanup failed (ignored): {err}");
        }
        reporter.finish();
        Ok(outcome)
    }

    fn run_stages(
        &self,
        signal: &Signal,
        config: &EnhanceConfig,
        reporter: &mut ProgressReporter<'_>,
        cancel: &CancelToken,
        request_id: Uuid,
        scratch: Option<&Path>,
    ) -> Result<(Signal, UpscaleOutcome), PipelineError> {
        tracing::debug!(stage = %Stage::Analyzing, "classifying input content");
        reporter.report(0);
        let mono = signal.downmix_mono();
        let Some(features) = extract_features(&mono, signal.sample_rate) else {
            return Err(PipelineError::InputTooShort {
                frames: signal.frame_count(),
            });
        };
        let classifier = self
            .registry
            .classifier()
            .map_err(PipelineError::ModelUnavailable)?;
        let classification = classify_features(&features, &classifier);
        let category = config
            .forced_audio_type
            .unwrap_or_else(|| classification.dominant.category());
        tracing::info!(
            voice = classification.voice_confidence,
            music = classification.music_confidence,
            ambient = classification.ambient_confidence,
            dominant = classification.dominant.as_str(),
            %category,
            "analysis complete"
        );
        reporter.report(ANALYSIS_END);

        let mut buffers: Vec<Vec<f32>> = match config.channel_policy {
            ChannelPolicy::DownmixAverage => vec![mono],
            ChannelPolicy::PerChannel => (0..signal.channels.max(1) as usize)
                .map(|ch| signal.channel(ch))
                .collect(),
        };

        if config.use_preprocessing {
            tracing::debug!(stage = %Stage::Preprocessing, "normalizing input peaks");
            for buffer in &mut buffers {
                normalize_peak_in_place(buffer);
            }
        }
        reporter.report(PREPROCESS_END);

        tracing::debug!(stage = %Stage::Inferring, %category, "running segmented inference");
        let (category_used, model) = self
            .registry
            .select(category)
            .map_err(PipelineError::ModelUnavailable)?;
        let references = (config.use_postprocessing && config.preserve_quality)
            .then(|| buffers.clone());
        let mut pairs = CollectedPairs::default();
        let channel_count = buffers.len().max(1);
        let mut enhanced_buffers = Vec::with_capacity(buffers.len());
        for (idx, buffer) in buffers.iter().enumerate() {
            let sink: Option<&mut dyn TrainingSink> = if config.training_mode {
                Some(&mut pairs)
            } else {
                None
            };
            let enhanced = enhance_mono(
                buffer,
                model.as_ref(),
                |done, total| {
                    let fraction =
                        (idx as f32 + done as f32 / total.max(1) as f32) / channel_count as f32;
                    reporter.report_span(PREPROCESS_END, INFERENCE_END, fraction);
                },
                cancel,
                sink,
            )?;
            enhanced_buffers.push(enhanced);
        }
        reporter.report(INFERENCE_END);
        let mut enhanced = Signal::from_channels(&enhanced_buffers, signal.sample_rate);

        // Stash the raw inference result in the request scratch space so
        // postprocessing consumes the artifact before cleanup releases it.
        let intermediate = match scratch.filter(|_| config.use_postprocessing) {
            Some(dir) => {
                let path = dir.join("inferred.wav");
                write_wav(&path, &enhanced, WavEncoding::Float32)
                    .map_err(PipelineError::Encode)?;
                Some(path)
            }
            None => None,
        };

        if config.use_postprocessing {
            tracing::debug!(stage = %Stage::Postprocessing, preserve_quality = config.preserve_quality, "postprocessing");
            if let Some(path) = &intermediate {
                enhanced = read_wav(path).map_err(PipelineError::Input)?;
            }
            if config.preserve_quality {
                let originals = references.unwrap_or_else(|| enhanced_buffers.clone());
                let mut refined = Vec::with_capacity(enhanced_buffers.len());
                for (channel, reference) in enhanced_buffers.iter().zip(originals.iter()) {
                    refined.push(refine_phase(reference, channel)?);
                }
                enhanced = Signal::from_channels(&refined, signal.sample_rate);
            } else {
                sanitize_samples_in_place(&mut enhanced.samples);
            }
        }
        reporter.report_span(INFERENCE_END, POSTPROCESS_END, 1.0);

        Ok((
            enhanced,
            UpscaleOutcome {
                request_id,
                classification,
                category_used,
                training_pairs: pairs.pairs,
            },
        ))
    }
}

/// Griffin–Lim refinement of an enhanced channel, seeded with the phase
/// of the pre-inference reference channel.
fn refine_phase(reference: &[f32], enhanced: &[f32]) -> Result<Vec<f32>, PipelineError> {
    let target = compute_spectrogram(enhanced, REFINE_FFT_SIZE, REFINE_HOP_SIZE)
        .map_err(transform_error)?;
    if target.is_empty() {
        return Ok(enhanced.to_vec());
    }
    let reference_spec = compute_spectrogram(reference, REFINE_FFT_SIZE, REFINE_HOP_SIZE)
        .map_err(transform_error)?;
    let rebuilt = reconstruct_phase(&target, Some(&reference_spec), PhaseOptions::default())
        .map_err(transform_error)?;
    let mut out = synthesize(&rebuilt).map_err(transform_error)?;
    // Synthesis covers whole frames only; keep the enhanced tail beyond
    // the last frame so the channel length is preserved.
    if out.len() < enhanced.len() {
        out.extend_from_slice(&enhanced[out.len()..]);
    }
    out.truncate(enhanced.len());
    Ok(out)
}

fn transform_error(message: String) -> PipelineError {
    PipelineError::Transform { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_signal(len: usize) -> Signal {
        Signal::from_mono(
            (0..len)
                .map(|i| {
                    0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44_100.0).sin()
                })
                .collect(),
            44_100,
        )
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Arc::new(ModelRegistry::fresh()))
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_100() {
        let mut seen: Vec<u8> = Vec::new();
        let (enhanced, outcome) = orchestrator()
            .upscale_signal(
                &tone_signal(44_100),
                &EnhanceConfig::default(),
                |p| seen.push(p),
                &CancelToken::new(),
            )
            .unwrap();
        assert_eq!(enhanced.frame_count(), 44_100);
        assert!(outcome.training_pairs.is_empty());
        assert!(!seen.is_empty());
        for window in seen.windows(2) {
            assert!(window[1] > window[0]);
        }
        assert_eq!(*seen.last().unwrap(), 100);
    }

    #[test]
    fn sub_frame_input_is_an_input_error() {
        let err = orchestrator()
            .upscale_signal(
                &Signal::from_mono(vec![0.1_f32; 100], 44_100),
                &EnhanceConfig::default(),
                |_| {},
                &CancelToken::new(),
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::InputTooShort { .. }));
    }

    #[test]
    fn forced_category_overrides_classification() {
        let config = EnhanceConfig {
            forced_audio_type: Some(Category::Ambient),
            ..EnhanceConfig::default()
        };
        let (_, outcome) = orchestrator()
            .upscale_signal(&tone_signal(44_100), &config, |_| {}, &CancelToken::new())
            .unwrap();
        assert_eq!(outcome.category_used, Category::Ambient);
    }

    #[test]
    fn training_mode_collects_segment_pairs() {
        let config = EnhanceConfig {
            training_mode: true,
            ..EnhanceConfig::default()
        };
        let (_, outcome) = orchestrator()
            .upscale_signal(&tone_signal(44_100), &config, |_| {}, &CancelToken::new())
            .unwrap();
        assert_eq!(outcome.training_pairs.len(), 44_100usize.div_ceil(2048));
    }

    #[test]
    fn per_channel_policy_preserves_channel_count() {
        let stereo = Signal {
            samples: (0..88_200)
                .map(|i| ((i % 100) as f32 / 100.0) - 0.5)
                .collect(),
            sample_rate: 44_100,
            channels: 2,
        };
        let config = EnhanceConfig {
            channel_policy: ChannelPolicy::PerChannel,
            ..EnhanceConfig::default()
        };
        let (enhanced, _) = orchestrator()
            .upscale_signal(&stereo, &config, |_| {}, &CancelToken::new())
            .unwrap();
        assert_eq!(enhanced.channels, 2);
        assert_eq!(enhanced.frame_count(), 44_100);
    }

    #[test]
    fn cancelled_request_surfaces_cancellation() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = orchestrator()
            .upscale_signal(
                &tone_signal(44_100),
                &EnhanceConfig::default(),
                |_| {},
                &cancel,
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }

    #[test]
    fn all_zero_signal_flows_through_without_error() {
        let (enhanced, _) = orchestrator()
            .upscale_signal(
                &Signal::from_mono(vec![0.0_f32; 8192], 44_100),
                &EnhanceConfig::default(),
                |_| {},
                &CancelToken::new(),
            )
            .unwrap();
        assert_eq!(enhanced.frame_count(), 8192);
        assert!(enhanced.samples.iter().all(|&s| s.abs() < 1e-3));
    }
}
