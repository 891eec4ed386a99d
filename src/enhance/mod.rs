//! Segmented neural inference with overlap-add stitching.
//!
//! The mono signal is cut into overlapping fixed-length segments, each
//! segment runs through the selected model, and outputs are stitched with
//! a Hann window and squared-window normalization so segment boundaries
//! stay seamless. A failed segment aborts the whole signal; there is no
//! degrade-and-continue path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::dsp::hann_window;
use crate::model::{ModelError, SegmentModel};

/// Floor applied to accumulated window energy during stitching.
const ENERGY_FLOOR: f32 = 1e-8;

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("Enhancement cancelled")]
    Cancelled,
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Cooperative cancellation flag, checked at segment boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Receives the exact tensors that crossed the model boundary, as
/// training candidates for an external fine-tuning collaborator.
pub trait TrainingSink {
    fn submit(&mut self, input: &[f32], output: &[f32]);
}

/// In-memory sink collecting (input, output) segment pairs.
#[derive(Debug, Default)]
pub struct CollectedPairs {
    pub pairs: Vec<(Vec<f32>, Vec<f32>)>,
}

impl TrainingSink for CollectedPairs {
    fn submit(&mut self, input: &[f32], output: &[f32]) {
        self.pairs.push((input.to_vec(), output.to_vec()));
    }
}

/// Run `mono` through `model` segment by segment and stitch the result.
///
/// The output has exactly the input's length: the zero-padded tail of the
/// final segment is truncated away after inference. `progress` receives
/// (segments done, segments total) after every segment.
pub fn enhance_mono(
    mono: &[f32],
    model: &dyn SegmentModel,
    mut progress: impl FnMut(usize, usize),
    cancel: &CancelToken,
    mut training: Option<&mut dyn TrainingSink>,
) -> Result<Vec<f32>, EnhanceError> {
    if mono.is_empty() {
        return Ok(Vec::new());
    }
    let segment_len = model.segment_len().max(2);
    let hop = (segment_len / 2).max(1);
    let window = hann_window(segment_len);
    let total = mono.len().div_ceil(hop);

    let mut output = vec![0.0_f32; mono.len()];
    let mut energy = vec![0.0_f32; mono.len()];
    let mut padded = vec![0.0_f32; segment_len];
    let mut done = 0usize;
    let mut start = 0usize;
    while start < mono.len() {
        if cancel.is_cancelled() {
            tracing::info!("cancellation observed at segment boundary {done}/{total}");
            return Err(EnhanceError::Cancelled);
        }
        let end = (start + segment_len).min(mono.len());
        let original_len = end - start;
        padded[..original_len].copy_from_slice(&mono[start..end]);
        padded[original_len..].fill(0.0);

        let enhanced = model.infer(&padded)?;
        if enhanced.len() != segment_len {
            return Err(EnhanceError::Model(ModelError::OutputShape {
                got: enhanced.len(),
                expected: segment_len,
            }));
        }
        if let Some(sink) = training.as_deref_mut() {
            sink.submit(&padded, &enhanced);
        }

        for i in 0..original_len {
            let w = window[i];
            output[start + i] += enhanced[i] * w;
            energy[start + i] += w * w;
        }

        done += 1;
        progress(done, total);
        start += hop;
    }

    for (sample, &e) in output.iter_mut().zip(energy.iter()) {
        *sample /= e.max(ENERGY_FLOOR);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Identity {
        len: usize,
    }

    impl SegmentModel for Identity {
        fn segment_len(&self) -> usize {
            self.len
        }

        fn infer(&self, segment: &[f32]) -> Result<Vec<f32>, ModelError> {
            Ok(segment.to_vec())
        }
    }

    struct FailsAt {
        len: usize,
        failing_call: usize,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl SegmentModel for FailsAt {
        fn segment_len(&self) -> usize {
            self.len
        }

        fn infer(&self, segment: &[f32]) -> Result<Vec<f32>, ModelError> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed);
            if call == self.failing_call {
                return Err(ModelError::Inference {
                    message: "synthetic failure".to_string(),
                });
            }
            Ok(segment.to_vec())
        }
    }

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| ((i % 200) as f32 / 200.0) - 0.5).collect()
    }

    #[test]
    fn identity_model_reconstructs_the_input() {
        let mono = ramp(10_000);
        let model = Identity { len: 4096 };
        let out = enhance_mono(&mono, &model, |_, _| {}, &CancelToken::new(), None).unwrap();
        assert_eq!(out.len(), mono.len());
        for i in 1..mono.len() - 1 {
            assert!(
                (out[i] - mono[i]).abs() < 1e-4,
                "sample {i}: {} vs {}",
                out[i],
                mono[i]
            );
        }
    }

    #[test]
    fn output_length_matches_input_for_awkward_lengths() {
        let model = Identity { len: 4096 };
        for len in [1usize, 100, 4095, 4096, 4097, 12_345] {
            let out = enhance_mono(&ramp(len), &model, |_, _| {}, &CancelToken::new(), None)
                .unwrap();
            assert_eq!(out.len(), len);
        }
    }

    #[test]
    fn progress_is_monotonic_and_complete() {
        let mono = ramp(10_000);
        let model = Identity { len: 4096 };
        let mut seen = Vec::new();
        enhance_mono(
            &mono,
            &model,
            |done, total| seen.push((done, total)),
            &CancelToken::new(),
            None,
        )
        .unwrap();
        assert!(!seen.is_empty());
        for window in seen.windows(2) {
            assert!(window[1].0 > window[0].0);
        }
        let (last_done, last_total) = *seen.last().unwrap();
        assert_eq!(last_done, last_total);
    }

    #[test]
    fn segment_failure_aborts_the_whole_signal() {
        let model = FailsAt {
            len: 4096,
            failing_call: 2,
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let err = enhance_mono(&ramp(10_000), &model, |_, _| {}, &CancelToken::new(), None)
            .unwrap_err();
        assert!(matches!(err, EnhanceError::Model(_)));
    }

    #[test]
    fn cancellation_stops_at_a_segment_boundary() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let model = Identity { len: 4096 };
        let err = enhance_mono(&ramp(10_000), &model, |_, _| {}, &cancel, None).unwrap_err();
        assert!(matches!(err, EnhanceError::Cancelled));
    }

    #[test]
    fn training_sink_sees_every_segment_pair() {
        let mono = ramp(10_000);
        let model = Identity { len: 4096 };
        let mut sink = CollectedPairs::default();
        enhance_mono(
            &mono,
            &model,
            |_, _| {},
            &CancelToken::new(),
            Some(&mut sink),
        )
        .unwrap();
        assert_eq!(sink.pairs.len(), 10_000usize.div_ceil(2048));
        for (input, output) in &sink.pairs {
            assert_eq!(input.len(), 4096);
            assert_eq!(output.len(), 4096);
        }
    }

    #[test]
    fn all_zero_input_enhances_to_near_zero() {
        let model = crate::model::EnhancerNet::fresh(crate::model::Category::General);
        let out = enhance_mono(
            &vec![0.0_f32; 8192],
            &model,
            |_, _| {},
            &CancelToken::new(),
            None,
        )
        .unwrap();
        assert_eq!(out.len(), 8192);
        assert!(out.iter().all(|&s| s.abs() < 1e-3));
    }
}
