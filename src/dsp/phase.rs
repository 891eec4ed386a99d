//! Iterative phase reconstruction for magnitude-modified spectrograms.
//!
//! Alternates synthesis and re-analysis, keeping the target magnitudes
//! and adopting each round's re-estimated phase, until the phase settles
//! or the iteration budget runs out. The output spectrogram carries the
//! target magnitudes with the converged phase and is ready for synthesis.

use std::f32::consts::PI;

use crate::dsp::stft::{Spectrogram, compute_spectrogram, synthesize};

#[derive(Debug, Clone, Copy)]
pub struct PhaseOptions {
    /// Maximum number of synthesis/re-analysis rounds.
    pub iterations: usize,
    /// Stop early once the mean absolute phase change (radians) between
    /// rounds drops below this.
    pub convergence_threshold: f32,
}

impl Default for PhaseOptions {
    fn default() -> Self {
        Self {
            iterations: 10,
            convergence_threshold: 1e-3,
        }
    }
}

/// Estimate a phase spectrogram consistent with `target_magnitude`.
///
/// `reference_phase`, when present and shape-compatible, seeds the
/// estimate; otherwise the target's own phase is the starting point.
pub fn reconstruct_phase(
    target_magnitude: &Spectrogram,
    reference_phase: Option<&Spectrogram>,
    options: PhaseOptions,
) -> Result<Spectrogram, String> {
    if target_magnitude.is_empty() {
        return Ok(target_magnitude.clone());
    }
    let mut estimate = target_magnitude.clone();
    if let Some(reference) = reference_phase {
        seed_phase(&mut estimate, reference)?;
    }
    for round in 0..options.iterations.max(1) {
        let signal = synthesize(&estimate)?;
        let reanalyzed =
            compute_spectrogram(&signal, estimate.fft_size, estimate.hop_size)?;
        if reanalyzed.time_frames() != estimate.time_frames() {
            return Err(format!(
                "Re-analysis produced {} frames, expected {}",
                reanalyzed.time_frames(),
                estimate.time_frames()
            ));
        }
        let mut delta_sum = 0.0_f64;
        let mut delta_count = 0usize;
        for (frame, new_frame) in estimate.frames.iter_mut().zip(reanalyzed.frames.iter()) {
            for (phase, &new_phase) in frame.phase.iter_mut().zip(new_frame.phase.iter()) {
                delta_sum += wrapped_delta(*phase, new_phase).abs() as f64;
                delta_count += 1;
                *phase = new_phase;
            }
        }
        let mean_delta = if delta_count == 0 {
            0.0
        } else {
            (delta_sum / delta_count as f64) as f32
        };
        tracing::debug!(round, mean_delta, "phase reconstruction round");
        if mean_delta < options.convergence_threshold {
            break;
        }
    }
    Ok(estimate)
}

fn seed_phase(estimate: &mut Spectrogram, reference: &Spectrogram) -> Result<(), String> {
    if reference.fft_size != estimate.fft_size || reference.hop_size != estimate.hop_size {
        return Err(format!(
            "Reference phase framing {}x{} does not match target {}x{}",
            reference.fft_size, reference.hop_size, estimate.fft_size, estimate.hop_size
        ));
    }
    let frames = estimate.time_frames().min(reference.time_frames());
    for idx in 0..frames {
        estimate.frames[idx]
            .phase
            .copy_from_slice(&reference.frames[idx].phase);
    }
    Ok(())
}

/// Smallest signed angle from `old` to `new`.
fn wrapped_delta(old: f32, new: f32) -> f32 {
    let mut delta = new - old;
    while delta > PI {
        delta -= 2.0 * PI;
    }
    while delta < -PI {
        delta += 2.0 * PI;
    }
    delta
}
