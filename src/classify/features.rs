//! Fixed-length spectral feature vector for content classification.
//!
//! Forty log-mel band energies averaged across time. Mel averaging was
//! chosen over raw bin averages for robustness to sample-rate differences
//! once the input is resampled to the analysis rate.

use crate::audio::resample_linear;
use crate::classify::mel::MelBank;
use crate::dsp::compute_spectrogram;
use crate::model::classifier::CLASSIFIER_FEATURE_LEN;

/// Fixed sample rate features are computed at.
pub const ANALYSIS_SAMPLE_RATE: u32 = 16_000;
pub const FEATURE_FFT_SIZE: usize = 1024;
pub const FEATURE_HOP_SIZE: usize = 512;

/// Extract the 40-dim feature vector from mono audio at an arbitrary
/// sample rate. Returns `None` when the signal is too short to produce a
/// single analysis frame.
pub fn extract_features(mono: &[f32], sample_rate: u32) -> Option<Vec<f32>> {
    let resampled;
    let analysis: &[f32] = if sample_rate == ANALYSIS_SAMPLE_RATE {
        mono
    } else {
        resampled = resample_linear(mono, sample_rate, ANALYSIS_SAMPLE_RATE);
        &resampled
    };
    let spectrogram =
        compute_spectrogram(analysis, FEATURE_FFT_SIZE, FEATURE_HOP_SIZE).ok()?;
    if spectrogram.is_empty() {
        return None;
    }
    let bank = MelBank::new(
        ANALYSIS_SAMPLE_RATE,
        FEATURE_FFT_SIZE,
        CLASSIFIER_FEATURE_LEN,
        20.0,
        8_000.0,
    );
    let mut sums = vec![0.0_f64; bank.bands()];
    for frame in &spectrogram.frames {
        let power: Vec<f32> = frame.magnitude.iter().map(|m| m * m).collect();
        for (sum, energy) in sums.iter_mut().zip(bank.log_energies(&power)) {
            *sum += energy as f64;
        }
    }
    let frames = spectrogram.time_frames() as f64;
    Some(sums.into_iter().map(|sum| (sum / frames) as f32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn feature_vector_has_fixed_length() {
        let features = extract_features(&sine(440.0, 44_100, 44_100), 44_100).unwrap();
        assert_eq!(features.len(), CLASSIFIER_FEATURE_LEN);
    }

    #[test]
    fn features_are_deterministic() {
        let mono = sine(440.0, 22_050, 22_050);
        assert_eq!(
            extract_features(&mono, 22_050),
            extract_features(&mono, 22_050)
        );
    }

    #[test]
    fn sub_frame_input_yields_no_features() {
        assert!(extract_features(&[0.1_f32; 64], 16_000).is_none());
    }

    #[test]
    fn tone_concentrates_energy_in_matching_bands() {
        let features = extract_features(&sine(440.0, 16_000, 16_000), 16_000).unwrap();
        let peak_band = features
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap();
        // 440 Hz sits low on the mel scale.
        assert!(peak_band < 15);
    }
}
