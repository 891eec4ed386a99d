//! Spectral transform properties checked end to end.

use audiolift::dsp::{PhaseOptions, compute_spectrogram, reconstruct_phase, synthesize};

fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

fn interior_mse(a: &[f32], b: &[f32], margin: usize) -> f64 {
    let hi = a.len().min(b.len()) - margin;
    let mut sum = 0.0_f64;
    for i in margin..hi {
        let diff = (a[i] - b[i]) as f64;
        sum += diff * diff;
    }
    sum / (hi - margin) as f64
}

#[test]
fn one_second_sine_round_trip_stays_below_tolerance() {
    let samples = sine(440.0, 44_100, 44_100);
    let spectrogram = compute_spectrogram(&samples, 1024, 256).unwrap();
    assert_eq!(spectrogram.time_frames(), (44_100 - 1024) / 256 + 1);
    assert_eq!(spectrogram.freq_bins(), 513);
    let back = synthesize(&spectrogram).unwrap();
    assert!(interior_mse(&samples, &back, 1024) < 1e-4);
}

#[test]
fn phase_reconstruction_then_synthesis_preserves_a_tone() {
    let samples = sine(440.0, 44_100, 22_050);
    let spectrogram = compute_spectrogram(&samples, 1024, 256).unwrap();
    let rebuilt =
        reconstruct_phase(&spectrogram, Some(&spectrogram), PhaseOptions::default()).unwrap();
    let back = synthesize(&rebuilt).unwrap();
    // Reconstructed audio keeps the tone's energy: compare RMS rather
    // than samples, since phase estimation may shift the waveform.
    let rms_in =
        (samples.iter().map(|s| (s * s) as f64).sum::<f64>() / samples.len() as f64).sqrt();
    let rms_out = (back.iter().map(|s| (s * s) as f64).sum::<f64>() / back.len() as f64).sqrt();
    assert!((rms_in - rms_out).abs() / rms_in < 0.15);
}
