//! PCM signal container and sample-domain utilities.

use serde::{Deserialize, Serialize};

/// How multi-channel input is mapped onto the mono inference path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelPolicy {
    /// Average all channels into one mono signal before enhancement.
    #[default]
    DownmixAverage,
    /// Enhance every channel independently and reassemble.
    PerChannel,
}

/// Interleaved floating-point PCM with its sampling parameters.
#[derive(Debug, Clone)]
pub struct Signal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Signal {
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate: sample_rate.max(1),
            channels: 1,
        }
    }

    /// Number of per-channel sample frames.
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f32 / self.sample_rate as f32
    }

    /// Extract one channel as a contiguous buffer.
    pub fn channel(&self, index: usize) -> Vec<f32> {
        let channels = self.channels.max(1) as usize;
        if index >= channels {
            return Vec::new();
        }
        self.samples
            .iter()
            .skip(index)
            .step_by(channels)
            .copied()
            .map(sanitize_sample)
            .collect()
    }

    /// Mono rendering of the signal by channel averaging.
    pub fn downmix_mono(&self) -> Vec<f32> {
        downmix_to_mono(&self.samples, self.channels)
    }

    /// Rebuild an interleaved signal from per-channel buffers. All buffers
    /// must share one length.
    pub fn from_channels(channels: &[Vec<f32>], sample_rate: u32) -> Self {
        let count = channels.len().max(1);
        let frames = channels.first().map(|ch| ch.len()).unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * count);
        for frame in 0..frames {
            for channel in channels {
                samples.push(sanitize_sample(
                    channel.get(frame).copied().unwrap_or(0.0),
                ));
            }
        }
        Self {
            samples,
            sample_rate: sample_rate.max(1),
            channels: count as u16,
        }
    }
}

pub(crate) fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.iter().copied().map(sanitize_sample).collect();
    }
    let frames = samples.len() / channels;
    let mut mono = Vec::with_capacity(frames);
    for frame in 0..frames {
        let start = frame * channels;
        let end = start + channels;
        let slice = &samples[start..end.min(samples.len())];
        let mut sum = 0.0_f32;
        for &sample in slice {
            sum += sanitize_sample(sample);
        }
        mono.push(sum / channels as f32);
    }
    mono
}

/// Resample mono samples using linear interpolation.
pub fn resample_linear(samples: &[f32], input_rate: u32, output_rate: u32) -> Vec<f32> {
    let input_rate = input_rate.max(1);
    let output_rate = output_rate.max(1);
    if samples.is_empty() || input_rate == output_rate {
        return samples.to_vec();
    }
    let duration_seconds = samples.len() as f64 / input_rate as f64;
    let out_len = (duration_seconds * output_rate as f64).round().max(1.0) as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let t = i as f64 / output_rate as f64;
        let pos = t * input_rate as f64;
        out.push(lerp_sample(samples, pos));
    }
    out
}

fn lerp_sample(samples: &[f32], pos: f64) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let idx0 = pos.floor().max(0.0) as usize;
    let frac = (pos - idx0 as f64).clamp(0.0, 1.0) as f32;
    let idx1 = idx0.saturating_add(1).min(samples.len().saturating_sub(1));
    let a = samples.get(idx0).copied().unwrap_or(0.0);
    let b = samples.get(idx1).copied().unwrap_or(a);
    a + (b - a) * frac
}

/// Scale so the peak sits at full scale; silence is left untouched.
pub fn normalize_peak_in_place(samples: &mut [f32]) {
    let mut peak = 0.0_f32;
    for &sample in samples.iter() {
        peak = peak.max(sample.abs());
    }
    if !peak.is_finite() || peak <= 0.0 {
        return;
    }
    let gain = 1.0_f32 / peak;
    for sample in samples.iter_mut() {
        *sample = (*sample * gain).clamp(-1.0, 1.0);
    }
}

pub(crate) fn sanitize_sample(sample: f32) -> f32 {
    if !sample.is_finite() {
        return 0.0;
    }
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped != 0.0 && clamped.abs() < f32::MIN_POSITIVE {
        0.0
    } else {
        clamped
    }
}

pub fn sanitize_samples_in_place(samples: &mut [f32]) {
    for sample in samples.iter_mut() {
        *sample = sanitize_sample(*sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_channels() {
        let signal = Signal {
            samples: vec![1.0, -1.0, 0.5, 0.5],
            sample_rate: 44_100,
            channels: 2,
        };
        let mono = signal.downmix_mono();
        assert_eq!(mono, vec![0.0, 0.5]);
    }

    #[test]
    fn channel_extraction_and_reassembly_round_trip() {
        let signal = Signal {
            samples: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            sample_rate: 48_000,
            channels: 2,
        };
        let left = signal.channel(0);
        let right = signal.channel(1);
        assert_eq!(left, vec![0.1, 0.3, 0.5]);
        let rebuilt = Signal::from_channels(&[left, right], 48_000);
        for (a, b) in rebuilt.samples.iter().zip(signal.samples.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
        assert_eq!(rebuilt.channels, 2);
    }

    #[test]
    fn resample_preserves_duration() {
        let samples = vec![0.0_f32; 44_100];
        let out = resample_linear(&samples, 44_100, 22_050);
        assert_eq!(out.len(), 22_050);
    }

    #[test]
    fn sanitize_clamps_and_zeroes_non_finite() {
        assert_eq!(sanitize_sample(2.0), 1.0);
        assert_eq!(sanitize_sample(-3.0), -1.0);
        assert_eq!(sanitize_sample(f32::NAN), 0.0);
        assert_eq!(sanitize_sample(f32::INFINITY), 0.0);
    }

    #[test]
    fn normalize_peak_hits_full_scale() {
        let mut samples = vec![0.25, -0.5, 0.1];
        normalize_peak_in_place(&mut samples);
        assert!((samples[1] + 1.0).abs() < 1e-6);
    }
}
