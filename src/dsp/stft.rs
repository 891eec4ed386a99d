//! Short-time analysis and overlap-add resynthesis.

use serde::{Deserialize, Serialize};

use crate::dsp::fft::{FftPlan, forward_real, hann_window, inverse_real};

/// Floor applied to accumulated window energy during normalization.
const ENERGY_FLOOR: f32 = 1e-8;

/// Magnitude/phase content of a single analysis frame.
#[derive(Debug, Clone)]
pub struct SpectralFrame {
    pub magnitude: Vec<f32>,
    pub phase: Vec<f32>,
}

/// Framing parameters of a spectrogram, kept alongside the frames so the
/// synthesis side never has to guess them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrogramShape {
    pub time_frames: usize,
    pub freq_bins: usize,
    pub fft_size: usize,
    pub hop_size: usize,
}

/// Ordered spectral frames plus their framing parameters.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub frames: Vec<SpectralFrame>,
    pub fft_size: usize,
    pub hop_size: usize,
}

impl Spectrogram {
    pub fn time_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn freq_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// True when the analyzed signal was shorter than one frame.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn shape(&self) -> SpectrogramShape {
        SpectrogramShape {
            time_frames: self.time_frames(),
            freq_bins: self.freq_bins(),
            fft_size: self.fft_size,
            hop_size: self.hop_size,
        }
    }

    /// Length of the signal `synthesize` will produce.
    pub fn synthesis_len(&self) -> usize {
        if self.frames.is_empty() {
            return 0;
        }
        (self.frames.len() - 1) * self.hop_size + self.fft_size
    }
}

/// Slide a Hann-windowed frame of `fft_size` across `samples` at `hop_size`
/// and transform each frame into magnitude and phase bins.
///
/// A signal shorter than one frame yields zero frames; callers decide
/// whether that is an error.
pub fn compute_spectrogram(
    samples: &[f32],
    fft_size: usize,
    hop_size: usize,
) -> Result<Spectrogram, String> {
    if fft_size < 2 {
        return Err(format!("FFT size must be at least 2, got {fft_size}"));
    }
    if hop_size == 0 {
        return Err("Hop size must be nonzero".to_string());
    }
    let plan = FftPlan::new(fft_size)?;
    let window = hann_window(fft_size);
    let mut frames = Vec::new();
    if samples.len() >= fft_size {
        let time_frames = (samples.len() - fft_size) / hop_size + 1;
        let mut windowed = vec![0.0_f32; fft_size];
        for frame_idx in 0..time_frames {
            let start = frame_idx * hop_size;
            fill_windowed(&mut windowed, samples, start, &window);
            let (re, im) = forward_real(&windowed, &plan)?;
            frames.push(polar_frame(&re, &im));
        }
    }
    Ok(Spectrogram {
        frames,
        fft_size,
        hop_size,
    })
}

/// Rebuild a time signal from magnitude/phase frames by inverse transform,
/// Hann synthesis windowing and overlap-add.
///
/// Each output sample is normalized by the accumulated squared-window
/// energy at that position, so analysis/synthesis round trips reconstruct
/// the interior of the signal for any hop up to half the frame size.
pub fn synthesize(spectrogram: &Spectrogram) -> Result<Vec<f32>, String> {
    if spectrogram.is_empty() {
        return Ok(Vec::new());
    }
    let fft_size = spectrogram.fft_size;
    let hop_size = spectrogram.hop_size;
    let plan = FftPlan::new(fft_size)?;
    let window = hann_window(fft_size);
    let out_len = spectrogram.synthesis_len();
    let mut output = vec![0.0_f32; out_len];
    let mut energy = vec![0.0_f32; out_len];
    let bins = spectrogram.freq_bins();
    let mut re = vec![0.0_f32; bins];
    let mut im = vec![0.0_f32; bins];
    for (frame_idx, frame) in spectrogram.frames.iter().enumerate() {
        if frame.magnitude.len() != bins || frame.phase.len() != bins {
            return Err(format!(
                "Frame {frame_idx} has {}/{} bins, expected {bins}",
                frame.magnitude.len(),
                frame.phase.len()
            ));
        }
        for bin in 0..bins {
            let (sin, cos) = frame.phase[bin].sin_cos();
            re[bin] = frame.magnitude[bin] * cos;
            im[bin] = frame.magnitude[bin] * sin;
        }
        let time_frame = inverse_real(&re, &im, &plan)?;
        let start = frame_idx * hop_size;
        for (i, &sample) in time_frame.iter().enumerate() {
            let w = window[i];
            output[start + i] += sample * w;
            energy[start + i] += w * w;
        }
    }
    for (sample, &e) in output.iter_mut().zip(energy.iter()) {
        *sample /= e.max(ENERGY_FLOOR);
    }
    Ok(output)
}

fn fill_windowed(target: &mut [f32], samples: &[f32], start: usize, window: &[f32]) {
    for (i, cell) in target.iter_mut().enumerate() {
        let src = samples.get(start + i).copied().unwrap_or(0.0);
        *cell = sanitize(src) * window[i];
    }
}

fn sanitize(sample: f32) -> f32 {
    if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn polar_frame(re: &[f32], im: &[f32]) -> SpectralFrame {
    let mut magnitude = Vec::with_capacity(re.len());
    let mut phase = Vec::with_capacity(re.len());
    for (&r, &i) in re.iter().zip(im.iter()) {
        magnitude.push((r * r + i * i).sqrt());
        phase.push(i.atan2(r));
    }
    SpectralFrame { magnitude, phase }
}
