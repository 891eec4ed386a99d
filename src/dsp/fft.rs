//! Radix-2 FFT primitives used by the transform engine.
//!
//! Convention: no scaling on the forward transform, full 1/N on the
//! inverse. Real signals are carried as half spectra of `N/2 + 1` bins
//! (bin 0 = DC, bin N/2 = Nyquist); `inverse_real` mirrors the half
//! spectrum into a conjugate-symmetric full spectrum before transforming.

use std::f32::consts::PI;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct Complex32 {
    pub re: f32,
    pub im: f32,
}

impl Complex32 {
    pub fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    pub(crate) fn mul(self, other: Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }

    pub(crate) fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }

    pub(crate) fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
}

/// Hann window coefficients, `0.5 * (1 - cos(2*pi*n/(len-1)))`.
///
/// Degenerate lengths below 2 fall back to all-ones; callers that need a
/// proper taper must guard against them.
pub fn hann_window(length: usize) -> Vec<f32> {
    if length <= 1 {
        return vec![1.0_f32; length.max(1)];
    }
    let denom = (length - 1) as f32;
    (0..length)
        .map(|n| 0.5_f32 * (1.0 - (2.0 * PI * n as f32 / denom).cos()))
        .collect()
}

pub(crate) fn fft_inplace(buffer: &mut [Complex32]) -> Result<(), String> {
    let n = buffer.len();
    if n == 0 || !n.is_power_of_two() {
        return Err(format!("FFT length must be power-of-two, got {n}"));
    }
    bit_reverse_permute(buffer);
    let mut len = 2usize;
    while len <= n {
        let angle = -2.0_f32 * PI / len as f32;
        let wlen = Complex32::new(angle.cos(), angle.sin());
        for start in (0..n).step_by(len) {
            let mut w = Complex32::new(1.0, 0.0);
            for i in 0..(len / 2) {
                let u = buffer[start + i];
                let v = buffer[start + i + len / 2].mul(w);
                buffer[start + i] = u.add(v);
                buffer[start + i + len / 2] = u.sub(v);
                w = w.mul(wlen);
            }
        }
        len *= 2;
    }
    Ok(())
}

/// Inverse FFT via the conjugation identity, including the 1/N scale.
pub(crate) fn ifft_inplace(buffer: &mut [Complex32]) -> Result<(), String> {
    for cell in buffer.iter_mut() {
        *cell = cell.conj();
    }
    fft_inplace(buffer)?;
    let scale = 1.0_f32 / buffer.len() as f32;
    for cell in buffer.iter_mut() {
        *cell = Complex32::new(cell.re * scale, -cell.im * scale);
    }
    Ok(())
}

/// Precomputed bit-reverse swaps and twiddle tables for a fixed length.
pub struct FftPlan {
    len: usize,
    bit_swaps: Vec<(usize, usize)>,
    twiddles: Vec<Vec<Complex32>>,
}

impl FftPlan {
    pub fn new(len: usize) -> Result<Self, String> {
        if len == 0 || !len.is_power_of_two() {
            return Err(format!("FFT length must be power-of-two, got {len}"));
        }
        Ok(Self {
            len,
            bit_swaps: build_bit_swaps(len),
            twiddles: build_twiddle_tables(len),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn fft_inplace_planned(&self, buffer: &mut [Complex32]) -> Result<(), String> {
        if buffer.len() != self.len {
            return Err(format!(
                "FFT length mismatch: buffer {} plan {}",
                buffer.len(),
                self.len
            ));
        }
        apply_bit_swaps(buffer, &self.bit_swaps);
        for stage in &self.twiddles {
            apply_stage(buffer, stage);
        }
        Ok(())
    }

    pub(crate) fn ifft_inplace_planned(&self, buffer: &mut [Complex32]) -> Result<(), String> {
        for cell in buffer.iter_mut() {
            *cell = cell.conj();
        }
        self.fft_inplace_planned(buffer)?;
        let scale = 1.0_f32 / self.len as f32;
        for cell in buffer.iter_mut() {
            *cell = Complex32::new(cell.re * scale, -cell.im * scale);
        }
        Ok(())
    }
}

/// Forward transform of a real frame into a half spectrum of `N/2 + 1` bins.
pub fn forward_real(frame: &[f32], plan: &FftPlan) -> Result<(Vec<f32>, Vec<f32>), String> {
    if frame.len() != plan.len() {
        return Err(format!(
            "Frame length mismatch: frame {} plan {}",
            frame.len(),
            plan.len()
        ));
    }
    let mut buffer: Vec<Complex32> = frame
        .iter()
        .map(|&sample| Complex32::new(sample, 0.0))
        .collect();
    plan.fft_inplace_planned(&mut buffer)?;
    let bins = plan.len() / 2 + 1;
    let mut re = Vec::with_capacity(bins);
    let mut im = Vec::with_capacity(bins);
    for cell in buffer.iter().take(bins) {
        re.push(cell.re);
        im.push(cell.im);
    }
    Ok((re, im))
}

/// Inverse transform of a half spectrum back into a real frame of length N.
///
/// The half spectrum is mirrored so `spec[N-k] = conj(spec[k])` for
/// `0 < k < N/2`; the imaginary parts of DC and Nyquist are forced to zero
/// since a real frame cannot carry them.
pub fn inverse_real(re: &[f32], im: &[f32], plan: &FftPlan) -> Result<Vec<f32>, String> {
    let n = plan.len();
    let bins = n / 2 + 1;
    if re.len() != bins || im.len() != bins {
        return Err(format!(
            "Half spectrum must have {bins} bins, got {}/{}",
            re.len(),
            im.len()
        ));
    }
    let mut buffer = mirror_half_spectrum(re, im, n);
    plan.ifft_inplace_planned(&mut buffer)?;
    Ok(buffer.into_iter().map(|cell| cell.re).collect())
}

pub(crate) fn mirror_half_spectrum(re: &[f32], im: &[f32], n: usize) -> Vec<Complex32> {
    let mut full = vec![Complex32::default(); n];
    full[0] = Complex32::new(re[0], 0.0);
    if n >= 2 {
        full[n / 2] = Complex32::new(re[n / 2], 0.0);
    }
    for k in 1..n / 2 {
        let bin = Complex32::new(re[k], im[k]);
        full[k] = bin;
        full[n - k] = bin.conj();
    }
    full
}

fn bit_reverse_permute(buffer: &mut [Complex32]) {
    let n = buffer.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            buffer.swap(i, j);
        }
    }
}

fn build_bit_swaps(len: usize) -> Vec<(usize, usize)> {
    let mut swaps = Vec::new();
    let mut j = 0usize;
    for i in 1..len {
        let mut bit = len >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            swaps.push((i, j));
        }
    }
    swaps
}

fn apply_bit_swaps(buffer: &mut [Complex32], swaps: &[(usize, usize)]) {
    for &(i, j) in swaps {
        buffer.swap(i, j);
    }
}

fn build_twiddle_tables(len: usize) -> Vec<Vec<Complex32>> {
    let mut tables = Vec::new();
    let mut step = 2usize;
    while step <= len {
        let half = step / 2;
        let angle = -2.0_f32 * PI / step as f32;
        let mut stage = Vec::with_capacity(half);
        for i in 0..half {
            let theta = angle * i as f32;
            let (sin, cos) = theta.sin_cos();
            stage.push(Complex32::new(cos, sin));
        }
        tables.push(stage);
        step *= 2;
    }
    tables
}

fn apply_stage(buffer: &mut [Complex32], twiddles: &[Complex32]) {
    let half = twiddles.len();
    let step = half * 2;
    for start in (0..buffer.len()).step_by(step) {
        for i in 0..half {
            let u = buffer[start + i];
            let v = buffer[start + i + half].mul(twiddles[i]);
            buffer[start + i] = u.add(v);
            buffer[start + i + half] = u.sub(v);
        }
    }
}
