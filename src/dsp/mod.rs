//! Time/frequency transform engine: windowing, FFT, STFT and phase
//! reconstruction.

pub mod fft;
pub mod phase;
pub mod stft;

pub use fft::{FftPlan, forward_real, hann_window, inverse_real};
pub use phase::{PhaseOptions, reconstruct_phase};
pub use stft::{SpectralFrame, Spectrogram, SpectrogramShape, compute_spectrogram, synthesize};
