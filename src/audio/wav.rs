//! WAV read/write through hound.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::audio::error::AudioError;
use crate::audio::signal::{Signal, sanitize_sample};

/// Output encoding for `write_wav`. Integer encodes clamp to [-1, 1] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavEncoding {
    Int16,
    Int24,
    Float32,
}

pub fn read_wav(path: &Path) -> Result<Signal, AudioError> {
    let mut reader = WavReader::open(path).map_err(|err| decode_error(path, err))?;
    let spec = reader.spec();
    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|sample| sample.map(sanitize_sample))
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|err| decode_error(path, err))?,
        (SampleFormat::Int, bits @ (16 | 24 | 32)) => {
            let scale = 1.0_f32 / (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|v| sanitize_sample(v as f32 * scale)))
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|err| decode_error(path, err))?
        }
        (format, bits) => {
            return Err(AudioError::Unsupported {
                path: path.to_path_buf(),
                detail: format!("{format:?} {bits}-bit WAV"),
            });
        }
    };
    Ok(Signal {
        samples,
        sample_rate: spec.sample_rate.max(1),
        channels: spec.channels.max(1),
    })
}

pub fn write_wav(path: &Path, signal: &Signal, encoding: WavEncoding) -> Result<(), AudioError> {
    let spec = WavSpec {
        channels: signal.channels.max(1),
        sample_rate: signal.sample_rate.max(1),
        bits_per_sample: match encoding {
            WavEncoding::Int16 => 16,
            WavEncoding::Int24 => 24,
            WavEncoding::Float32 => 32,
        },
        sample_format: match encoding {
            WavEncoding::Float32 => SampleFormat::Float,
            _ => SampleFormat::Int,
        },
    };
    let mut writer = WavWriter::create(path, spec).map_err(|err| encode_error(path, err))?;
    match encoding {
        WavEncoding::Float32 => {
            for &sample in &signal.samples {
                writer
                    .write_sample(sanitize_sample(sample))
                    .map_err(|err| encode_error(path, err))?;
            }
        }
        WavEncoding::Int16 => {
            for &sample in &signal.samples {
                let quantized = (sanitize_sample(sample) * i16::MAX as f32).round() as i16;
                writer
                    .write_sample(quantized)
                    .map_err(|err| encode_error(path, err))?;
            }
        }
        WavEncoding::Int24 => {
            const MAX_24: f32 = ((1i32 << 23) - 1) as f32;
            for &sample in &signal.samples {
                let quantized = (sanitize_sample(sample) * MAX_24).round() as i32;
                writer
                    .write_sample(quantized)
                    .map_err(|err| encode_error(path, err))?;
            }
        }
    }
    writer.finalize().map_err(|err| encode_error(path, err))
}

fn decode_error(path: &Path, err: hound::Error) -> AudioError {
    AudioError::Decode {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn encode_error(path: &Path, err: hound::Error) -> AudioError {
    AudioError::Encode {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn int16_round_trip_preserves_samples_within_quantization() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let signal = Signal::from_mono(
            (0..256)
                .map(|i| (i as f32 / 256.0 * std::f32::consts::TAU).sin() * 0.8)
                .collect(),
            44_100,
        );
        write_wav(&path, &signal, WavEncoding::Int16).unwrap();
        let back = read_wav(&path).unwrap();
        assert_eq!(back.sample_rate, 44_100);
        assert_eq!(back.channels, 1);
        assert_eq!(back.samples.len(), 256);
        for (a, b) in back.samples.iter().zip(signal.samples.iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn out_of_range_samples_are_clamped_before_integer_encode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hot.wav");
        let signal = Signal::from_mono(vec![2.0, -2.0, 0.5], 22_050);
        write_wav(&path, &signal, WavEncoding::Int16).unwrap();
        let back = read_wav(&path).unwrap();
        assert!(back.samples[0] <= 1.0 && back.samples[0] > 0.99);
        assert!(back.samples[1] >= -1.0 && back.samples[1] < -0.99);
    }

    #[test]
    fn float32_round_trip_is_lossless() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f32.wav");
        let signal = Signal::from_mono(vec![0.125, -0.625, 0.0], 48_000);
        write_wav(&path, &signal, WavEncoding::Float32).unwrap();
        let back = read_wav(&path).unwrap();
        assert_eq!(back.samples, signal.samples);
    }
}
