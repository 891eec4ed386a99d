//! End-to-end upscale runs over real files on disk.

use std::sync::Arc;

use audiolift::audio::{Signal, WavEncoding, read_wav, write_wav};
use audiolift::model::ModelRegistry;
use audiolift::pipeline::{CancelToken, EnhanceConfig, Orchestrator, PipelineError};
use tempfile::tempdir;

fn sine_signal(seconds: f32, sample_rate: u32) -> Signal {
    let len = (seconds * sample_rate as f32) as usize;
    Signal::from_mono(
        (0..len)
            .map(|i| {
                0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin()
            })
            .collect(),
        sample_rate,
    )
}

fn orchestrator() -> Orchestrator {
    Orchestrator::new(Arc::new(ModelRegistry::fresh()))
}

#[test]
fn upscale_file_produces_output_and_full_progress() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.wav");
    let output = dir.path().join("output.wav");
    write_wav(&input, &sine_signal(1.0, 44_100), WavEncoding::Int16).unwrap();

    let mut progress: Vec<u8> = Vec::new();
    let outcome = orchestrator()
        .upscale_file(
            &input,
            &output,
            &EnhanceConfig::default(),
            |p| progress.push(p),
            &CancelToken::new(),
        )
        .unwrap();

    let enhanced = read_wav(&output).unwrap();
    assert_eq!(enhanced.sample_rate, 44_100);
    assert_eq!(enhanced.frame_count(), 44_100);
    assert!(enhanced.samples.iter().all(|s| s.abs() <= 1.0));

    assert_eq!(*progress.last().unwrap(), 100);
    for window in progress.windows(2) {
        assert!(window[1] > window[0], "progress regressed: {progress:?}");
    }
    assert!(outcome.training_pairs.is_empty());
}

#[test]
fn postprocessing_with_phase_refinement_completes() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.wav");
    let output = dir.path().join("output.wav");
    write_wav(&input, &sine_signal(0.5, 44_100), WavEncoding::Int16).unwrap();

    let config = EnhanceConfig {
        use_preprocessing: true,
        use_postprocessing: true,
        preserve_quality: true,
        ..EnhanceConfig::default()
    };
    orchestrator()
        .upscale_file(&input, &output, &config, |_| {}, &CancelToken::new())
        .unwrap();
    let enhanced = read_wav(&output).unwrap();
    assert_eq!(enhanced.frame_count(), 22_050);
}

#[test]
fn unsupported_input_is_rejected_without_partial_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.mp3");
    let output = dir.path().join("output.wav");
    std::fs::write(&input, b"not really audio").unwrap();

    let err = orchestrator()
        .upscale_file(
            &input,
            &output,
            &EnhanceConfig::default(),
            |_| {},
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(matches!(err, PipelineError::Input(_)));
    assert!(!output.exists());
}

#[test]
fn sub_frame_input_fails_as_input_error_not_crash() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("short.wav");
    let output = dir.path().join("output.wav");
    write_wav(
        &input,
        &Signal::from_mono(vec![0.3_f32; 64], 44_100),
        WavEncoding::Int16,
    )
    .unwrap();

    let err = orchestrator()
        .upscale_file(
            &input,
            &output,
            &EnhanceConfig::default(),
            |_| {},
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(matches!(err, PipelineError::InputTooShort { .. }));
    assert!(!output.exists());
}

#[test]
fn repeated_runs_on_identical_input_agree() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.wav");
    write_wav(&input, &sine_signal(1.0, 44_100), WavEncoding::Int16).unwrap();

    let orchestrator = orchestrator();
    let out_a = dir.path().join("a.wav");
    let out_b = dir.path().join("b.wav");
    let first = orchestrator
        .upscale_file(
            &input,
            &out_a,
            &EnhanceConfig::default(),
            |_| {},
            &CancelToken::new(),
        )
        .unwrap();
    let second = orchestrator
        .upscale_file(
            &input,
            &out_b,
            &EnhanceConfig::default(),
            |_| {},
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(
        first.classification.dominant,
        second.classification.dominant
    );
    assert_eq!(first.category_used, second.category_used);
    assert_eq!(
        read_wav(&out_a).unwrap().samples,
        read_wav(&out_b).unwrap().samples
    );
}
