use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use audiolift::dsp::{compute_spectrogram, synthesize};
use audiolift::enhance::{CancelToken, enhance_mono};
use audiolift::model::{Category, EnhancerNet};

const SAMPLE_RATE: u32 = 44_100;

fn tone(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

fn bench_spectrogram_round_trip(c: &mut Criterion) {
    let samples = tone(SAMPLE_RATE as usize);
    c.bench_with_input(
        BenchmarkId::new("spectrogram_round_trip", samples.len()),
        &samples,
        |b, samples| {
            b.iter(|| {
                let spec = compute_spectrogram(black_box(samples), 1024, 256).expect("analysis");
                synthesize(&spec).expect("synthesis")
            });
        },
    );
}

fn bench_segmented_inference(c: &mut Criterion) {
    let samples = tone(SAMPLE_RATE as usize);
    let model = EnhancerNet::fresh(Category::General);
    c.bench_with_input(
        BenchmarkId::new("segmented_inference", samples.len()),
        &samples,
        |b, samples| {
            b.iter(|| {
                enhance_mono(
                    black_box(samples),
                    &model,
                    |_, _| {},
                    &CancelToken::new(),
                    None,
                )
                .expect("enhance")
            });
        },
    );
}

criterion_group!(benches, bench_spectrogram_round_trip, bench_segmented_inference);
criterion_main!(benches);
