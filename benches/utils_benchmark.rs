use std::f64::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pitch_tracker::{
    detector::{
        yin::{DifferenceMethod, YinEstimator, YinParameters},
        PitchEstimator,
    },
    tracker::PitchTracker,
    utils::peak::collect_candidates,
};

pub fn utils_benchmark(c: &mut Criterion) {
    let v = (0..1024)
        .map(|v| 0.5 + 0.5 * ((v as f64) / PI / 30.).sin())
        .collect::<Vec<f64>>();
    let vv = v.as_slice();

    c.bench_function("collect_candidates", |b| {
        b.iter(|| collect_candidates(black_box(vv), 20, 0.2))
    });

    let mut tracker = PitchTracker::<f64>::new();
    let raw = [220.0, 221.0, 440.0, 219.5, 220.5];
    c.bench_function("PitchTracker update", |b| {
        b.iter(|| {
            for hz in raw {
                tracker.update(black_box(Some(hz)), 0.3);
            }
        })
    });
}

pub fn pitch_estimate_benchmark(c: &mut Criterion) {
    const SAMPLE_RATE: usize = 44100;
    const SIZE: usize = 4096;

    // Signal coming from some source (microphone, generated, etc...)
    let dt = 1.0 / SAMPLE_RATE as f64;
    let freq = 300.0;
    let signal: Vec<f64> = (0..SIZE)
        .map(|x| (2.0 * PI * x as f64 * dt * freq).sin())
        .collect();

    let mut direct = YinEstimator::<f64>::new();
    let mut fft = YinEstimator::<f64>::with_parameters(YinParameters {
        difference: DifferenceMethod::Fft,
        ..Default::default()
    })
    .unwrap();

    c.bench_function("YIN direct estimate", |b| {
        b.iter(|| direct.estimate(black_box(&signal), SAMPLE_RATE).unwrap());
    });

    c.bench_function("YIN fft estimate", |b| {
        b.iter(|| fft.estimate(black_box(&signal), SAMPLE_RATE).unwrap());
    });
}

criterion_group!(benches, pitch_estimate_benchmark, utils_benchmark);
criterion_main!(benches);
