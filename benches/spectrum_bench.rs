//! Benchmarks for the Lomb-Scargle periodogram.
//!
//! Run with: `cargo bench --bench spectrum_bench`
//!
//! Measures the periodogram against series length and grid oversampling,
//! the two sizes that set the cost of a slope estimate.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use slope_rs::analysis::{find_peaks, frequency_grid, lomb_scargle_psd, simpson};

const DAY: f64 = 86400.0;

/// Irregular ~8-day sampling of a tide-like signal.
fn generate_series(n: usize) -> (Vec<f64>, Vec<f64>) {
    let times: Vec<f64> = (0..n)
        .map(|i| {
            let phase = i as f64 * 0.37;
            (8.0 * i as f64 + 1.5 * phase.sin().abs()) * DAY
        })
        .collect();
    let values = times
        .iter()
        .map(|&t| {
            let tidal = 0.5 * (2.0 * std::f64::consts::PI * t / (17.5 * DAY)).sin();
            tidal + 0.1 * (t / DAY).cos()
        })
        .collect();
    (times, values)
}

fn bench_periodogram_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("lomb_scargle_length");
    group.sample_size(20);

    for n in [100, 300, 600] {
        let (times, values) = generate_series(n);
        let freqs = frequency_grid(&times, 8.0 * DAY, 10).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| lomb_scargle_psd(black_box(&times), black_box(&values), black_box(&freqs)))
        });
    }

    group.finish();
}

fn bench_periodogram_oversampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("lomb_scargle_oversampling");
    group.sample_size(20);

    let (times, values) = generate_series(300);
    for n0 in [5, 20, 50] {
        let freqs = frequency_grid(&times, 8.0 * DAY, n0).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(n0), &n0, |b, _| {
            b.iter(|| lomb_scargle_psd(black_box(&times), black_box(&values), black_box(&freqs)))
        });
    }

    group.finish();
}

fn bench_post_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectrum_post_processing");

    let (times, values) = generate_series(300);
    let freqs = frequency_grid(&times, 8.0 * DAY, 50).unwrap();
    let psd = lomb_scargle_psd(&times, &values, &freqs).unwrap();

    group.bench_function("find_peaks", |b| b.iter(|| find_peaks(black_box(&psd))));
    group.bench_function("simpson", |b| {
        b.iter(|| simpson(black_box(&psd), black_box(&freqs)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_periodogram_length,
    bench_periodogram_oversampling,
    bench_post_processing
);
criterion_main!(benches);
