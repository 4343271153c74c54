//! Benchmark suite for feature extraction performance.
//!
//! Run with: `cargo bench`
//!
//! This benchmark measures:
//! - Single-chunk feature extraction at several chunk sizes
//! - Rolling statistics, the dominant per-chunk cost
//! - Chunk aggregation
//! - Streaming one file end to end

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stationarity_extractor::features::{
    extract_chunk_features,
    statistics::{autocorrelation, rolling_stats},
    ChunkAggregator,
};
use stationarity_extractor::processor::FileProcessor;
use std::io::Write;

/// Deterministic noisy random walk with a mild oscillation.
fn create_series(len: usize) -> Vec<f64> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut level = 0.0;
    (0..len)
        .map(|i| {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let noise = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            level += noise;
            level + (i as f64 * 0.05).sin()
        })
        .collect()
}

fn bench_chunk_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_features");

    for size in [100usize, 1_000, 10_000].iter() {
        let data = create_series(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("extract", size), &data, |b, data| {
            b.iter(|| extract_chunk_features(black_box(data)))
        });
    }

    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");
    let data = create_series(10_000);

    group.bench_function("rolling_stats_window_1000", |b| {
        b.iter(|| rolling_stats(black_box(&data), 1_000))
    });

    group.bench_function("autocorrelation_lag_10", |b| {
        b.iter(|| autocorrelation(black_box(&data), 10))
    });

    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    let chunks: Vec<_> = (0..50)
        .filter_map(|i| extract_chunk_features(&create_series(500 + i)))
        .collect();

    group.throughput(Throughput::Elements(chunks.len() as u64));
    group.bench_function("aggregate_50_chunks", |b| {
        b.iter(|| {
            let mut aggregator = ChunkAggregator::new();
            for chunk in &chunks {
                aggregator.push(*chunk);
            }
            aggregator.finish()
        })
    });

    group.finish();
}

fn bench_file_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_streaming");
    group.sample_size(20);

    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("series.csv");
    {
        let mut file = std::fs::File::create(&path).expect("create bench file");
        writeln!(file, "timestamp,data").expect("write header");
        for (i, v) in create_series(50_000).iter().enumerate() {
            writeln!(file, "{i},{v}").expect("write row");
        }
    }

    for chunk_size in [1_000usize, 10_000].iter() {
        let processor = FileProcessor::new(*chunk_size);
        group.throughput(Throughput::Elements(50_000));
        group.bench_with_input(
            BenchmarkId::new("process_file", chunk_size),
            &processor,
            |b, processor| b.iter(|| processor.process_file(black_box(&path))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_chunk_features,
    bench_statistics,
    bench_aggregation,
    bench_file_streaming,
);

criterion_main!(benches);
