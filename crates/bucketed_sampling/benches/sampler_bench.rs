use bucketed_sampling::{BucketSampler, LengthIndex, Sampler, SamplerConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmarks for per-epoch batch construction.
///
/// This measures:
/// 1. Construction: bucketing + padding plan, paid once per training run
/// 2. Epoch rebuild: shuffle, extend, shard and chunk, paid once per epoch
///
/// To run these, use:
/// ```bash
/// cargo bench --bench sampler_bench
/// ```

/// All benchmarks sweep across dataset sizes from 10K to 1M examples.
const SIZES: [usize; 3] = [10_000, 100_000, 1_000_000];

const BOUNDARIES: [usize; 9] = [32, 300, 400, 500, 600, 700, 800, 900, 1000];

/// Deterministic pseudo-lengths spread over `0..1200`.
fn make_lengths(size: usize) -> LengthIndex {
    LengthIndex::new((0..size).map(|i| (i * 7_919) % 1_200).collect())
}

fn distributed_config(rank: usize) -> SamplerConfig {
    SamplerConfig::builder()
        .batch_size(32)
        .boundaries(BOUNDARIES.to_vec())
        .distributed(rank, 8)
        .build()
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sampler Construction");

    for &size in &SIZES {
        let lengths = make_lengths(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("bucketing", size), &lengths, |b, lengths| {
            b.iter(|| {
                let sampler = BucketSampler::new(lengths, &distributed_config(0)).unwrap();
                black_box(sampler.len());
            })
        });
    }
    group.finish();
}

fn bench_epoch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Epoch Rebuild");

    for &size in &SIZES {
        let lengths = make_lengths(size);
        let local = BucketSampler::local(&lengths, 32, BOUNDARIES.to_vec()).unwrap();
        let distributed = BucketSampler::new(&lengths, &distributed_config(3)).unwrap();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("local", size), &local, |b, sampler| {
            let mut epoch = 0;
            b.iter(|| {
                epoch += 1;
                black_box(sampler.iter(epoch).count());
            })
        });

        group.bench_with_input(BenchmarkId::new("distributed", size), &distributed, |b, sampler| {
            let mut epoch = 0;
            b.iter(|| {
                epoch += 1;
                black_box(sampler.iter(epoch).count());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_construction, bench_epoch);
criterion_main!(benches);
