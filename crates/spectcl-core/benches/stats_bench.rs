//! Benchmarks for table building, gate filtering and weighted statistics
//!
//! Run with: cargo bench -p spectcl-core --bench stats_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spectcl_core::analysis::WeightedStats;
use spectcl_core::gate::{GateMask, NamedMask, Point};
use spectcl_core::prelude::*;

const BINS: u32 = 512;

fn random_rows(n: usize, seed: u64) -> Vec<ChannelRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            ChannelRow::new_2d(
                rng.gen_range(0..BINS as i64),
                rng.gen_range(0..BINS as i64),
                rng.gen_range(1..1000),
            )
        })
        .collect()
}

fn axes() -> Vec<AxisDef> {
    vec![
        AxisDef::new(0.0, 1024.0, BINS),
        AxisDef::new(-50.0, 50.0, BINS),
    ]
}

fn octagon() -> Vec<Point> {
    (0..8)
        .map(|i| {
            let a = i as f64 * std::f64::consts::FRAC_PI_4;
            Point::new(512.0 + 300.0 * a.cos(), 30.0 * a.sin())
        })
        .collect()
}

// ============================================================================
// Table construction
// ============================================================================

fn bench_table_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_build");

    for n in [1_000usize, 10_000, 100_000] {
        let rows = random_rows(n, 1);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("world_view", n), &rows, |b, rows| {
            b.iter(|| {
                SpectrumTable::new(
                    vec!["tof".into(), "de".into()],
                    axes(),
                    black_box(rows.clone()),
                    OutOfRangePolicy::Keep,
                )
            })
        });
    }

    group.finish();
}

// ============================================================================
// Gate filtering and statistics
// ============================================================================

fn bench_polygon_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("polygon_filter");
    let mask = GateMask::Polygon(octagon());

    for n in [1_000usize, 100_000] {
        let table = SpectrumTable::new(
            vec!["tof".into(), "de".into()],
            axes(),
            random_rows(n, 2),
            OutOfRangePolicy::Keep,
        )
        .unwrap();
        let columns = table.columns(CoordinateSystem::World);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("octagon", n), &columns, |b, cols| {
            b.iter(|| mask.filter(black_box(cols)))
        });
    }

    group.finish();
}

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");
    let stats = WeightedStats::default();
    let gate = NamedMask::new("octagon", GateMask::Polygon(octagon()));

    for n in [1_000usize, 100_000] {
        let table = SpectrumTable::new(
            vec!["tof".into(), "de".into()],
            axes(),
            random_rows(n, 3),
            OutOfRangePolicy::Keep,
        )
        .unwrap();
        let columns = table.columns(CoordinateSystem::World);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("ungated", n), &columns, |b, cols| {
            b.iter(|| stats.summarize(black_box(cols), None))
        });
        group.bench_with_input(BenchmarkId::new("gated", n), &columns, |b, cols| {
            b.iter(|| stats.summarize(black_box(cols), Some(&gate)))
        });
    }

    group.finish();
}

#[cfg(feature = "parallel")]
fn bench_batch(c: &mut Criterion) {
    use spectcl_core::parallel::summarize_batch;

    let spectra: Vec<Spectrum> = (0..32)
        .map(|i| {
            Spectrum::new(
                format!("s{}", i),
                SpectrumType::TwoD,
                vec!["tof".into(), "de".into()],
                axes(),
                random_rows(10_000, 100 + i as u64),
                OutOfRangePolicy::Keep,
            )
            .unwrap()
        })
        .collect();
    let stats = WeightedStats::default();

    let mut group = c.benchmark_group("batch");
    group.bench_function("sequential_32x10k", |b| {
        b.iter(|| {
            spectra
                .iter()
                .map(|s| s.stats_with(CoordinateSystem::World, &stats))
                .collect::<Vec<_>>()
        })
    });
    group.bench_function("parallel_32x10k", |b| {
        b.iter(|| summarize_batch(black_box(&spectra), CoordinateSystem::World, &stats))
    });
    group.finish();
}

#[cfg(not(feature = "parallel"))]
fn bench_batch(_c: &mut Criterion) {}

criterion_group!(
    benches,
    bench_table_build,
    bench_polygon_filter,
    bench_summarize,
    bench_batch
);
criterion_main!(benches);
