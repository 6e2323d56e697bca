//! Scan and estimate benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pglog_bench::populate_segments;
use pglog_core::{LogRelation, PredicateCost, ScanCursor, ScanOptions};
use tempfile::tempdir;

/// Benchmark full scans over several segments.
fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scan");
    group.sample_size(20);

    for records in [100, 1_000, 10_000] {
        let dir = tempdir().unwrap();
        populate_segments(dir.path(), 4, records / 4);

        group.throughput(Throughput::Elements(records as u64));
        group.bench_with_input(BenchmarkId::from_parameter(records), &dir, |b, dir| {
            b.iter(|| {
                let mut cursor = ScanCursor::new(ScanOptions::new(dir.path()));
                cursor.open().unwrap();
                let mut rows = 0usize;
                while let Some(row) = cursor.next_row().unwrap() {
                    black_box(row);
                    rows += 1;
                }
                cursor.close();
                rows
            });
        });
    }

    group.finish();
}

/// Benchmark planning, which lists and stats the directory every time.
fn bench_plan(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    populate_segments(dir.path(), 16, 10);
    let relation = LogRelation::new(ScanOptions::new(dir.path()));

    c.bench_function("plan", |b| {
        b.iter(|| black_box(relation.plan(176, 0.1, PredicateCost::default()).unwrap()));
    });
}

criterion_group!(benches, bench_full_scan, bench_plan);
criterion_main!(benches);
