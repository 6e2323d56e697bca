//! Spooler benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pglog_bench::{busy_context, plain_event};
use pglog_core::{LogEvent, Severity, SpoolConfig, Spooler};
use pglog_storage::InMemoryOpener;
use std::sync::Arc;
use tempfile::tempdir;

/// Benchmark spooling into memory and into real files.
fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    let ctx = busy_context();
    let event = plain_event(128);

    group.bench_function("memory", |b| {
        let opener = Arc::new(InMemoryOpener::new());
        let mut spooler =
            Spooler::with_opener(SpoolConfig::new().directory("/bench"), opener).unwrap();
        b.iter(|| black_box(spooler.emit(black_box(&event), &ctx)));
    });

    group.bench_function("file", |b| {
        let dir = tempdir().unwrap();
        let mut spooler = Spooler::init(SpoolConfig::new().directory(dir.path())).unwrap();
        b.iter(|| black_box(spooler.emit(black_box(&event), &ctx)));
        spooler.shutdown();
    });

    group.bench_function("filtered", |b| {
        let opener = Arc::new(InMemoryOpener::new());
        let mut spooler =
            Spooler::with_opener(SpoolConfig::new().directory("/bench"), opener).unwrap();
        let quiet = LogEvent::new(Severity::Debug1, "noise");
        b.iter(|| black_box(spooler.emit(black_box(&quiet), &ctx)));
    });

    group.finish();
}

criterion_group!(benches, bench_emit);
criterion_main!(benches);
