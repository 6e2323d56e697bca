//! Record formatting benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pglog_bench::{busy_context, plain_event, quoted_event};
use pglog_core::{parse_record, EventFormatter, FormatSettings, SessionContext};

/// Benchmark formatting events of different sizes.
fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");
    let settings = FormatSettings::default();
    let ctx = busy_context();

    for size in [16, 256, 4096] {
        let plain = plain_event(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("plain", size), &plain, |b, event| {
            let mut formatter = EventFormatter::new();
            b.iter(|| black_box(formatter.format(black_box(event), &ctx, &settings)));
        });

        let quoted = quoted_event(size);
        group.bench_with_input(BenchmarkId::new("quoted", size), &quoted, |b, event| {
            let mut formatter = EventFormatter::new();
            b.iter(|| black_box(formatter.format(black_box(event), &ctx, &settings)));
        });
    }

    group.bench_function("empty_context", |b| {
        let event = plain_event(64);
        let empty = SessionContext::new();
        let mut formatter = EventFormatter::new();
        b.iter(|| black_box(formatter.format(&event, &empty, &settings)));
    });

    group.finish();
}

/// Benchmark splitting a formatted record back into cells.
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    let ctx = busy_context();

    for size in [16, 256, 4096] {
        let line = EventFormatter::new().format(&quoted_event(size), &ctx, &FormatSettings::default());
        let line = line.trim_end_matches('\n').to_string();
        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_with_input(BenchmarkId::new("quoted", size), &line, |b, line| {
            b.iter(|| black_box(parse_record(black_box(line)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_format, bench_parse);
criterion_main!(benches);
