//! Benchmarks for stream relays and output decoding.

use cmdpipe::core::output;
use cmdpipe::process::StreamRelay;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;

fn relay_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("relay");

    for size in [64 * 1024, 4 * 1024 * 1024, 32 * 1024 * 1024] {
        let data = vec![0x5a_u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.to_async(&runtime).iter(|| async {
                let relay = StreamRelay::start(
                    "bench",
                    Cursor::new(data.clone()),
                    tokio::io::sink(),
                    None,
                );
                black_box(relay.join().await)
            });
        });
    }
    group.finish();
}

fn output_benchmark(c: &mut Criterion) {
    let text: Vec<u8> = (0..10_000)
        .flat_map(|i| format!("line number {i}\n").into_bytes())
        .collect();

    c.bench_function("to_lines", |b| {
        b.iter(|| black_box(output::to_lines(black_box(&text))));
    });
}

criterion_group!(benches, relay_benchmark, output_benchmark);
criterion_main!(benches);
