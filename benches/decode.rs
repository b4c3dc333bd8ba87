//! Criterion benchmarks for the decode hot path.
//!
//! Key metrics:
//! - Per-record codec cost
//! - Full-chunk decode + CSV rendering throughput
//!
//! Run with: cargo bench --bench decode

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;
use sweeper::dump::{self, DumpReader};
use sweeper::sweep::{
    CsvFormatter, MacAddress, RingLayout, SectorSweep, Snr, SweepRecord, SweepSnapshot,
};

fn sample_records(count: usize) -> Vec<SweepRecord> {
    (0..count)
        .map(|i| SweepRecord {
            ctr: i as u32,
            src: MacAddress([0x50, 0xc7, 0xbf, 0, 0, i as u8]),
            sweep: SectorSweep::decode([i as u8, (i >> 3) as u8, 0x01]),
            snr: Snr(i as u8),
            dmg_tmstmp: i as u64 * 1_000,
        })
        .collect()
}

fn record_codec(c: &mut Criterion) {
    let record = sample_records(1)[0];
    let bytes = record.encode();

    let mut group = c.benchmark_group("record_codec");
    group.bench_function("decode", |b| {
        b.iter(|| SweepRecord::decode(black_box(&bytes)))
    });
    group.bench_function("encode", |b| b.iter(|| black_box(&record).encode()));
    group.finish();
}

/// Decode logs of increasing length into an in-memory sink.
fn log_decode(c: &mut Criterion) {
    let layout = RingLayout::default();
    let chunk = SweepSnapshot::from_records(layout, 17, &sample_records(layout.capacity));

    let mut group = c.benchmark_group("log_decode");
    for chunks in [1usize, 16, 128] {
        let log = chunk.as_bytes().repeat(chunks);

        group.throughput(Throughput::Bytes(log.len() as u64));
        group.bench_with_input(BenchmarkId::new("csv", chunks), &log, |b, log| {
            b.iter(|| {
                let reader = DumpReader::new(Cursor::new(log.as_slice()), layout);
                let mut out = Vec::with_capacity(log.len() * 3);
                dump::decode(reader, &mut CsvFormatter, &mut out).unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, record_codec, log_decode);
criterion_main!(benches);
