//! Criterion benchmark measuring how fast receiver logs are turned into tables.
//!
//! The input is synthesized in memory: every packet contributes an overflow report, a message,
//! a frame sync estimate and a CRC verdict, interleaved with lines no rule matches.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rxlog2csv::{FrameSyncRecord, LinkQualityRecord, convert};

const PACKETS: usize = 20_000;

fn frame_sync_log(packets: usize) -> String {
    let mut log = String::new();
    for i in 0..packets {
        if i % 3 == 0 {
            log.push_str(&format!("{} overflows\n", i % 7 + 1));
        }
        log.push_str("[frame_sync_impl.cc] waiting for preamble\n");
        log.push_str(&format!("rx msg: packet payload:{i}\n"));
        log.push_str(&format!(
            "[frame_sync_impl.cc] {i} CFO estimate: -1.{i}, STO estimate: 3.{i}, snr est: 1{}.5, \
             k_hat: {}, k_hat2: {}, espacios: 2, CFO_INT2: -1, STO estimate 2: 0.{i}\n",
            i % 10,
            i % 128,
            (i + 1) % 128
        ));
        log.push_str(if i % 11 == 0 { "CRC invalid\n" } else { "CRC valid\n" });
    }
    log
}

fn link_quality_log(packets: usize) -> String {
    let mut log = String::new();
    for i in 0..packets {
        log.push_str("Packet Size: 14 bytes\n");
        log.push_str(&format!("Received string: packet:{i}\n"));
        log.push_str(&format!("RSSI: -{} dBm, SNR: {}.25 dB\n", 80 + i % 20, i % 12));
    }
    log
}

fn bench_convert(c: &mut Criterion) {
    let frame_sync = frame_sync_log(PACKETS);
    let link_quality = link_quality_log(PACKETS);

    let mut group = c.benchmark_group("convert");
    group.throughput(Throughput::Elements(PACKETS as u64));

    group.bench_function(BenchmarkId::new("frame_sync", PACKETS), |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(frame_sync.len());
            let stats = convert::<FrameSyncRecord>(frame_sync.as_bytes(), &mut out, b',')
                .expect("in-memory conversion does not fail");
            criterion::black_box((stats, out));
        });
    });

    group.bench_function(BenchmarkId::new("link_quality", PACKETS), |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(link_quality.len());
            let stats = convert::<LinkQualityRecord>(link_quality.as_bytes(), &mut out, b',')
                .expect("in-memory conversion does not fail");
            criterion::black_box((stats, out));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
