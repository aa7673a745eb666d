//! Micro-benchmarks for stratumdb core operations.
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench micro              # run all micro-benchmarks
//! cargo bench --bench micro -- put       # filter by name
//! ```
//!
//! Reports are generated in `target/criterion/report/index.html`.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use rand::prelude::*;
use stratumdb::{Engine, EngineConfig};
use tempfile::TempDir;

/// Default value payload (128 bytes).
const VALUE_128B: &[u8; 128] = &[0xAB; 128];

/// Format a zero-padded key.
fn make_key(i: u64) -> Vec<u8> {
    format!("key-{i:012}").into_bytes()
}

/// Open an engine whose memtable comfortably holds the whole working set,
/// so no background flush interferes with the measurement.
fn open_memtable_only(dir: &std::path::Path) -> Engine {
    Engine::open(
        dir,
        EngineConfig {
            write_buffer_size: 64 * 1024 * 1024,
            ..EngineConfig::default()
        },
    )
    .expect("open")
}

/// Pre-populate an engine and flush everything to SSTables.
fn prepopulate_sstables(dir: &std::path::Path, count: u64, tables: u64) {
    let engine = open_memtable_only(dir);
    let per_table = count / tables;
    for i in 0..count {
        engine.put(make_key(i), VALUE_128B.to_vec()).unwrap();
        if (i + 1) % per_table == 0 {
            engine.flush().unwrap();
        }
    }
    engine.flush().unwrap();
    engine.close().unwrap();
}

// ================================================================================================
// Write benchmarks
// ================================================================================================

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");
    group.throughput(Throughput::Bytes(VALUE_128B.len() as u64));

    group.bench_function("memtable_128b", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_memtable_only(dir.path());
        let mut i = 0u64;
        b.iter(|| {
            engine.put(make_key(i), VALUE_128B.to_vec()).unwrap();
            i += 1;
        });
        engine.close().unwrap();
    });

    group.finish();
}

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");
    group.sample_size(20);

    group.bench_function("1000_entries", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_memtable_only(dir.path());
        let mut base = 0u64;
        b.iter(|| {
            for i in 0..1000 {
                engine.put(make_key(base + i), VALUE_128B.to_vec()).unwrap();
            }
            engine.flush().unwrap();
            base += 1000;
        });
        engine.close().unwrap();
    });

    group.finish();
}

// ================================================================================================
// Read benchmarks
// ================================================================================================

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    group.bench_function("memtable_hit", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_memtable_only(dir.path());
        for i in 0..10_000 {
            engine.put(make_key(i), VALUE_128B.to_vec()).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| {
            let key = make_key(rng.random_range(0..10_000));
            black_box(engine.get(&key).unwrap());
        });
        engine.close().unwrap();
    });

    group.bench_function("sstable_hit", |b| {
        let dir = TempDir::new().unwrap();
        prepopulate_sstables(dir.path(), 10_000, 4);
        let engine = open_memtable_only(dir.path());
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| {
            let key = make_key(rng.random_range(0..10_000));
            black_box(engine.get(&key).unwrap());
        });
        engine.close().unwrap();
    });

    group.bench_function("miss", |b| {
        let dir = TempDir::new().unwrap();
        prepopulate_sstables(dir.path(), 10_000, 4);
        let engine = open_memtable_only(dir.path());
        b.iter(|| {
            black_box(engine.get(b"absent-key").unwrap());
        });
        engine.close().unwrap();
    });

    group.finish();
}

criterion_group!(benches, bench_put, bench_flush, bench_get);
criterion_main!(benches);
