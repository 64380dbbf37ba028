//! Storage benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flata_bench::random_documents;
use flata_storage::{
    CachingMiddleware, JsonStorage, JsonStorageConfig, MemoryStorage, RawDatabase, Storage,
};
use serde_json::Value;
use tempfile::TempDir;

/// Build a raw database with one table of `count` documents.
fn raw_database(count: usize) -> RawDatabase {
    let mut data = RawDatabase::new();
    data.insert("bench".into(), Value::Array(random_documents(count)));
    data
}

/// Benchmark whole-database writes to a JSON file.
fn bench_json_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_write");

    for count in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let dir = TempDir::new().unwrap();
            let storage = JsonStorage::open(&dir.path().join("db.json")).unwrap();
            let data = raw_database(count);

            b.iter(|| {
                storage.write(black_box(&data)).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark pretty-printed, key-sorted writes.
fn bench_json_write_pretty(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let config = JsonStorageConfig::new().indent(4).sort_keys(true);
    let storage = JsonStorage::open_with_config(&dir.path().join("db.json"), config).unwrap();
    let data = raw_database(100);

    c.bench_function("json_write_pretty", |b| {
        b.iter(|| {
            storage.write(black_box(&data)).unwrap();
        });
    });
}

/// Benchmark whole-database reads from a JSON file.
fn bench_json_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_read");

    for count in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let dir = TempDir::new().unwrap();
            let storage = JsonStorage::open(&dir.path().join("db.json")).unwrap();
            storage.write(&raw_database(count)).unwrap();

            b.iter(|| {
                black_box(storage.read().unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark buffered writes through the caching middleware.
fn bench_caching_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("caching_write");

    for cache_size in [1usize, 10, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(cache_size),
            cache_size,
            |b, &cache_size| {
                let dir = TempDir::new().unwrap();
                let file = JsonStorage::open(&dir.path().join("db.json")).unwrap();
                let storage = CachingMiddleware::with_write_cache_size(file, cache_size);
                let data = raw_database(100);

                b.iter(|| {
                    storage.write(black_box(&data)).unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark in-memory reads.
fn bench_memory_read(c: &mut Criterion) {
    let storage = MemoryStorage::with_data(raw_database(1000));
    c.bench_function("memory_read_1000", |b| {
        b.iter(|| {
            black_box(storage.read().unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_json_write,
    bench_json_write_pretty,
    bench_json_read,
    bench_caching_write,
    bench_memory_read
);
criterion_main!(benches);
