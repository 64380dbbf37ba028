//! Table operation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flata_bench::{populated_table, random_document, random_documents};
use flata_core::query::field;
use flata_core::{Database, DocId, Update};

/// Benchmark single document inserts.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for existing in [0usize, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(existing),
            existing,
            |b, &existing| {
                let (_db, table) = populated_table(existing);
                let doc = random_document();
                b.iter(|| {
                    table.insert(black_box(&doc)).unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark batch inserts.
fn bench_insert_multiple(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_multiple");

    for batch_size in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let docs = random_documents(batch_size);
                b.iter(|| {
                    let db = Database::open_in_memory();
                    let table = db.table("bench").unwrap();
                    table.insert_multiple(black_box(docs.iter())).unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark repeated searches, served from the cache after the first.
fn bench_search_cached(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_cached");

    for size in [100usize, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (_db, table) = populated_table(size);
            let cond = field("age").ge(50) & field("active").eq(true);
            b.iter(|| {
                black_box(table.search(&cond).unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark searches that always scan.
fn bench_search_uncached(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_uncached");

    for size in [100usize, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (_db, table) = populated_table(size);
            let cond = field("age").ge(50) & field("active").eq(true);
            b.iter(|| {
                table.clear_cache();
                black_box(table.search(&cond).unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark merge updates by condition.
fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");

    for size in [100usize, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (_db, table) = populated_table(size);
            let cond = field("age").lt(10);
            b.iter(|| {
                let update = Update::merge(&serde_json::json!({"flag": true})).unwrap();
                black_box(table.update(update, cond.clone()).unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark point lookups by identity.
fn bench_get_by_id(c: &mut Criterion) {
    let (_db, table) = populated_table(1000);
    c.bench_function("get_by_id", |b| {
        b.iter(|| {
            black_box(table.get_by_id(black_box(500u64)).unwrap());
        });
    });

    c.bench_function("contains_ids", |b| {
        let ids = [DocId::new(1001), DocId::new(999)];
        b.iter(|| {
            black_box(table.contains_ids(black_box(ids)).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_insert_multiple,
    bench_search_cached,
    bench_search_uncached,
    bench_update,
    bench_get_by_id
);
criterion_main!(benches);
