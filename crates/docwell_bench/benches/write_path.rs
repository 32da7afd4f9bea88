//! Write coordinator benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docwell_bench::{generate_documents, random_document};
use docwell_core::query::field;
use docwell_core::{doc, Database, Filter, IndexKind, RemoveOptions, UpdateOptions};
use rand::Rng;

/// Benchmark single document inserts with generated ids.
fn bench_single_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_insert");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let db = Database::new();
            let collection = db.collection("bench").unwrap();
            let document = random_document(size);

            b.iter(|| {
                collection
                    .insert(std::iter::once(black_box(document.clone())))
                    .unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark batch inserts into a fresh collection.
fn bench_batch_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_insert");

    for batch_size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let documents = generate_documents(batch_size, 256);

                b.iter(|| {
                    let db = Database::new();
                    let collection = db.collection("bench").unwrap();
                    collection.insert(black_box(documents.clone())).unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark inserts with indexes to maintain.
fn bench_indexed_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexed_insert");

    for index_count in [0usize, 1, 3].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(index_count),
            index_count,
            |b, &index_count| {
                let db = Database::new();
                let collection = db.collection("bench").unwrap();
                for name in ["age", "team", "name"].iter().take(index_count) {
                    collection.create_index(name, IndexKind::NonUnique).unwrap();
                }
                let document = random_document(128);

                b.iter(|| {
                    collection
                        .insert(std::iter::once(black_box(document.clone())))
                        .unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark single document updates by id.
fn bench_update_by_id(c: &mut Criterion) {
    let db = Database::new();
    let collection = db.collection("bench").unwrap();
    collection.create_index("age", IndexKind::NonUnique).unwrap();
    let documents = generate_documents(10_000, 128);
    let ids: Vec<_> = collection.insert(documents).unwrap().into_iter().collect();

    c.bench_function("update_by_id", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let id = ids[rng.gen_range(0..ids.len())];
            collection
                .update(
                    Some(&Filter::by_id(id)),
                    &doc! { "age" => rng.gen_range(18i64..90) },
                    UpdateOptions::new().just_once(true),
                )
                .unwrap();
        });
    });
}

/// Benchmark filtered multi-document updates.
fn bench_update_many(c: &mut Criterion) {
    let db = Database::new();
    let collection = db.collection("bench").unwrap();
    collection.create_index("team", IndexKind::NonUnique).unwrap();
    collection.insert(generate_documents(3_000, 64)).unwrap();

    c.bench_function("update_team", |b| {
        let filter = field("team").eq("red");
        b.iter(|| {
            collection
                .update(Some(&filter), &doc! { "seen" => true }, UpdateOptions::default())
                .unwrap();
        });
    });
}

/// Benchmark insert followed by remove.
fn bench_insert_remove(c: &mut Criterion) {
    let db = Database::new();
    let collection = db.collection("bench").unwrap();
    let document = random_document(256);

    c.bench_function("insert_remove", |b| {
        b.iter(|| {
            let id = collection
                .insert(std::iter::once(document.clone()))
                .unwrap()
                .first()
                .unwrap();
            collection
                .remove(Some(&Filter::by_id(id)), RemoveOptions::new().just_one(true))
                .unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_single_insert,
    bench_batch_insert,
    bench_indexed_insert,
    bench_update_by_id,
    bench_update_many,
    bench_insert_remove,
);

criterion_main!(benches);
