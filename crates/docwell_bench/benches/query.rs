//! Query resolution benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docwell_bench::generate_documents;
use docwell_core::query::field;
use docwell_core::{Database, IndexKind};

/// Compare indexed and scanned equality lookups.
fn bench_equality(c: &mut Criterion) {
    let mut group = c.benchmark_group("equality");

    for indexed in [false, true].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(if *indexed { "indexed" } else { "scan" }),
            indexed,
            |b, &indexed| {
                let db = Database::new();
                let collection = db.collection("bench").unwrap();
                if indexed {
                    collection.create_index("team", IndexKind::NonUnique).unwrap();
                }
                collection.insert(generate_documents(10_000, 64)).unwrap();
                let filter = field("team").eq("green");

                b.iter(|| {
                    let cursor = collection.find(Some(black_box(&filter))).unwrap();
                    black_box(cursor.size());
                });
            },
        );
    }
    group.finish();
}

/// Benchmark range queries over an index and draining the cursor.
fn bench_range(c: &mut Criterion) {
    let db = Database::new();
    let collection = db.collection("bench").unwrap();
    collection.create_index("age", IndexKind::NonUnique).unwrap();
    collection.insert(generate_documents(10_000, 64)).unwrap();
    let filter = field("age").gte(30).and(field("age").lt(40));

    c.bench_function("range_age", |b| {
        b.iter(|| {
            let documents = collection.find(Some(&filter)).unwrap().to_vec().unwrap();
            black_box(documents.len());
        });
    });
}

criterion_group!(benches, bench_equality, bench_range);
criterion_main!(benches);
