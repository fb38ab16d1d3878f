//! Benchmarks for inserts, many-to-many selects and live query dispatch.

use cairn_database::{
    ColumnType, Database, InsertQuery, Predicate, Record, Relation, Schema, SelectCriterion,
    SelectQuery, TableBuilder, UpdateQuery,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn studio() -> Database {
    let masters = TableBuilder::new("Masters")
        .unwrap()
        .add_column("id", ColumnType::String)
        .unwrap()
        .add_column("title", ColumnType::String)
        .unwrap()
        .add_relation(Relation::many_to_many(
            "viewports",
            "Viewports",
            "MasterViewportJunction",
            "masterId",
            "viewportId",
        ))
        .unwrap()
        .build()
        .unwrap();
    let viewports = TableBuilder::new("Viewports")
        .unwrap()
        .add_column("id", ColumnType::String)
        .unwrap()
        .add_column("width", ColumnType::Integer)
        .unwrap()
        .build()
        .unwrap();
    Database::new(Schema::new("bench").table(masters).table(viewports)).unwrap()
}

fn masters(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            Record::new()
                .with("id", format!("m{}", i))
                .with("title", format!("Master {}", i))
        })
        .collect()
}

/// Every master linked to `per_master` viewports.
fn populate(db: &Database, count: usize, per_master: usize) {
    db.insert(&InsertQuery::new("Masters", masters(count))).unwrap();
    let viewports = (0..count * per_master)
        .map(|i| {
            Record::new()
                .with("id", format!("v{}", i))
                .with("width", (i % 1920) as i64)
        })
        .collect();
    db.insert(&InsertQuery::new("Viewports", viewports)).unwrap();
    let links = (0..count)
        .flat_map(|m| {
            (0..per_master).map(move |k| {
                let v = m * per_master + k;
                Record::new()
                    .with("id", format!("m{}.v{}", m, v))
                    .with("masterId", format!("m{}", m))
                    .with("viewportId", format!("v{}", v))
            })
        })
        .collect();
    db.insert(&InsertQuery::new("MasterViewportJunction", links)).unwrap();
}

fn insert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for size in [100usize, 1000] {
        group.bench_with_input(BenchmarkId::new("rows", size), &size, |b, &size| {
            b.iter_batched(
                || (studio(), InsertQuery::new("Masters", masters(size))),
                |(db, query)| black_box(db.insert(&query).unwrap()),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn select_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_many_to_many");
    for size in [100usize, 1000] {
        let db = studio();
        populate(&db, size, 4);
        let query = SelectQuery::new("Masters", SelectCriterion::new().include("viewports"));
        let filtered = SelectQuery::new(
            "Masters",
            SelectCriterion::new()
                .include("viewports")
                .predicate(Predicate::eq("id", "m7")),
        );

        group.bench_with_input(BenchmarkId::new("all", size), &size, |b, _| {
            b.iter(|| black_box(db.select(&query).unwrap().len()))
        });
        group.bench_with_input(BenchmarkId::new("filtered", size), &size, |b, _| {
            b.iter(|| black_box(db.select(&filtered).unwrap().len()))
        });
    }
    group.finish();
}

fn observe_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("observe_dispatch");
    for subscribers in [1usize, 100] {
        let db = studio();
        populate(&db, 100, 2);
        let query = SelectQuery::new("Masters", SelectCriterion::new().include("viewports"));
        let subs: Vec<_> = (0..subscribers)
            .map(|_| db.observe(&query, || {}).unwrap())
            .collect();
        let update = UpdateQuery::new("Viewports")
            .set("width", 640i64)
            .filter(Predicate::eq("id", "v3"));

        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            &subscribers,
            |b, _| b.iter(|| black_box(db.update(&update).unwrap())),
        );
        for sub in &subs {
            sub.unsubscribe().unwrap();
        }
    }
    group.finish();
}

criterion_group!(benches, insert_benchmark, select_benchmark, observe_benchmark);
criterion_main!(benches);
