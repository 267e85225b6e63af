//! Benchmarks for pagedb table operations

use std::collections::BTreeMap;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use pagedb::config::Config;
use pagedb::{Database, Field, FieldType, Record, Value};
use tempfile::TempDir;

const ROWS: i64 = 500;

fn fields() -> Vec<Field> {
    vec![
        Field::new("id", FieldType::Integer),
        Field::new("name", FieldType::Text),
    ]
}

fn record(id: i64) -> Record {
    BTreeMap::from([
        ("id".to_string(), Value::Int(id)),
        ("name".to_string(), Value::Text(format!("name-{}", id))),
    ])
}

/// A database with one table of `rows` records
fn populated(rows: i64) -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).build();
    let mut db = Database::open(config).unwrap();
    let mut table = db.create_table("bench", fields(), "id").unwrap();
    for id in 0..rows {
        table.insert(record(id)).unwrap();
    }
    drop(table);
    (temp_dir, db)
}

fn table_benchmarks(c: &mut Criterion) {
    c.bench_function("insert_500", |b| {
        b.iter_batched(
            || populated(0),
            |(_temp, mut db)| {
                let mut table = db.table("bench").unwrap();
                for id in 0..ROWS {
                    table.insert(record(id)).unwrap();
                }
            },
            BatchSize::PerIteration,
        )
    });

    let (_temp, mut db) = populated(ROWS);
    c.bench_function("get_by_key", |b| {
        let table = db.table("bench").unwrap();
        let mut id = 0;
        b.iter(|| {
            id = (id + 37) % ROWS;
            table.get(&Value::Int(id)).unwrap()
        })
    });

    c.bench_function("delete_with_compaction", |b| {
        b.iter_batched(
            || populated(ROWS),
            |(_temp, mut db)| {
                let mut table = db.table("bench").unwrap();
                // Front deletions force a swap with the tail every time
                for id in 0..50 {
                    table.delete(&Value::Int(id)).unwrap();
                }
            },
            BatchSize::PerIteration,
        )
    });

    c.bench_function("scan_all", |b| {
        let table = db.table("bench").unwrap();
        b.iter(|| table.scan(&[]).unwrap().len())
    });
}

criterion_group!(benches, table_benchmarks);
criterion_main!(benches);
