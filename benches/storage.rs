use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;
use veldb::{Database, VectorRecord};

fn bench_vector_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_insert");

    for dimensions in [8u32, 128] {
        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(
            BenchmarkId::from_parameter(dimensions),
            &dimensions,
            |b, &dimensions| {
                b.iter_with_setup(
                    || {
                        let dir = TempDir::new().unwrap();
                        let mut db = Database::builder()
                            .path(dir.path().join("bench.veldb"))
                            .cache_size(256)
                            .open()
                            .unwrap();
                        db.create_collection(1, dimensions).unwrap();
                        (db, dir)
                    },
                    |(mut db, _dir)| {
                        let mut coll = db.collection(1).unwrap();
                        let position = vec![0.5f32; dimensions as usize];
                        for id in 0..1000 {
                            coll.add(&VectorRecord::new(id, position.clone())).unwrap();
                        }
                    },
                );
            },
        );
    }

    group.finish();
}

fn bench_chain_scan(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let mut db = Database::builder()
        .path(dir.path().join("bench.veldb"))
        .cache_size(256)
        .open()
        .unwrap();
    db.create_collection(1, 32).unwrap();
    {
        let mut coll = db.collection(1).unwrap();
        for id in 0..10_000 {
            coll.add(&VectorRecord::new(id, vec![0.25f32; 32])).unwrap();
        }
    }
    db.flush().unwrap();

    c.bench_function("chain_scan_10k", |b| {
        b.iter(|| {
            let vectors = db.collection(1).unwrap().vectors().unwrap();
            assert_eq!(vectors.len(), 10_000);
        });
    });
}

criterion_group!(benches, bench_vector_insert, bench_chain_scan);
criterion_main!(benches);
