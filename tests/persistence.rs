//! End-to-end persistence tests through the public `Database` API:
//! create, insert, flush, reopen, read back.

use tempfile::TempDir;
use veldb::{Database, VectorRecord};

fn scratch_path() -> (std::path::PathBuf, TempDir) {
    let dir = TempDir::new().expect("failed to create temp directory");
    (dir.path().join("vectors.veldb"), dir)
}

#[test]
fn insert_flush_reopen_read() {
    let (path, _dir) = scratch_path();

    {
        let mut db = Database::open(&path).unwrap();
        db.create_collection(1, 3).unwrap();

        let mut coll = db.collection(1).unwrap();
        coll.add(&VectorRecord::new(1, vec![1.0, 2.0, 3.0])).unwrap();
        coll.add(&VectorRecord::new(2, vec![4.0, 5.0, 6.0])).unwrap();
        coll.add(&VectorRecord::new(3, vec![7.0, 8.0, 9.0])).unwrap();

        db.flush().unwrap();
        db.close().unwrap();
    }

    let mut db = Database::open(&path).unwrap();
    let mut coll = db.collection(1).unwrap();
    assert_eq!(coll.dimensions(), 3);

    let vectors = coll.vectors().unwrap();
    assert_eq!(vectors.len(), 3);
    assert_eq!(vectors[0], VectorRecord::new(1, vec![1.0, 2.0, 3.0]));
    assert_eq!(vectors[1], VectorRecord::new(2, vec![4.0, 5.0, 6.0]));
    assert_eq!(vectors[2], VectorRecord::new(3, vec![7.0, 8.0, 9.0]));
}

#[test]
fn position_bytes_roundtrip_exactly() {
    let (path, _dir) = scratch_path();

    let awkward = vec![
        f32::MIN_POSITIVE,
        -0.0,
        f32::MAX,
        1.0e-40, // subnormal
    ];

    {
        let mut db = Database::open(&path).unwrap();
        db.create_collection(9, 4).unwrap();
        db.collection(9)
            .unwrap()
            .add(&VectorRecord::new(1, awkward.clone()))
            .unwrap();
        db.close().unwrap();
    }

    let mut db = Database::open(&path).unwrap();
    let vectors = db.collection(9).unwrap().vectors().unwrap();

    assert_eq!(vectors.len(), 1);
    for (stored, original) in vectors[0].position.iter().zip(&awkward) {
        assert_eq!(stored.to_bits(), original.to_bits());
    }
}

#[test]
fn unflushed_appends_survive_through_eviction_pressure() {
    let (path, _dir) = scratch_path();

    {
        let mut db = Database::builder()
            .path(&path)
            .page_size(256)
            .cache_size(3)
            .open()
            .unwrap();
        db.create_collection(1, 3).unwrap();
        db.collection(1)
            .unwrap()
            .add(&VectorRecord::new(7, vec![0.1, 0.2, 0.3]))
            .unwrap();

        // No explicit flush: touching other collections forces the
        // vector page out of the tiny cache, which writes it back.
        for id in 2..8 {
            db.create_collection(id, 3).unwrap();
            db.collection(id)
                .unwrap()
                .add(&VectorRecord::new(id, vec![0.0, 0.0, 0.0]))
                .unwrap();
        }

        db.close().unwrap();
    }

    let mut db = Database::open(&path).unwrap();
    let vectors = db.collection(1).unwrap().vectors().unwrap();
    assert_eq!(vectors.len(), 1);
    assert_eq!(vectors[0].id, 7);
    assert_eq!(vectors[0].position, vec![0.1, 0.2, 0.3]);
}

#[test]
fn collections_survive_reopen() {
    let (path, _dir) = scratch_path();

    {
        let mut db = Database::open(&path).unwrap();
        db.create_collection(10, 2).unwrap();
        db.create_collection(20, 5).unwrap();
        db.close().unwrap();
    }

    let mut db = Database::open(&path).unwrap();
    assert_eq!(db.collection_ids().unwrap(), vec![10, 20]);
    assert_eq!(db.collection(20).unwrap().dimensions(), 5);

    // Registering a known id after reopen still collides.
    let result = db.create_collection(10, 2);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("already exists"));
}

#[test]
fn flush_makes_the_file_grow_with_the_page_count() {
    let (path, _dir) = scratch_path();

    let mut db = Database::builder()
        .path(&path)
        .page_size(256)
        .open()
        .unwrap();
    db.create_collection(1, 3).unwrap();
    let mut coll = db.collection(1).unwrap();
    for id in 0..30 {
        coll.add(&VectorRecord::new(id, vec![0.0, 0.0, 0.0])).unwrap();
    }
    db.flush().unwrap();

    let page_count = db.page_count().unwrap();
    let len = std::fs::metadata(&path).unwrap().len();
    assert!(len >= page_count as u64 * 256);
}
