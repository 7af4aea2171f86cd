//! # Database Facade
//!
//! The public surface: open (creating on first use), register and fetch
//! collections, append vectors, flush, close. One `Database` owns one
//! pager and therefore one file; the engine is single-threaded and
//! single-writer by contract.
//!
//! Durability note: pages reach disk when they are evicted or flushed,
//! and the file is synced on close. There is no journal; a crash between
//! flushes can lose recent appends.

mod builder;
mod collection;

pub use builder::DatabaseBuilder;
pub use collection::Collection;

use std::path::Path;

use eyre::Result;

use crate::catalog::CollectionDirectory;
use crate::records::CollectionRecord;
use crate::storage::{FlushMode, Pager};

#[derive(Debug)]
pub struct Database {
    pager: Pager,
    directory: CollectionDirectory,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Open `path` with default settings, creating the file if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().path(path).open()
    }

    pub(crate) fn open_with_config(
        path: &Path,
        page_size: u32,
        cache_size: u32,
    ) -> Result<Self> {
        let pager = Pager::open_or_create(path, page_size, cache_size)?;
        let first_page = pager.meta()?.first_collection_page();
        Ok(Self {
            pager,
            directory: CollectionDirectory::new(first_page),
        })
    }

    /// Register a new collection of fixed-dimensional vectors.
    pub fn create_collection(&mut self, id: u32, dimensions: u32) -> Result<Collection<'_>> {
        eyre::ensure!(dimensions > 0, "collection dimensions must be nonzero");

        let record = CollectionRecord::new(id, dimensions);
        self.directory.add(&mut self.pager, &record)?;
        Ok(Collection::new(&mut self.pager, &self.directory, record))
    }

    /// Fetch an existing collection by id.
    pub fn collection(&mut self, id: u32) -> Result<Collection<'_>> {
        let record = self.directory.get(&mut self.pager, id)?;
        Ok(Collection::new(&mut self.pager, &self.directory, record))
    }

    /// Ids of every registered collection, in insertion order.
    pub fn collection_ids(&mut self) -> Result<Vec<u32>> {
        Ok(self
            .directory
            .collections(&mut self.pager)?
            .iter()
            .map(|record| record.id)
            .collect())
    }

    /// Write every dirty page back to the file.
    pub fn flush(&mut self) -> Result<()> {
        self.pager.flush(FlushMode::Hard)
    }

    /// Flush, drain the cache and sync the file.
    pub fn close(self) -> Result<()> {
        self.pager.close()
    }

    /// Total pages allocated in the file.
    pub fn page_count(&self) -> Result<u32> {
        self.pager.page_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::VectorRecord;
    use tempfile::tempdir;

    #[test]
    fn create_collection_then_fetch() {
        let dir = tempdir().unwrap();
        let mut db = Database::open(dir.path().join("db")).unwrap();

        db.create_collection(1, 3).unwrap();

        let coll = db.collection(1).unwrap();
        assert_eq!(coll.id(), 1);
        assert_eq!(coll.dimensions(), 3);
    }

    #[test]
    fn duplicate_collection_fails() {
        let dir = tempdir().unwrap();
        let mut db = Database::open(dir.path().join("db")).unwrap();

        db.create_collection(1, 3).unwrap();
        let result = db.create_collection(1, 4);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("already exists"));

        // The original record is untouched by the failed attempt.
        assert_eq!(db.collection(1).unwrap().dimensions(), 3);
    }

    #[test]
    fn unknown_collection_fails() {
        let dir = tempdir().unwrap();
        let mut db = Database::open(dir.path().join("db")).unwrap();

        let result = db.collection(4);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let dir = tempdir().unwrap();
        let mut db = Database::open(dir.path().join("db")).unwrap();

        assert!(db.create_collection(1, 0).is_err());
    }

    #[test]
    fn collection_ids_in_insertion_order() {
        let dir = tempdir().unwrap();
        let mut db = Database::open(dir.path().join("db")).unwrap();

        db.create_collection(3, 2).unwrap();
        db.create_collection(1, 2).unwrap();
        db.create_collection(2, 2).unwrap();

        assert_eq!(db.collection_ids().unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn create_collection_returns_a_usable_handle() {
        let dir = tempdir().unwrap();
        let mut db = Database::open(dir.path().join("db")).unwrap();

        let mut coll = db.create_collection(1, 2).unwrap();
        coll.add(&VectorRecord::new(10, vec![0.5, 0.75])).unwrap();

        assert_eq!(db.collection(1).unwrap().vectors().unwrap().len(), 1);
    }
}
