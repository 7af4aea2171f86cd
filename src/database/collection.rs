//! # Collection Handle
//!
//! A borrowed view of one registered collection. The handle validates
//! vector dimensions, lazily allocates the collection's first vector
//! page, and routes appends through the collection's index kind.

use eyre::{ensure, Result};

use crate::catalog::CollectionDirectory;
use crate::index::{FlatIndex, IvfIndex, VectorIndex};
use crate::records::{CollectionRecord, IndexKind, VectorRecord};
use crate::storage::Pager;

pub struct Collection<'db> {
    pager: &'db mut Pager,
    directory: &'db CollectionDirectory,
    record: CollectionRecord,
}

impl<'db> std::fmt::Debug for Collection<'db> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl<'db> Collection<'db> {
    pub(crate) fn new(
        pager: &'db mut Pager,
        directory: &'db CollectionDirectory,
        record: CollectionRecord,
    ) -> Self {
        Self {
            pager,
            directory,
            record,
        }
    }

    pub fn id(&self) -> u32 {
        self.record.id
    }

    pub fn dimensions(&self) -> u32 {
        self.record.dimensions
    }

    /// Append one vector. The position length must equal the collection's
    /// dimension count; a mismatch fails before any page is touched.
    pub fn add(&mut self, vector: &VectorRecord) -> Result<()> {
        ensure!(
            vector.position.len() as u32 == self.record.dimensions,
            "dimension mismatch for collection {}: expected {}, got {}",
            self.record.id,
            self.record.dimensions,
            vector.position.len()
        );

        if self.record.first_child_page == 0 {
            self.allocate_first_vector_page()?;
        }

        let mut index = self.open_index()?;
        index.add(self.pager, vector)
    }

    /// Every stored vector, in insertion order.
    pub fn vectors(&mut self) -> Result<Vec<VectorRecord>> {
        if self.record.first_child_page == 0 {
            return Ok(Vec::new());
        }
        FlatIndex::open(self.record.first_child_page).vectors(self.pager)
    }

    /// First append to the collection: allocate the vector chain's head
    /// page and persist its number in the directory record.
    fn allocate_first_vector_page(&mut self) -> Result<()> {
        let item_size = VectorRecord::item_size(self.record.dimensions);
        let page_num = self.pager.new_page::<VectorRecord>(0, item_size)?;
        self.pager.release_page(page_num);

        self.record.first_child_page = page_num;
        self.directory.update(self.pager, &self.record)
    }

    fn open_index(&mut self) -> Result<Box<dyn VectorIndex>> {
        Ok(match self.record.index_kind {
            IndexKind::Flat => Box::new(FlatIndex::open(self.record.first_child_page)),
            IndexKind::Ivf => Box::new(IvfIndex::open(self.record.first_child_page)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use tempfile::tempdir;

    fn scratch() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::builder()
            .path(dir.path().join("db"))
            .page_size(256)
            .cache_size(32)
            .open()
            .unwrap();
        (db, dir)
    }

    #[test]
    fn first_add_allocates_the_vector_chain() {
        let (mut db, _dir) = scratch();
        db.create_collection(1, 3).unwrap();

        let before = db.page_count().unwrap();
        {
            let mut coll = db.collection(1).unwrap();
            coll.add(&VectorRecord::new(1, vec![1.0, 2.0, 3.0])).unwrap();
        }

        assert_eq!(db.page_count().unwrap(), before + 1);

        // The second add reuses the chain.
        {
            let mut coll = db.collection(1).unwrap();
            coll.add(&VectorRecord::new(2, vec![4.0, 5.0, 6.0])).unwrap();
        }
        assert_eq!(db.page_count().unwrap(), before + 1);
    }

    #[test]
    fn dimension_mismatch_leaves_no_trace() {
        let (mut db, _dir) = scratch();
        db.create_collection(1, 4).unwrap();

        let before = db.page_count().unwrap();
        {
            let mut coll = db.collection(1).unwrap();
            let result = coll.add(&VectorRecord::new(1, vec![1.0, 2.0, 3.0]));
            assert!(result.is_err());
            assert!(result
                .unwrap_err()
                .to_string()
                .contains("dimension mismatch"));
        }

        assert_eq!(db.page_count().unwrap(), before);
        assert!(db.collection(1).unwrap().vectors().unwrap().is_empty());

        // A correctly sized vector still goes in afterwards.
        let mut coll = db.collection(1).unwrap();
        coll.add(&VectorRecord::new(1, vec![1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        assert_eq!(coll.vectors().unwrap().len(), 1);
    }

    #[test]
    fn vectors_on_an_empty_collection() {
        let (mut db, _dir) = scratch();
        db.create_collection(1, 3).unwrap();

        let mut coll = db.collection(1).unwrap();
        assert!(coll.vectors().unwrap().is_empty());
    }

    #[test]
    fn collections_keep_separate_chains() {
        let (mut db, _dir) = scratch();
        db.create_collection(1, 2).unwrap();
        db.create_collection(2, 2).unwrap();

        for id in 0..20 {
            let mut coll = db.collection(1 + id % 2).unwrap();
            coll.add(&VectorRecord::new(id, vec![id as f32, 0.0])).unwrap();
        }

        let mut coll1 = db.collection(1).unwrap();
        let ids1: Vec<u32> = coll1.vectors().unwrap().iter().map(|v| v.id).collect();
        assert_eq!(ids1, vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);

        let mut coll2 = db.collection(2).unwrap();
        let ids2: Vec<u32> = coll2.vectors().unwrap().iter().map(|v| v.id).collect();
        assert_eq!(ids2, vec![1, 3, 5, 7, 9, 11, 13, 15, 17, 19]);
    }
}
