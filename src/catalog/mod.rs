//! # Collection Directory
//!
//! The catalog of named collections, stored as a chain of collection
//! item pages anchored at page 1. Lookups are linear scans of the chain;
//! the directory is expected to stay small (a handful of collections),
//! so no secondary structure is kept in memory.

use eyre::{ensure, eyre, Result};

use crate::records::CollectionRecord;
use crate::storage::{ChainAppender, ChainCursor, ItemPageMut, Pager};

/// Where a directory scan found a record.
struct DirectorySlot {
    record: CollectionRecord,
    page_num: u32,
    index: u32,
}

#[derive(Debug)]
pub struct CollectionDirectory {
    first_page: u32,
}

impl CollectionDirectory {
    pub fn new(first_page: u32) -> Self {
        Self { first_page }
    }

    pub fn first_page(&self) -> u32 {
        self.first_page
    }

    /// Register a new collection. Ids are unique across the directory.
    pub fn add(&self, pager: &mut Pager, record: &CollectionRecord) -> Result<()> {
        ensure!(
            self.find(pager, record.id)?.is_none(),
            "collection {} already exists",
            record.id
        );

        ChainAppender::<CollectionRecord>::new(pager, self.first_page)?.append(record)
    }

    pub fn get(&self, pager: &mut Pager, id: u32) -> Result<CollectionRecord> {
        self.find(pager, id)?
            .map(|slot| slot.record)
            .ok_or_else(|| eyre!("collection {id} not found"))
    }

    /// Overwrite the stored record for `record.id` in place.
    pub fn update(&self, pager: &mut Pager, record: &CollectionRecord) -> Result<()> {
        let slot = self
            .find(pager, record.id)?
            .ok_or_else(|| eyre!("collection {} not found", record.id))?;

        pager.get_page::<CollectionRecord>(slot.page_num)?;
        let result = ItemPageMut::<CollectionRecord>::new(pager.page_mut(slot.page_num)?)
            .and_then(|mut page| page.update(slot.index, record));
        pager.release_page(slot.page_num);
        result
    }

    /// Every registered collection, in insertion order.
    pub fn collections(&self, pager: &mut Pager) -> Result<Vec<CollectionRecord>> {
        let mut cursor = ChainCursor::<CollectionRecord>::new(pager, self.first_page)?;
        let mut records = Vec::new();
        cursor.for_each(|record| {
            records.push(record);
            Ok(true)
        })?;
        Ok(records)
    }

    fn find(&self, pager: &mut Pager, id: u32) -> Result<Option<DirectorySlot>> {
        let mut cursor = ChainCursor::<CollectionRecord>::new(pager, self.first_page)?;
        loop {
            if let Some(record) = cursor.current()? {
                if record.id == id {
                    return Ok(Some(DirectorySlot {
                        record,
                        page_num: cursor.page_num(),
                        index: cursor.index(),
                    }));
                }
            }
            if !cursor.advance()? {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DIRECTORY_PAGE;
    use tempfile::tempdir;

    fn scratch() -> (Pager, CollectionDirectory, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let pager = Pager::create(dir.path().join("db"), 256, 32).unwrap();
        (pager, CollectionDirectory::new(DIRECTORY_PAGE), dir)
    }

    #[test]
    fn add_then_get() {
        let (mut pager, directory, _dir) = scratch();

        directory
            .add(&mut pager, &CollectionRecord::new(1, 3))
            .unwrap();
        directory
            .add(&mut pager, &CollectionRecord::new(2, 128))
            .unwrap();

        let record = directory.get(&mut pager, 2).unwrap();
        assert_eq!(record.dimensions, 128);
        assert_eq!(record.first_child_page, 0);
    }

    #[test]
    fn duplicate_id_is_rejected_and_the_original_kept() {
        let (mut pager, directory, _dir) = scratch();

        directory
            .add(&mut pager, &CollectionRecord::new(1, 3))
            .unwrap();
        let result = directory.add(&mut pager, &CollectionRecord::new(1, 4));

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("already exists"));
        assert_eq!(directory.get(&mut pager, 1).unwrap().dimensions, 3);
    }

    #[test]
    fn get_unknown_id_fails() {
        let (mut pager, directory, _dir) = scratch();

        let result = directory.get(&mut pager, 99);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn update_overwrites_in_place() {
        let (mut pager, directory, _dir) = scratch();

        directory
            .add(&mut pager, &CollectionRecord::new(1, 3))
            .unwrap();

        let mut record = directory.get(&mut pager, 1).unwrap();
        record.first_child_page = 9;
        directory.update(&mut pager, &record).unwrap();

        let reread = directory.get(&mut pager, 1).unwrap();
        assert_eq!(reread.first_child_page, 9);
        assert_eq!(directory.collections(&mut pager).unwrap().len(), 1);
    }

    #[test]
    fn update_unknown_id_fails() {
        let (mut pager, directory, _dir) = scratch();

        let result = directory.update(&mut pager, &CollectionRecord::new(7, 3));

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn collections_come_back_in_insertion_order() {
        let (mut pager, directory, _dir) = scratch();

        for id in [5u32, 2, 9, 1] {
            directory
                .add(&mut pager, &CollectionRecord::new(id, 3))
                .unwrap();
        }

        let ids: Vec<u32> = directory
            .collections(&mut pager)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![5, 2, 9, 1]);
    }

    #[test]
    fn directory_grows_past_one_page() {
        let (mut pager, directory, _dir) = scratch();

        // 256-byte pages hold 16 collection records; push past that.
        let slots = crate::storage::slot_capacity(256, 14);
        for id in 0..slots + 4 {
            directory
                .add(&mut pager, &CollectionRecord::new(id, 3))
                .unwrap();
        }

        let all = directory.collections(&mut pager).unwrap();
        assert_eq!(all.len(), (slots + 4) as usize);
        assert_eq!(directory.get(&mut pager, slots + 1).unwrap().id, slots + 1);
    }
}
