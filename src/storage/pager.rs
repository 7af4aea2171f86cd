//! # Pager
//!
//! Glues file storage, buffer pool and page cache together. The pager is
//! the only component that allocates pages, and every page access runs
//! through its pin protocol: `get_page`/`new_page` pin, `page`/`page_mut`
//! touch the bytes, `release_page` unpins.
//!
//! On open the metadata page is read, validated and inserted pinned; it
//! stays pinned (and therefore resident) until shutdown. `new_page` takes
//! the next page number from the metadata page and bumps the count, so
//! allocation and the authoritative page count can never drift apart.
//!
//! ## Flushing
//!
//! - `FlushMode::Soft` evicts the whole unpinned LRU list, writing dirty
//!   pages back.
//! - `FlushMode::Hard` additionally writes pinned dirty pages back in
//!   place; entries stay resident and the engine remains usable.
//! - `close` performs a hard flush, drains the cache entirely and syncs
//!   the file. `Drop` does the same best-effort.

use std::path::Path;

use eyre::{bail, ensure, eyre, Result};

use crate::config::{DIRECTORY_PAGE, METADATA_PAGE};
use crate::records::{CollectionRecord, Record, COLLECTION_RECORD_SIZE};

use super::cache::{CacheEntry, PageCache, PageState};
use super::file::FileStorage;
use super::headers::MetadataHeader;
use super::item_page::ItemPageMut;
use super::pool::PagePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// Evict and write back every unpinned page.
    Soft,
    /// Soft, plus write pinned dirty pages back in place.
    Hard,
}

#[derive(Debug)]
pub struct Pager {
    storage: FileStorage,
    pool: PagePool,
    cache: PageCache,
}

impl Pager {
    /// Open an existing database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::bootstrap(FileStorage::open(path)?)
    }

    /// Create a new database file and allocate its first
    /// collection-directory page.
    pub fn create<P: AsRef<Path>>(path: P, page_size: u32, cache_size: u32) -> Result<Self> {
        let storage = FileStorage::create(path, page_size, cache_size)?;
        let mut pager = Self::bootstrap(storage)?;

        let directory =
            pager.new_page::<CollectionRecord>(0, COLLECTION_RECORD_SIZE as u32)?;
        debug_assert_eq!(directory, DIRECTORY_PAGE);
        pager.release_page(directory);
        Ok(pager)
    }

    pub fn open_or_create<P: AsRef<Path>>(
        path: P,
        page_size: u32,
        cache_size: u32,
    ) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path, page_size, cache_size)
        }
    }

    fn bootstrap(mut storage: FileStorage) -> Result<Self> {
        let pool = PagePool::new(storage.page_size() as usize);

        let mut buf = pool.acquire();
        storage.read_page(METADATA_PAGE, &mut buf)?;
        let cache_size = MetadataHeader::from_page(&buf)?.cache_size();

        let mut cache = PageCache::new((cache_size as usize).max(1));
        // The cache is empty; nothing can be evicted by this insert.
        cache.insert(
            CacheEntry::new(METADATA_PAGE, 1, PageState::Dirty, buf),
            |_, _| Ok(()),
        )?;

        Ok(Self {
            storage,
            pool,
            cache,
        })
    }

    /// Typed view of the pinned metadata page.
    pub fn meta(&self) -> Result<&MetadataHeader> {
        let data = self
            .cache
            .data(METADATA_PAGE)
            .ok_or_else(|| eyre!("metadata page is not resident"))?;
        MetadataHeader::from_page(data)
    }

    pub fn meta_mut(&mut self) -> Result<&mut MetadataHeader> {
        let data = self
            .cache
            .data_mut(METADATA_PAGE)
            .ok_or_else(|| eyre!("metadata page is not resident"))?;
        MetadataHeader::from_page_mut(data)
    }

    /// Total pages allocated in the file.
    pub fn page_count(&self) -> Result<u32> {
        Ok(self.meta()?.page_count())
    }

    pub fn page_size(&self) -> u32 {
        self.storage.page_size()
    }

    /// Allocate a fresh item page at the end of the file. Returns the new
    /// page number, pinned and dirty; the caller releases it.
    pub fn new_page<R: Record>(&mut self, prev_page: u32, item_size: u32) -> Result<u32> {
        let mut buf = self.pool.acquire();
        buf.fill(0);

        let page_num = self.meta()?.page_count();
        ItemPageMut::<R>::init(&mut buf, page_num, prev_page, item_size)?;
        self.meta_mut()?.set_page_count(page_num + 1);

        let storage = &mut self.storage;
        self.cache.insert(
            CacheEntry::new(page_num, 1, PageState::Dirty, buf),
            |num, data| storage.write_page(num, data),
        )?;
        Ok(page_num)
    }

    /// Pin a page, loading it from disk on a cache miss. The stored type
    /// tag must match the requested record kind.
    pub fn get_page<R: Record>(&mut self, page_num: u32) -> Result<()> {
        let page_count = self.meta()?.page_count();
        ensure!(
            page_num < page_count,
            "page {} out of bounds (page count {})",
            page_num,
            page_count
        );

        if self.cache.pin(page_num) {
            let tag = self.page(page_num)?[0];
            if tag != R::PAGE_TYPE as u8 {
                self.cache.release(page_num);
                bail!(
                    "wrong page type for page {}: expected {:?}, found {:#04x}",
                    page_num,
                    R::PAGE_TYPE,
                    tag
                );
            }
            return Ok(());
        }

        let mut buf = self.pool.acquire();
        self.storage.read_page(page_num, &mut buf)?;
        ensure!(
            buf[0] == R::PAGE_TYPE as u8,
            "wrong page type for page {}: expected {:?}, found {:#04x}",
            page_num,
            R::PAGE_TYPE,
            buf[0]
        );

        let storage = &mut self.storage;
        self.cache.insert(
            CacheEntry::new(page_num, 1, PageState::Clean, buf),
            |num, data| storage.write_page(num, data),
        )?;
        Ok(())
    }

    pub fn release_page(&mut self, page_num: u32) {
        self.cache.release(page_num);
    }

    pub fn mark_dirty(&mut self, page_num: u32) {
        self.cache.mark_dirty(page_num);
    }

    /// Bytes of a resident page.
    pub fn page(&self, page_num: u32) -> Result<&[u8]> {
        self.cache
            .data(page_num)
            .ok_or_else(|| eyre!("page {} is not resident in the cache", page_num))
    }

    /// Mutable bytes of a resident page; marks it dirty.
    pub fn page_mut(&mut self, page_num: u32) -> Result<&mut [u8]> {
        self.cache
            .data_mut(page_num)
            .ok_or_else(|| eyre!("page {} is not resident in the cache", page_num))
    }

    /// Whether a page is resident without touching disk or pin state.
    pub fn cached(&self, page_num: u32) -> bool {
        self.cache.contains(page_num)
    }

    pub fn flush(&mut self, mode: FlushMode) -> Result<()> {
        {
            let storage = &mut self.storage;
            self.cache.flush(|num, data| storage.write_page(num, data))?;
        }
        if mode == FlushMode::Hard {
            let storage = &mut self.storage;
            self.cache
                .write_back_pinned(|num, data| storage.write_page(num, data))?;
        }
        Ok(())
    }

    /// Hard flush, drain the cache and sync the file.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        {
            let storage = &mut self.storage;
            self.cache.clear(|num, data| storage.write_page(num, data))?;
        }
        self.storage.sync()
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
