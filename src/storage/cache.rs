//! # Reference-Counted LRU Page Cache
//!
//! Tracks every resident page buffer and decides which one gives way when
//! the cache is full. Entries carry a reference count: a page with
//! `refs > 0` is *pinned* and immune to eviction; only unpinned entries
//! sit on the LRU list. Releasing the last pin re-enters the entry at the
//! most-recently-used end.
//!
//! ## Write-Back
//!
//! Each entry is `Clean` or `Dirty`. Eviction hands dirty buffers to a
//! write-back closure supplied per call (the pager passes one that writes
//! through its file storage); clean buffers are dropped without I/O.
//! Dropping an entry returns its buffer to the page pool automatically.
//!
//! ## Capacity
//!
//! Capacity is a target, not a hard bound: when every entry is pinned an
//! insertion proceeds past nominal capacity, because refusing would wedge
//! the caller that already holds the pins.
//!
//! ## Invariants
//!
//! - every page number on the LRU list has `refs == 0`
//! - every pinned entry is in the map but not on the list
//! - the list is ordered MRU-first

use std::collections::{HashMap, VecDeque};

use eyre::{bail, Result};

use super::pool::PooledBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Clean,
    Dirty,
}

#[derive(Debug)]
pub struct CacheEntry {
    page_num: u32,
    refs: u32,
    state: PageState,
    buf: PooledBuffer,
}

impl CacheEntry {
    pub fn new(page_num: u32, refs: u32, state: PageState, buf: PooledBuffer) -> Self {
        Self {
            page_num,
            refs,
            state,
            buf,
        }
    }

    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    pub fn is_dirty(&self) -> bool {
        self.state == PageState::Dirty
    }
}

#[derive(Debug)]
pub struct PageCache {
    capacity: usize,
    entries: HashMap<u32, CacheEntry>,
    /// Unpinned page numbers, most recently used first.
    lru: VecDeque<u32>,
}

impl PageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            lru: VecDeque::new(),
        }
    }

    /// Pin a resident page. Returns false on a cache miss. The 0 -> 1
    /// refs transition removes the entry from the LRU list.
    pub fn pin(&mut self, page_num: u32) -> bool {
        match self.entries.get_mut(&page_num) {
            Some(entry) => {
                entry.refs += 1;
                if entry.refs == 1 {
                    self.lru.retain(|&p| p != page_num);
                }
                true
            }
            None => false,
        }
    }

    /// Drop one pin. Reaching zero re-enters the entry at the MRU end.
    pub fn release(&mut self, page_num: u32) {
        if let Some(entry) = self.entries.get_mut(&page_num) {
            debug_assert!(entry.refs > 0, "release on unpinned page {page_num}");
            if entry.refs > 0 {
                entry.refs -= 1;
                if entry.refs == 0 {
                    self.lru.push_front(page_num);
                }
            }
        }
    }

    /// Insert a new entry, evicting the LRU tail first if the cache is at
    /// capacity. A page number that is already resident is a no-op (the
    /// incoming buffer drops back to the pool). If every resident entry
    /// is pinned, the insertion proceeds past nominal capacity.
    pub fn insert<F>(&mut self, entry: CacheEntry, write_back: F) -> Result<()>
    where
        F: FnMut(u32, &[u8]) -> Result<()>,
    {
        if self.entries.contains_key(&entry.page_num) {
            return Ok(());
        }

        if self.entries.len() >= self.capacity {
            self.evict_lru(write_back)?;
        }

        let page_num = entry.page_num;
        let unpinned = entry.refs == 0;
        self.entries.insert(page_num, entry);
        if unpinned {
            self.lru.push_front(page_num);
        }
        Ok(())
    }

    /// Evict the least recently used unpinned entry, writing it back
    /// first if dirty. Returns false when nothing is evictable.
    pub fn evict_lru<F>(&mut self, mut write_back: F) -> Result<bool>
    where
        F: FnMut(u32, &[u8]) -> Result<()>,
    {
        let Some(page_num) = self.lru.pop_back() else {
            return Ok(false);
        };

        let Some(entry) = self.entries.remove(&page_num) else {
            bail!("cache entry missing for page {page_num} on the LRU list");
        };

        if entry.is_dirty() {
            write_back(page_num, &entry.buf)?;
        }
        Ok(true)
    }

    /// Evict every unpinned entry. Pinned entries remain resident.
    pub fn flush<F>(&mut self, mut write_back: F) -> Result<()>
    where
        F: FnMut(u32, &[u8]) -> Result<()>,
    {
        while self.evict_lru(&mut write_back)? {}
        Ok(())
    }

    /// Write every pinned dirty entry back in place, marking it clean.
    /// Entries stay resident and pinned.
    pub fn write_back_pinned<F>(&mut self, mut write_back: F) -> Result<()>
    where
        F: FnMut(u32, &[u8]) -> Result<()>,
    {
        for entry in self.entries.values_mut() {
            if entry.refs > 0 && entry.is_dirty() {
                write_back(entry.page_num, &entry.buf)?;
                entry.state = PageState::Clean;
            }
        }
        Ok(())
    }

    /// Shutdown path: evict everything evictable, then write back and
    /// drop the remaining (pinned) entries, metadata included.
    pub fn clear<F>(&mut self, mut write_back: F) -> Result<()>
    where
        F: FnMut(u32, &[u8]) -> Result<()>,
    {
        self.flush(&mut write_back)?;
        for (page_num, entry) in self.entries.drain() {
            if entry.is_dirty() {
                write_back(page_num, &entry.buf)?;
            }
        }
        self.lru.clear();
        Ok(())
    }

    pub fn data(&self, page_num: u32) -> Option<&[u8]> {
        self.entries.get(&page_num).map(|e| &*e.buf)
    }

    /// Mutable access marks the entry dirty.
    pub fn data_mut(&mut self, page_num: u32) -> Option<&mut [u8]> {
        self.entries.get_mut(&page_num).map(|e| {
            e.state = PageState::Dirty;
            &mut *e.buf
        })
    }

    pub fn mark_dirty(&mut self, page_num: u32) {
        if let Some(entry) = self.entries.get_mut(&page_num) {
            entry.state = PageState::Dirty;
        }
    }

    pub fn contains(&self, page_num: u32) -> bool {
        self.entries.contains_key(&page_num)
    }

    pub fn refs(&self, page_num: u32) -> u32 {
        self.entries.get(&page_num).map(|e| e.refs).unwrap_or(0)
    }

    pub fn is_dirty(&self, page_num: u32) -> bool {
        self.entries
            .get(&page_num)
            .map(|e| e.is_dirty())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unpinned_len(&self) -> usize {
        self.lru.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
