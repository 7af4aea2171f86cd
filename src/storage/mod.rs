//! # Storage Module
//!
//! The paging layer: everything between the public facade and the bytes
//! on disk.
//!
//! ## Components
//!
//! - `file`: owns the database file; page-granular seek/read/write with
//!   grow-on-write
//! - `pool`: free-list pool of page-sized buffers, returned on drop
//! - `cache`: reference-counted LRU over pooled buffers with write-back
//!   eviction
//! - `pager`: glues file + pool + cache; allocates pages, brokers pinned
//!   access, flushes
//! - `page`: the 13-byte page header shared by every page type
//! - `headers`: the metadata-page layout (page 0)
//! - `item_page`: slot-bitmap item pages, generic over the record kind
//! - `cursor`: pinned traversal of a doubly linked page chain, and the
//!   append-only writer that grows it
//!
//! ## Page Layout
//!
//! Every page starts with the same header:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -------------------------------
//! 0       1     page_type (0 metadata, 1 collection, 2 cluster, 3 vector)
//! 1       4     page_num
//! 5       4     prev_page (0 = none)
//! 9       4     next_page (0 = none)
//! ```
//!
//! Item pages continue with `slots`, `item_size` and `item_count` (u32
//! each), a slot-occupancy bitmap of `ceil(slots / 8)` bytes, and then
//! `slots * item_size` bytes of contiguous slot payloads.
//!
//! All multi-byte integers are little-endian. Header structs are
//! `zerocopy` views with `Unaligned` fields, so page buffers carry no
//! alignment requirement.
//!
//! ## Pin Protocol
//!
//! Pages must be pinned in the cache before their bytes can be accessed:
//!
//! 1. `Pager::get_page` / `Pager::new_page` pin the page (refs += 1)
//! 2. `Pager::page` / `Pager::page_mut` read or mutate the bytes
//! 3. `Pager::release_page` unpins (refs -= 1)
//!
//! A page with `refs > 0` is never evicted. The metadata page is pinned
//! once at open and stays pinned until the pager shuts down.
//!
//! ## Thread Safety
//!
//! The engine is single-threaded by contract; the cache's reference
//! counts are plain integers and nothing here locks except the pool's
//! free list (so pooled buffers can return themselves from `Drop`).

mod cache;
mod cursor;
mod file;
mod headers;
mod item_page;
mod page;
mod pager;
mod pool;

pub use cache::{CacheEntry, PageCache, PageState};
pub use cursor::{ChainAppender, ChainCursor};
pub use file::FileStorage;
pub use headers::{MetadataHeader, METADATA_MAGIC, META_HEADER_SIZE};
pub use item_page::{slot_capacity, ItemPage, ItemPageMut};
pub use page::{PageHeader, PageType};
pub use pager::{FlushMode, Pager};
pub use pool::{PagePool, PooledBuffer};

/// Size of the header every page starts with.
pub const PAGE_HEADER_SIZE: usize = 13;

/// Size of the item-page sub-header (`slots`, `item_size`, `item_count`).
pub const ITEM_HEADER_SIZE: usize = 12;

/// Offset where an item page's bitmap begins.
pub const ITEM_AREA_OFFSET: usize = PAGE_HEADER_SIZE + ITEM_HEADER_SIZE;

const _: () = assert!(ITEM_AREA_OFFSET == 25);
