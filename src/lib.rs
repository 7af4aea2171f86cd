//! # veldb - Embedded Single-File Vector Database
//!
//! veldb persists named vector collections in one flat file of fixed-size
//! pages. A single process opens the file and appends fixed-dimensional
//! f32 vectors, identified by integer keys, into per-collection page
//! chains. All file access goes through a paging layer: a buffer pool, a
//! reference-counted LRU page cache with write-back eviction, and a pager
//! that allocates pages and brokers pinned access.
//!
//! ## Quick Start
//!
//! ```ignore
//! use veldb::{Database, VectorRecord};
//!
//! let mut db = Database::builder()
//!     .path("./vectors.veldb")
//!     .cache_size(256)
//!     .open()?;
//!
//! db.create_collection(1, 3)?;
//!
//! let mut coll = db.collection(1)?;
//! coll.add(&VectorRecord::new(1, vec![0.5, 0.25, 0.125]))?;
//!
//! db.flush()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │      Public API (Database)           │
//! ├──────────────────────────────────────┤
//! │  Collection Directory │ Vector Index │
//! ├──────────────────────────────────────┤
//! │     Chain Cursor / Appender          │
//! ├──────────────────────────────────────┤
//! │   Pager (pin/unpin, allocation)      │
//! ├──────────────────────────────────────┤
//! │  Page Cache (LRU) │ Page Pool        │
//! ├──────────────────────────────────────┤
//! │     File Storage (paged I/O)         │
//! └──────────────────────────────────────┘
//! ```
//!
//! ## File Layout
//!
//! One file, `page_count * page_size` bytes, little-endian throughout.
//! Page 0 holds the metadata header (magic, version, geometry); page 1
//! anchors the collection directory chain; every further page belongs to
//! a collection's vector chain. Pages of the same type are doubly linked
//! through `prev_page`/`next_page` header fields.
//!
//! ## Scope
//!
//! The engine is single-threaded and single-writer. There is no WAL, no
//! deletion or compaction, and no approximate-nearest-neighbor search:
//! the only implemented index layout is the flat chain. The inverted-file
//! index kind is declared in the record format but not implemented.
//!
//! ## Module Overview
//!
//! - [`storage`]: file I/O, page pool, page cache, pager, page layouts
//! - [`records`]: slot payload codecs (collection, vector, cluster)
//! - [`catalog`]: the collection directory chain
//! - [`index`]: the `VectorIndex` contract and the flat implementation
//! - [`database`]: the `Database`/`Collection` facade

pub mod catalog;
pub mod config;
pub mod database;
pub mod index;
pub mod records;
pub mod storage;

pub use database::{Collection, Database, DatabaseBuilder};
pub use records::{CollectionRecord, IndexKind, Quantization, VectorRecord};
