//! # Configuration Constants
//!
//! Centralizes the geometry and default values used across the storage
//! layer. Constants that depend on each other are co-located so a change
//! to one is visible next to the others it affects.
//!
//! ```text
//! DEFAULT_PAGE_SIZE (4096)
//!       │
//!       ├─> stored in the metadata page on creation; the stored value is
//!       │   authoritative for the life of the file
//!       │
//!       └─> MIN_PAGE_SIZE (64): smallest geometry that still fits the
//!           item-page header plus one collection record slot
//!
//! DEFAULT_CACHE_SIZE (1024 pages)
//!       │
//!       └─> stored in the metadata page; the pager sizes its cache from
//!           the stored value on every open
//! ```
//!
//! Page numbers 0 and 1 are reserved: page 0 is the metadata page and is
//! pinned for the pager's whole lifetime; page 1 anchors the collection
//! directory chain.

/// Page size written into newly created files, in bytes.
pub const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Smallest accepted page size. Below this not even a single collection
/// record fits after the page and item headers.
pub const MIN_PAGE_SIZE: u32 = 64;

/// Number of page buffers the cache holds by default.
pub const DEFAULT_CACHE_SIZE: u32 = 1024;

/// Page number of the metadata page.
pub const METADATA_PAGE: u32 = 0;

/// Page number of the first collection-directory page.
pub const DIRECTORY_PAGE: u32 = 1;

/// On-disk format version accepted by this build.
pub const FORMAT_VERSION: u16 = 1;
