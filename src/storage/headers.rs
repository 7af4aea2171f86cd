//! # Metadata Page Layout
//!
//! Page 0 of every database file carries the metadata header right after
//! the common page header:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  ----------------------------------------
//! 0       13    Standard PageHeader (type = Metadata)
//! 13      2     version               (currently 1)
//! 15      6     magic                 ("abcdef")
//! 21      4     page_size
//! 25      4     page_count
//! 29      4     first_collection_page (always 1)
//! 33      4     free_list_start       (reserved, written as 0)
//! 37      4     cache_size
//! ```
//!
//! The version field precedes the magic so the magic occupies file bytes
//! 15..21, which is the externally observable identification contract for
//! this format. `free_list_start` is carried for forward compatibility
//! but never consulted: pages are not reclaimed.

use eyre::{ensure, Result};
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{DIRECTORY_PAGE, FORMAT_VERSION};

use super::PAGE_HEADER_SIZE;

pub const METADATA_MAGIC: &[u8; 6] = b"abcdef";

/// Size of the metadata header that follows the page header on page 0.
pub const META_HEADER_SIZE: usize = 28;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct MetadataHeader {
    version: U16,
    magic: [u8; 6],
    page_size: U32,
    page_count: U32,
    first_collection_page: U32,
    free_list_start: U32,
    cache_size: U32,
}

const _: () = assert!(size_of::<MetadataHeader>() == META_HEADER_SIZE);

impl MetadataHeader {
    pub fn new(page_size: u32, cache_size: u32) -> Self {
        Self {
            version: U16::new(FORMAT_VERSION),
            magic: *METADATA_MAGIC,
            page_size: U32::new(page_size),
            page_count: U32::new(1),
            first_collection_page: U32::new(DIRECTORY_PAGE),
            free_list_start: U32::new(0),
            cache_size: U32::new(cache_size),
        }
    }

    /// Typed view of the metadata header within a full (or prefix of a)
    /// metadata page. Validates magic and version.
    pub fn from_page(page: &[u8]) -> Result<&Self> {
        ensure!(
            page.len() >= PAGE_HEADER_SIZE + META_HEADER_SIZE,
            "buffer too small for MetadataHeader: {} < {}",
            page.len(),
            PAGE_HEADER_SIZE + META_HEADER_SIZE
        );

        let header =
            Self::ref_from_bytes(&page[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + META_HEADER_SIZE])
                .map_err(|e| eyre::eyre!("failed to read MetadataHeader: {:?}", e))?;

        header.validate()?;
        Ok(header)
    }

    pub fn from_page_mut(page: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            page.len() >= PAGE_HEADER_SIZE + META_HEADER_SIZE,
            "buffer too small for MetadataHeader: {} < {}",
            page.len(),
            PAGE_HEADER_SIZE + META_HEADER_SIZE
        );

        let header = Self::mut_from_bytes(
            &mut page[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + META_HEADER_SIZE],
        )
        .map_err(|e| eyre::eyre!("failed to read MetadataHeader: {:?}", e))?;

        header.validate()?;
        Ok(header)
    }

    pub fn write_to_page(&self, page: &mut [u8]) -> Result<()> {
        ensure!(
            page.len() >= PAGE_HEADER_SIZE + META_HEADER_SIZE,
            "buffer too small for MetadataHeader: {} < {}",
            page.len(),
            PAGE_HEADER_SIZE + META_HEADER_SIZE
        );

        page[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + META_HEADER_SIZE]
            .copy_from_slice(self.as_bytes());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            &self.magic == METADATA_MAGIC,
            "bad metadata magic: {:?}",
            self.magic
        );
        ensure!(
            self.version.get() == FORMAT_VERSION,
            "unsupported metadata version {} (expected {})",
            self.version.get(),
            FORMAT_VERSION
        );
        Ok(())
    }

    pub fn version(&self) -> u16 {
        self.version.get()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.get()
    }

    pub fn page_count(&self) -> u32 {
        self.page_count.get()
    }

    pub fn set_page_count(&mut self, count: u32) {
        self.page_count = U32::new(count);
    }

    pub fn first_collection_page(&self) -> u32 {
        self.first_collection_page.get()
    }

    pub fn free_list_start(&self) -> u32 {
        self.free_list_start.get()
    }

    pub fn cache_size(&self) -> u32 {
        self.cache_size.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{PageHeader, PageType};

    fn metadata_page(page_size: u32, cache_size: u32) -> Vec<u8> {
        let mut page = vec![0u8; page_size as usize];
        PageHeader::new(PageType::Metadata, 0, 0, 0)
            .write_to(&mut page)
            .unwrap();
        MetadataHeader::new(page_size, cache_size)
            .write_to_page(&mut page)
            .unwrap();
        page
    }

    #[test]
    fn metadata_header_size_is_28_bytes() {
        assert_eq!(size_of::<MetadataHeader>(), 28);
    }

    #[test]
    fn magic_lands_at_byte_15() {
        let page = metadata_page(4096, 1024);

        assert_eq!(&page[15..21], b"abcdef");
        assert_eq!(page[0], 0);
    }

    #[test]
    fn metadata_header_roundtrip() {
        let mut page = metadata_page(4096, 512);

        {
            let header = MetadataHeader::from_page_mut(&mut page).unwrap();
            header.set_page_count(17);
        }

        let header = MetadataHeader::from_page(&page).unwrap();
        assert_eq!(header.version(), FORMAT_VERSION);
        assert_eq!(header.page_size(), 4096);
        assert_eq!(header.page_count(), 17);
        assert_eq!(header.first_collection_page(), DIRECTORY_PAGE);
        assert_eq!(header.free_list_start(), 0);
        assert_eq!(header.cache_size(), 512);
    }

    #[test]
    fn metadata_header_rejects_bad_magic() {
        let mut page = metadata_page(4096, 1024);
        page[15..21].copy_from_slice(b"zzzzzz");

        let result = MetadataHeader::from_page(&page);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("bad metadata magic"));
    }

    #[test]
    fn metadata_header_rejects_unknown_version() {
        let mut page = metadata_page(4096, 1024);
        page[13..15].copy_from_slice(&9u16.to_le_bytes());

        let result = MetadataHeader::from_page(&page);

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unsupported metadata version"));
    }

    #[test]
    fn metadata_header_too_small_buffer() {
        let page = vec![0u8; 16];
        let result = MetadataHeader::from_page(&page);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("buffer too small"));
    }
}
