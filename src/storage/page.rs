//! # Page Types and Header Layout
//!
//! Every page in the file begins with the same 13-byte header: a one-byte
//! type tag, the page's own number, and the `prev_page`/`next_page` links
//! that form doubly linked chains of same-typed pages.
//!
//! The header is a `zerocopy` view over the raw page bytes. All fields
//! are either `u8` or little-endian `U32`, so the struct is `Unaligned`
//! and can be parsed from any buffer offset without copying.

use eyre::{ensure, Result};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::PAGE_HEADER_SIZE;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Metadata = 0,
    Collection = 1,
    Cluster = 2,
    Vector = 3,
}

impl PageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(PageType::Metadata),
            1 => Some(PageType::Collection),
            2 => Some(PageType::Cluster),
            3 => Some(PageType::Vector),
            _ => None,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct PageHeader {
    page_type: u8,
    page_num: U32,
    prev_page: U32,
    next_page: U32,
}

const _: () = assert!(size_of::<PageHeader>() == PAGE_HEADER_SIZE);

impl PageHeader {
    pub fn new(page_type: PageType, page_num: u32, prev_page: u32, next_page: u32) -> Self {
        Self {
            page_type: page_type as u8,
            page_num: U32::new(page_num),
            prev_page: U32::new(prev_page),
            next_page: U32::new(next_page),
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= PAGE_HEADER_SIZE,
            "buffer too small for PageHeader: {} < {}",
            data.len(),
            PAGE_HEADER_SIZE
        );

        Self::ref_from_bytes(&data[..PAGE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to read PageHeader: {:?}", e))
    }

    pub fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= PAGE_HEADER_SIZE,
            "buffer too small for PageHeader: {} < {}",
            data.len(),
            PAGE_HEADER_SIZE
        );

        Self::mut_from_bytes(&mut data[..PAGE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to read PageHeader: {:?}", e))
    }

    pub fn write_to(&self, data: &mut [u8]) -> Result<()> {
        ensure!(
            data.len() >= PAGE_HEADER_SIZE,
            "buffer too small for PageHeader: {} < {}",
            data.len(),
            PAGE_HEADER_SIZE
        );

        data[..PAGE_HEADER_SIZE].copy_from_slice(self.as_bytes());
        Ok(())
    }

    pub fn type_byte(&self) -> u8 {
        self.page_type
    }

    pub fn page_type(&self) -> Option<PageType> {
        PageType::from_byte(self.page_type)
    }

    pub fn set_page_type(&mut self, page_type: PageType) {
        self.page_type = page_type as u8;
    }

    pub fn page_num(&self) -> u32 {
        self.page_num.get()
    }

    pub fn set_page_num(&mut self, page_num: u32) {
        self.page_num = U32::new(page_num);
    }

    pub fn prev_page(&self) -> u32 {
        self.prev_page.get()
    }

    pub fn set_prev_page(&mut self, page_num: u32) {
        self.prev_page = U32::new(page_num);
    }

    pub fn next_page(&self) -> u32 {
        self.next_page.get()
    }

    pub fn set_next_page(&mut self, page_num: u32) {
        self.next_page = U32::new(page_num);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_type_from_byte() {
        assert_eq!(PageType::from_byte(0), Some(PageType::Metadata));
        assert_eq!(PageType::from_byte(1), Some(PageType::Collection));
        assert_eq!(PageType::from_byte(2), Some(PageType::Cluster));
        assert_eq!(PageType::from_byte(3), Some(PageType::Vector));
        assert_eq!(PageType::from_byte(4), None);
        assert_eq!(PageType::from_byte(0xFF), None);
    }

    #[test]
    fn page_header_size_is_13_bytes() {
        assert_eq!(size_of::<PageHeader>(), 13);
    }

    #[test]
    fn page_header_new_initializes_fields() {
        let header = PageHeader::new(PageType::Vector, 7, 3, 9);

        assert_eq!(header.page_type(), Some(PageType::Vector));
        assert_eq!(header.page_num(), 7);
        assert_eq!(header.prev_page(), 3);
        assert_eq!(header.next_page(), 9);
    }

    #[test]
    fn page_header_field_offsets() {
        let header = PageHeader::new(PageType::Collection, 0x11223344, 0x0A0B0C0D, 0x01020304);
        let bytes = header.as_bytes();

        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..5], &[0x44, 0x33, 0x22, 0x11]);
        assert_eq!(&bytes[5..9], &[0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(&bytes[9..13], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn page_header_from_bytes_too_small() {
        let data = [0u8; 8];
        let result = PageHeader::from_bytes(&data);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("buffer too small"));
    }

    #[test]
    fn page_header_from_bytes_mut_modifies_in_place() {
        let mut data = [0u8; 64];

        {
            let header = PageHeader::from_bytes_mut(&mut data).unwrap();
            header.set_page_type(PageType::Vector);
            header.set_next_page(42);
        }

        assert_eq!(data[0], 3);
        assert_eq!(&data[9..13], &42u32.to_le_bytes());
    }

    #[test]
    fn page_header_write_to() {
        let header = PageHeader::new(PageType::Cluster, 5, 0, 0);
        let mut data = [0xFFu8; 32];

        header.write_to(&mut data).unwrap();

        assert_eq!(data[0], 2);
        assert_eq!(&data[1..5], &5u32.to_le_bytes());
        assert_eq!(data[13], 0xFF);
    }
}
