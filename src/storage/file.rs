//! # File Storage
//!
//! Owns the database file and performs page-granular I/O. Creation writes
//! a fully initialized metadata page and syncs it; opening validates the
//! metadata prefix and adopts the page size stored there.
//!
//! Writes grow the file on demand: before writing past the current end,
//! one zero byte is written at the new length minus one so the kernel
//! extends the file in a single step.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use eyre::{ensure, Result, WrapErr};

use crate::config::{METADATA_PAGE, MIN_PAGE_SIZE};

use super::headers::{MetadataHeader, META_HEADER_SIZE};
use super::page::{PageHeader, PageType};
use super::PAGE_HEADER_SIZE;

#[derive(Debug)]
pub struct FileStorage {
    file: File,
    page_size: u32,
}

impl FileStorage {
    /// Create a new database file. Fails if the path already exists.
    /// The file starts as a single metadata page, synced to disk.
    pub fn create<P: AsRef<Path>>(path: P, page_size: u32, cache_size: u32) -> Result<Self> {
        ensure!(
            page_size >= MIN_PAGE_SIZE,
            "invalid page size {} (minimum {})",
            page_size,
            MIN_PAGE_SIZE
        );

        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .wrap_err_with(|| format!("failed to create database file '{}'", path.display()))?;

        let mut storage = Self { file, page_size };

        let mut page = vec![0u8; page_size as usize];
        PageHeader::new(PageType::Metadata, METADATA_PAGE, 0, 0).write_to(&mut page)?;
        MetadataHeader::new(page_size, cache_size).write_to_page(&mut page)?;

        storage.write_page(METADATA_PAGE, &page)?;
        storage.sync()?;
        Ok(storage)
    }

    /// Open an existing database file, validating the metadata prefix and
    /// adopting its stored page size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .wrap_err_with(|| format!("failed to open database file '{}'", path.display()))?;

        let mut prefix = [0u8; PAGE_HEADER_SIZE + META_HEADER_SIZE];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut prefix)
            .wrap_err("incomplete page read for the metadata page")?;

        let meta = MetadataHeader::from_page(&prefix)?;
        let page_size = meta.page_size();
        ensure!(
            page_size >= MIN_PAGE_SIZE,
            "invalid page size {} stored in metadata (minimum {})",
            page_size,
            MIN_PAGE_SIZE
        );

        Ok(Self { file, page_size })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Current file length in bytes.
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Read one page into `buf`, which must be exactly one page long.
    pub fn read_page(&mut self, page_num: u32, buf: &mut [u8]) -> Result<()> {
        ensure!(
            buf.len() == self.page_size as usize,
            "invalid page buffer size: {} != {}",
            buf.len(),
            self.page_size
        );

        let offset = page_num as u64 * self.page_size as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file
            .read_exact(buf)
            .wrap_err_with(|| format!("incomplete page read for page {page_num}"))?;
        Ok(())
    }

    /// Write one page, extending the file first when the write lands past
    /// the current end.
    pub fn write_page(&mut self, page_num: u32, buf: &[u8]) -> Result<()> {
        ensure!(
            buf.len() == self.page_size as usize,
            "invalid page buffer size: {} != {}",
            buf.len(),
            self.page_size
        );

        let offset = page_num as u64 * self.page_size as u64;
        let required = offset + self.page_size as u64;
        if self.len()? < required {
            self.file.seek(SeekFrom::Start(required - 1))?;
            self.file
                .write_all(&[0])
                .wrap_err_with(|| format!("failed to extend file for page {page_num}"))?;
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file
            .write_all(buf)
            .wrap_err_with(|| format!("incomplete page write for page {page_num}"))?;
        Ok(())
    }

    pub fn sync(&self) -> Result<()> {
        self.file.sync_all().wrap_err("failed to sync database file")
    }
}
