//! # Database Builder
//!
//! Fluent configuration for opening a database. The geometry knobs only
//! matter when the file does not exist yet: an existing file carries its
//! page size and cache size in the metadata page, and those stored
//! values win on every subsequent open.

use std::path::{Path, PathBuf};

use eyre::Result;

use crate::config::{DEFAULT_CACHE_SIZE, DEFAULT_PAGE_SIZE};

use super::Database;

pub struct DatabaseBuilder {
    path: Option<PathBuf>,
    page_size: Option<u32>,
    cache_size: Option<u32>,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self {
            path: None,
            page_size: None,
            cache_size: None,
        }
    }

    /// Path of the database file. Created on open if missing.
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Page size for a newly created file, in bytes. Ignored when the
    /// file already exists.
    pub fn page_size(mut self, bytes: u32) -> Self {
        self.page_size = Some(bytes);
        self
    }

    /// Page-cache capacity recorded into a newly created file. Ignored
    /// when the file already exists.
    pub fn cache_size(mut self, pages: u32) -> Self {
        self.cache_size = Some(pages);
        self
    }

    /// Open the database, creating the file if it does not exist.
    pub fn open(self) -> Result<Database> {
        let path = self
            .path
            .ok_or_else(|| eyre::eyre!("database path not specified: call .path() first"))?;

        Database::open_with_config(
            &path,
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            self.cache_size.unwrap_or(DEFAULT_CACHE_SIZE),
        )
    }
}
