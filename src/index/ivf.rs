//! Inverted-file index: declared in the format, not implemented. The
//! cluster page type and record encoding exist so files written by a
//! future implementation stay readable, but nothing constructs one.

use eyre::{bail, Result};

use crate::records::VectorRecord;
use crate::storage::Pager;

use super::VectorIndex;

pub struct IvfIndex {
    _first_page: u32,
}

impl IvfIndex {
    pub fn open(_first_page: u32) -> Result<Self> {
        bail!("inverted-file index is not implemented")
    }
}

impl VectorIndex for IvfIndex {
    fn add(&mut self, _pager: &mut Pager, _vector: &VectorRecord) -> Result<()> {
        bail!("inverted-file index is not implemented")
    }
}
