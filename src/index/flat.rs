//! Flat index: one vector chain, no clustering, no quantization.
//! Appends are O(1) amortized; reads walk the chain in insertion order.

use eyre::Result;

use crate::records::VectorRecord;
use crate::storage::{ChainAppender, ChainCursor, Pager};

use super::VectorIndex;

pub struct FlatIndex {
    first_page: u32,
}

impl FlatIndex {
    /// Open the index over an existing vector chain.
    pub fn open(first_page: u32) -> Self {
        Self { first_page }
    }

    pub fn first_page(&self) -> u32 {
        self.first_page
    }

    /// Every stored vector, in insertion order.
    pub fn vectors(&self, pager: &mut Pager) -> Result<Vec<VectorRecord>> {
        let mut cursor = ChainCursor::<VectorRecord>::new(pager, self.first_page)?;
        let mut vectors = Vec::new();
        cursor.for_each(|vector| {
            vectors.push(vector);
            Ok(true)
        })?;
        Ok(vectors)
    }
}

impl VectorIndex for FlatIndex {
    fn add(&mut self, pager: &mut Pager, vector: &VectorRecord) -> Result<()> {
        ChainAppender::<VectorRecord>::new(pager, self.first_page)?.append(vector)
    }
}
