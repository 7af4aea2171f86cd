//! # Vector Indexes
//!
//! The index contract a collection stores its vectors through. Two kinds
//! are declared in the on-disk format; only the flat layout is
//! implemented. The inverted-file layout (cluster pages with centroids)
//! reserves its page type and record encoding but has no constructor
//! that succeeds.

mod flat;
mod ivf;

pub use flat::FlatIndex;
pub use ivf::IvfIndex;

use eyre::Result;

use crate::records::VectorRecord;
use crate::storage::Pager;

/// Storage contract of a collection's vector index. Indexes hold only
/// chain anchors; all page access goes through the pager passed per call.
pub trait VectorIndex {
    fn add(&mut self, pager: &mut Pager, vector: &VectorRecord) -> Result<()>;
}
