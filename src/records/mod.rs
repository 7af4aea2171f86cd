//! # Slot Payload Codecs
//!
//! The three record kinds an item page can store, behind a common
//! [`Record`] trait. Each kind pins its page-type tag at compile time so
//! the chain primitives monomorphize per kind.
//!
//! ## Encodings (little-endian)
//!
//! - **collection** (14 bytes, fixed): `id: u32`, `dimensions: u32`,
//!   `quantization: u8`, `index_kind: u8`, `first_child_page: u32`
//! - **vector** (`4 + 4 * dims` bytes): `id: u32`, then `dims` f32
//!   components
//! - **cluster** (`8 + 4 * dims` bytes): `first_child_page: u32`,
//!   `vector_count: u32`, then the centroid components
//!
//! Vector and cluster sizes are fixed per page chain, not per type: the
//! page's `item_size` field carries the stride, and decoding derives the
//! dimension count from the slot length. Cluster records are declared for
//! the inverted-file layout and are never materialized by the flat index
//! path.

use eyre::{bail, ensure, Result};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::storage::PageType;

/// A fixed-stride payload that item pages can store.
///
/// `decode` receives exactly one slot (`item_size` bytes); `encode` must
/// fill the whole slot it is given.
pub trait Record: Sized {
    const PAGE_TYPE: PageType;

    fn encoded_len(&self) -> usize;
    fn encode(&self, buf: &mut [u8]) -> Result<()>;
    fn decode(buf: &[u8]) -> Result<Self>;
}

/// Vector payload compression scheme. Only the identity scheme exists.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantization {
    None = 0,
}

impl Quantization {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Quantization::None),
            _ => bail!("unknown quantization scheme {b}"),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Flat = 0,
    Ivf = 1,
}

impl IndexKind {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(IndexKind::Flat),
            1 => Ok(IndexKind::Ivf),
            _ => bail!("unknown index kind {b}"),
        }
    }
}

pub const COLLECTION_RECORD_SIZE: usize = 14;

#[repr(C)]
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct RawCollectionRecord {
    id: U32,
    dimensions: U32,
    quantization: u8,
    index_kind: u8,
    first_child_page: U32,
}

const _: () = assert!(size_of::<RawCollectionRecord>() == COLLECTION_RECORD_SIZE);

/// One entry in the collection directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRecord {
    pub id: u32,
    pub dimensions: u32,
    pub quantization: Quantization,
    pub index_kind: IndexKind,
    pub first_child_page: u32,
}

impl CollectionRecord {
    pub fn new(id: u32, dimensions: u32) -> Self {
        Self {
            id,
            dimensions,
            quantization: Quantization::None,
            index_kind: IndexKind::Flat,
            first_child_page: 0,
        }
    }
}

impl Record for CollectionRecord {
    const PAGE_TYPE: PageType = PageType::Collection;

    fn encoded_len(&self) -> usize {
        COLLECTION_RECORD_SIZE
    }

    fn encode(&self, buf: &mut [u8]) -> Result<()> {
        ensure!(
            buf.len() == COLLECTION_RECORD_SIZE,
            "collection record slot is {} bytes (expected {})",
            buf.len(),
            COLLECTION_RECORD_SIZE
        );

        let raw = RawCollectionRecord {
            id: U32::new(self.id),
            dimensions: U32::new(self.dimensions),
            quantization: self.quantization as u8,
            index_kind: self.index_kind as u8,
            first_child_page: U32::new(self.first_child_page),
        };
        buf.copy_from_slice(raw.as_bytes());
        Ok(())
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        ensure!(
            buf.len() == COLLECTION_RECORD_SIZE,
            "collection record slot is {} bytes (expected {})",
            buf.len(),
            COLLECTION_RECORD_SIZE
        );

        let raw = RawCollectionRecord::ref_from_bytes(buf)
            .map_err(|e| eyre::eyre!("failed to read collection record: {:?}", e))?;

        Ok(Self {
            id: raw.id.get(),
            dimensions: raw.dimensions.get(),
            quantization: Quantization::from_byte(raw.quantization)?,
            index_kind: IndexKind::from_byte(raw.index_kind)?,
            first_child_page: raw.first_child_page.get(),
        })
    }
}

/// One stored vector: an integer key plus its position.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: u32,
    pub position: Vec<f32>,
}

impl VectorRecord {
    pub fn new(id: u32, position: Vec<f32>) -> Self {
        Self { id, position }
    }

    /// Slot stride of a vector page for the given dimension count.
    pub fn item_size(dimensions: u32) -> u32 {
        4 + dimensions * 4
    }
}

impl Record for VectorRecord {
    const PAGE_TYPE: PageType = PageType::Vector;

    fn encoded_len(&self) -> usize {
        4 + self.position.len() * 4
    }

    fn encode(&self, buf: &mut [u8]) -> Result<()> {
        ensure!(
            buf.len() == self.encoded_len(),
            "vector record needs {} bytes, slot is {}",
            self.encoded_len(),
            buf.len()
        );

        buf[..4].copy_from_slice(&self.id.to_le_bytes());
        for (chunk, component) in buf[4..].chunks_exact_mut(4).zip(&self.position) {
            chunk.copy_from_slice(&component.to_le_bytes());
        }
        Ok(())
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        ensure!(
            buf.len() >= 4 && (buf.len() - 4) % 4 == 0,
            "malformed vector slot of {} bytes",
            buf.len()
        );

        let id = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let position = buf[4..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { id, position })
    }
}

/// A cluster entry of the inverted-file layout: a centroid plus the chain
/// of vectors assigned to it. Declared for format completeness; the flat
/// index never writes one.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRecord {
    pub first_child_page: u32,
    pub vector_count: u32,
    pub centroid: Vec<f32>,
}

impl Record for ClusterRecord {
    const PAGE_TYPE: PageType = PageType::Cluster;

    fn encoded_len(&self) -> usize {
        8 + self.centroid.len() * 4
    }

    fn encode(&self, buf: &mut [u8]) -> Result<()> {
        ensure!(
            buf.len() == self.encoded_len(),
            "cluster record needs {} bytes, slot is {}",
            self.encoded_len(),
            buf.len()
        );

        buf[..4].copy_from_slice(&self.first_child_page.to_le_bytes());
        buf[4..8].copy_from_slice(&self.vector_count.to_le_bytes());
        for (chunk, component) in buf[8..].chunks_exact_mut(4).zip(&self.centroid) {
            chunk.copy_from_slice(&component.to_le_bytes());
        }
        Ok(())
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        ensure!(
            buf.len() >= 8 && (buf.len() - 8) % 4 == 0,
            "malformed cluster slot of {} bytes",
            buf.len()
        );

        let first_child_page = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let vector_count = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let centroid = buf[8..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self {
            first_child_page,
            vector_count,
            centroid,
        })
    }
}
