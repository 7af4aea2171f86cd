//! # Item Pages
//!
//! Slot-array pages: after the common page header come `slots`,
//! `item_size` and `item_count` (u32 each), a slot-occupancy bitmap of
//! `ceil(slots / 8)` bytes, and `slots * item_size` bytes of contiguous
//! fixed-stride payloads.
//!
//! The slot count is derived from the geometry so bitmap and payload area
//! always fit:
//!
//! ```text
//! slots = (page_size - 25) * 8 / (item_size * 8 + 1)
//! ```
//!
//! `ItemPage` is a read view over pinned page bytes, `ItemPageMut` the
//! write view; both are generic over the record kind, which pins the
//! page-type tag and the codec at compile time. Mutation happens through
//! `Pager::page_mut`, which marks the page dirty.

use std::marker::PhantomData;

use eyre::{ensure, Result};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::records::Record;

use super::page::PageHeader;
use super::{ITEM_AREA_OFFSET, ITEM_HEADER_SIZE, PAGE_HEADER_SIZE};

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct ItemHeader {
    slots: U32,
    item_size: U32,
    item_count: U32,
}

const _: () = assert!(size_of::<ItemHeader>() == ITEM_HEADER_SIZE);

/// Number of slots an item page of `page_size` bytes can hold at the
/// given stride. Accounts for one bitmap bit per slot.
pub fn slot_capacity(page_size: usize, item_size: u32) -> u32 {
    let area = page_size.saturating_sub(ITEM_AREA_OFFSET);
    (area * 8 / (item_size as usize * 8 + 1)) as u32
}

fn parse_headers(data: &[u8]) -> Result<(&PageHeader, &ItemHeader)> {
    ensure!(
        data.len() >= ITEM_AREA_OFFSET,
        "buffer too small for an item page: {} < {}",
        data.len(),
        ITEM_AREA_OFFSET
    );

    let page_header = PageHeader::from_bytes(data)?;
    let item_header =
        ItemHeader::ref_from_bytes(&data[PAGE_HEADER_SIZE..ITEM_AREA_OFFSET])
            .map_err(|e| eyre::eyre!("failed to read item page header: {:?}", e))?;
    Ok((page_header, item_header))
}

/// Read view over an item page. Header fields are captured once at
/// construction; the view is transient and never outlives a pin.
#[derive(Debug)]
pub struct ItemPage<'a, R: Record> {
    data: &'a [u8],
    slots: u32,
    item_size: u32,
    item_count: u32,
    prev_page: u32,
    next_page: u32,
    _record: PhantomData<R>,
}

impl<'a, R: Record> ItemPage<'a, R> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let (page_header, item_header) = parse_headers(data)?;
        ensure!(
            page_header.type_byte() == R::PAGE_TYPE as u8,
            "wrong page type: expected {:?}, found {:#04x}",
            R::PAGE_TYPE,
            page_header.type_byte()
        );

        let slots = item_header.slots.get();
        let item_size = item_header.item_size.get();
        ensure!(
            slot_area_end(slots, item_size) <= data.len(),
            "item page geometry exceeds the page: {} slots of {} bytes",
            slots,
            item_size
        );

        Ok(Self {
            data,
            slots,
            item_size,
            item_count: item_header.item_count.get(),
            prev_page: page_header.prev_page(),
            next_page: page_header.next_page(),
            _record: PhantomData,
        })
    }

    pub fn slots(&self) -> u32 {
        self.slots
    }

    pub fn item_size(&self) -> u32 {
        self.item_size
    }

    pub fn item_count(&self) -> u32 {
        self.item_count
    }

    pub fn prev_page(&self) -> u32 {
        self.prev_page
    }

    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn is_full(&self) -> bool {
        self.item_count == self.slots
    }

    pub fn occupied(&self, index: u32) -> Result<bool> {
        ensure!(
            index < self.slots,
            "slot index {} out of range (slots {})",
            index,
            self.slots
        );
        Ok(bit(self.data, index))
    }

    /// Decode the record at `index`, or `None` for an empty slot.
    pub fn get(&self, index: u32) -> Result<Option<R>> {
        if !self.occupied(index)? {
            return Ok(None);
        }

        let off = slot_offset(self.slots, self.item_size, index);
        R::decode(&self.data[off..off + self.item_size as usize]).map(Some)
    }
}

/// Write view over an item page.
#[derive(Debug)]
pub struct ItemPageMut<'a, R: Record> {
    data: &'a mut [u8],
    slots: u32,
    item_size: u32,
    _record: PhantomData<R>,
}

impl<'a, R: Record> ItemPageMut<'a, R> {
    /// Lay out a fresh item page over a zeroed buffer.
    pub fn init(
        data: &'a mut [u8],
        page_num: u32,
        prev_page: u32,
        item_size: u32,
    ) -> Result<Self> {
        ensure!(item_size > 0, "item size must be nonzero");
        ensure!(
            data.len() > ITEM_AREA_OFFSET,
            "invalid page size {}: no room after the item page header",
            data.len()
        );

        let slots = slot_capacity(data.len(), item_size);
        ensure!(
            slots > 0,
            "page size {} too small for item size {}",
            data.len(),
            item_size
        );

        PageHeader::new(R::PAGE_TYPE, page_num, prev_page, 0).write_to(data)?;
        let header = ItemHeader {
            slots: U32::new(slots),
            item_size: U32::new(item_size),
            item_count: U32::new(0),
        };
        data[PAGE_HEADER_SIZE..ITEM_AREA_OFFSET].copy_from_slice(header.as_bytes());

        Ok(Self {
            data,
            slots,
            item_size,
            _record: PhantomData,
        })
    }

    /// Write view over an existing item page.
    pub fn new(data: &'a mut [u8]) -> Result<Self> {
        let (slots, item_size) = {
            let (page_header, item_header) = parse_headers(data)?;
            ensure!(
                page_header.type_byte() == R::PAGE_TYPE as u8,
                "wrong page type: expected {:?}, found {:#04x}",
                R::PAGE_TYPE,
                page_header.type_byte()
            );
            (item_header.slots.get(), item_header.item_size.get())
        };
        ensure!(
            slot_area_end(slots, item_size) <= data.len(),
            "item page geometry exceeds the page: {} slots of {} bytes",
            slots,
            item_size
        );

        Ok(Self {
            data,
            slots,
            item_size,
            _record: PhantomData,
        })
    }

    pub fn slots(&self) -> u32 {
        self.slots
    }

    pub fn item_size(&self) -> u32 {
        self.item_size
    }

    pub fn item_count(&self) -> Result<u32> {
        Ok(self.item_header()?.item_count.get())
    }

    pub fn is_full(&self) -> Result<bool> {
        Ok(self.item_header()?.item_count.get() == self.slots)
    }

    pub fn set_next_page(&mut self, page_num: u32) -> Result<()> {
        PageHeader::from_bytes_mut(self.data)?.set_next_page(page_num);
        Ok(())
    }

    /// Insert into an empty slot.
    pub fn insert(&mut self, index: u32, record: &R) -> Result<()> {
        ensure!(
            index < self.slots,
            "slot index {} out of range (slots {})",
            index,
            self.slots
        );
        ensure!(
            !bit(self.data, index),
            "slot {} already occupied",
            index
        );

        self.write_slot(index, record)?;
        set_bit(self.data, index);
        let header = self.item_header_mut()?;
        header.item_count = U32::new(header.item_count.get() + 1);
        Ok(())
    }

    /// Overwrite an occupied slot in place.
    pub fn update(&mut self, index: u32, record: &R) -> Result<()> {
        ensure!(
            index < self.slots,
            "slot index {} out of range (slots {})",
            index,
            self.slots
        );
        ensure!(bit(self.data, index), "slot {} is empty", index);

        self.write_slot(index, record)
    }

    fn write_slot(&mut self, index: u32, record: &R) -> Result<()> {
        ensure!(
            record.encoded_len() == self.item_size as usize,
            "record size {} does not match page item size {}",
            record.encoded_len(),
            self.item_size
        );

        let off = slot_offset(self.slots, self.item_size, index);
        record.encode(&mut self.data[off..off + self.item_size as usize])
    }

    fn item_header(&self) -> Result<&ItemHeader> {
        ItemHeader::ref_from_bytes(&self.data[PAGE_HEADER_SIZE..ITEM_AREA_OFFSET])
            .map_err(|e| eyre::eyre!("failed to read item page header: {:?}", e))
    }

    fn item_header_mut(&mut self) -> Result<&mut ItemHeader> {
        ItemHeader::mut_from_bytes(&mut self.data[PAGE_HEADER_SIZE..ITEM_AREA_OFFSET])
            .map_err(|e| eyre::eyre!("failed to read item page header: {:?}", e))
    }
}

fn bitmap_len(slots: u32) -> usize {
    (slots as usize).div_ceil(8)
}

fn slot_offset(slots: u32, item_size: u32, index: u32) -> usize {
    ITEM_AREA_OFFSET + bitmap_len(slots) + index as usize * item_size as usize
}

fn slot_area_end(slots: u32, item_size: u32) -> usize {
    slot_offset(slots, item_size, slots)
}

fn bit(data: &[u8], index: u32) -> bool {
    data[ITEM_AREA_OFFSET + index as usize / 8] & (1 << (index % 8)) != 0
}

fn set_bit(data: &mut [u8], index: u32) {
    data[ITEM_AREA_OFFSET + index as usize / 8] |= 1 << (index % 8);
}
