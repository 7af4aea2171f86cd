//! # Chain Cursor and Appender
//!
//! A chain is a doubly linked sequence of same-typed item pages. The
//! cursor is a position `(page, index)` within one; it keeps exactly one
//! page pinned at a time and, when it hops between pages, pins the next
//! page *before* releasing the current one. That ordering guarantees
//! forward progress even when the cache is at capacity: the page being
//! left can be evicted, the page being entered cannot.
//!
//! The appender wraps a cursor with the only mutation a chain supports:
//! appending into the next empty slot, growing the chain by one page when
//! every slot is taken.

use std::marker::PhantomData;

use eyre::Result;

use crate::records::Record;

use super::item_page::{ItemPage, ItemPageMut};
use super::pager::Pager;

/// A pinned position within a page chain.
///
/// Holds one pin for its whole lifetime; dropping the cursor releases it.
pub struct ChainCursor<'p, R: Record> {
    pager: &'p mut Pager,
    page_num: u32,
    index: u32,
    _record: PhantomData<R>,
}

impl<'p, R: Record> ChainCursor<'p, R> {
    /// Pin `first_page` and position at its slot 0.
    pub fn new(pager: &'p mut Pager, first_page: u32) -> Result<Self> {
        pager.get_page::<R>(first_page)?;
        Ok(Self {
            pager,
            page_num: first_page,
            index: 0,
            _record: PhantomData,
        })
    }

    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    fn page(&self) -> Result<ItemPage<'_, R>> {
        ItemPage::new(self.pager.page(self.page_num)?)
    }

    /// Pin `page_num`, release the old page, reposition.
    fn hop_to(&mut self, page_num: u32, index: u32) -> Result<()> {
        self.pager.get_page::<R>(page_num)?;
        self.pager.release_page(self.page_num);
        self.page_num = page_num;
        self.index = index;
        Ok(())
    }

    /// Step one slot forward, hopping to the next page at the boundary.
    /// Returns false at the end of the chain.
    pub fn advance(&mut self) -> Result<bool> {
        let (slots, next) = {
            let page = self.page()?;
            (page.slots(), page.next_page())
        };

        if self.index + 1 < slots {
            self.index += 1;
            return Ok(true);
        }
        if next == 0 {
            return Ok(false);
        }
        self.hop_to(next, 0)?;
        Ok(true)
    }

    /// Step one slot backward. Returns false at the start of the chain.
    pub fn retreat(&mut self) -> Result<bool> {
        if self.index > 0 {
            self.index -= 1;
            return Ok(true);
        }

        let prev = self.page()?.prev_page();
        if prev == 0 {
            return Ok(false);
        }
        self.hop_to(prev, 0)?;
        let last = self.page()?.slots().saturating_sub(1);
        self.index = last;
        Ok(true)
    }

    /// Follow `prev_page` links to the first page of the chain.
    pub fn seek_to_start(&mut self) -> Result<()> {
        loop {
            let prev = self.page()?.prev_page();
            if prev == 0 {
                self.index = 0;
                return Ok(());
            }
            self.hop_to(prev, 0)?;
        }
    }

    /// Follow `next_page` links to the last page of the chain.
    pub fn seek_to_end(&mut self) -> Result<()> {
        loop {
            let next = self.page()?.next_page();
            if next == 0 {
                return Ok(());
            }
            self.hop_to(next, 0)?;
        }
    }

    /// The record under the cursor, or `None` on an empty slot.
    pub fn current(&self) -> Result<Option<R>> {
        self.page()?.get(self.index)
    }

    /// Move to the first empty slot at or after the current position,
    /// skipping full pages. Returns false when the chain has none.
    pub fn next_empty_slot(&mut self) -> Result<bool> {
        loop {
            let (found, next) = {
                let page = self.page()?;
                let mut found = None;
                if !page.is_full() {
                    for index in self.index..page.slots() {
                        if !page.occupied(index)? {
                            found = Some(index);
                            break;
                        }
                    }
                }
                (found, page.next_page())
            };

            if let Some(index) = found {
                self.index = index;
                return Ok(true);
            }
            if next == 0 {
                return Ok(false);
            }
            self.hop_to(next, 0)?;
        }
    }

    /// Visit every occupied slot from the current position to the end of
    /// the chain, in slot-then-page order. The callback returns whether
    /// to keep iterating.
    pub fn for_each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(R) -> Result<bool>,
    {
        loop {
            if let Some(record) = self.current()? {
                if !f(record)? {
                    return Ok(());
                }
            }
            if !self.advance()? {
                return Ok(());
            }
        }
    }

    /// Allocate a fresh tail page, link it behind the current terminal
    /// page and move onto its slot 0.
    fn grow_chain(&mut self) -> Result<()> {
        self.seek_to_end()?;
        let (tail, item_size) = {
            let page = self.page()?;
            (self.page_num, page.item_size())
        };

        let new_page = self.pager.new_page::<R>(tail, item_size)?;
        {
            let data = self.pager.page_mut(tail)?;
            ItemPageMut::<R>::new(data)?.set_next_page(new_page)?;
        }

        // Adopt new_page's pin; give up the old tail's.
        self.pager.release_page(tail);
        self.page_num = new_page;
        self.index = 0;
        Ok(())
    }

    fn insert_here(&mut self, record: &R) -> Result<()> {
        let index = self.index;
        let data = self.pager.page_mut(self.page_num)?;
        ItemPageMut::<R>::new(data)?.insert(index, record)
    }
}

impl<R: Record> Drop for ChainCursor<'_, R> {
    fn drop(&mut self) {
        self.pager.release_page(self.page_num);
    }
}

/// Append-only writer over a page chain.
pub struct ChainAppender<'p, R: Record> {
    cursor: ChainCursor<'p, R>,
}

impl<'p, R: Record> ChainAppender<'p, R> {
    pub fn new(pager: &'p mut Pager, first_page: u32) -> Result<Self> {
        Ok(Self {
            cursor: ChainCursor::new(pager, first_page)?,
        })
    }

    /// Insert `record` into the next empty slot, allocating and linking
    /// a new tail page when the chain is full.
    pub fn append(&mut self, record: &R) -> Result<()> {
        if !self.cursor.next_empty_slot()? {
            self.cursor.grow_chain()?;
        }
        self.cursor.insert_here(record)
    }
}
