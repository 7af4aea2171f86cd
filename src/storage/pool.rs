//! # Page Buffer Pool
//!
//! Free-list pool of page-sized buffers. Acquiring pops the free list or
//! allocates; a `PooledBuffer` returns itself to the pool when dropped,
//! so the cache and pager never free page memory piecemeal.
//!
//! Buffers are *not* zeroed on release or reuse. The one place that needs
//! fresh-page semantics (`Pager::new_page`) zeroes explicitly.
//!
//! `PooledBuffer` uses `ManuallyDrop` instead of `Option` so the buffer
//! is always valid until `Drop`, with no unreachable empty state.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;

/// A pool of reusable page-sized buffers.
///
/// Cloning is cheap and shares the underlying free list.
#[derive(Debug)]
pub struct PagePool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    page_size: usize,
    free: Mutex<Vec<Box<[u8]>>>,
}

impl PagePool {
    pub fn new(page_size: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                page_size,
                free: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Acquire a buffer of exactly `page_size` bytes. Contents are
    /// whatever the previous user left behind.
    pub fn acquire(&self) -> PooledBuffer {
        let buffer = self.inner.free.lock().pop();
        let buffer =
            buffer.unwrap_or_else(|| vec![0u8; self.inner.page_size].into_boxed_slice());

        PooledBuffer {
            buffer: ManuallyDrop::new(buffer),
            pool: Arc::clone(&self.inner),
        }
    }

    /// Pre-allocate `n` buffers onto the free list.
    pub fn preheat(&self, n: usize) {
        let buffers: Vec<_> = (0..n).map(|_| self.acquire()).collect();
        drop(buffers);
    }

    pub fn page_size(&self) -> usize {
        self.inner.page_size
    }

    /// Number of buffers currently sitting on the free list.
    pub fn available(&self) -> usize {
        self.inner.free.lock().len()
    }
}

impl Clone for PagePool {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// A page buffer that returns to its pool when dropped.
pub struct PooledBuffer {
    buffer: ManuallyDrop<Box<[u8]>>,
    pool: Arc<PoolInner>,
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.buffer.len())
            .finish()
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // SAFETY: drop runs once; the buffer is valid until this point.
        let buffer = unsafe { ManuallyDrop::take(&mut self.buffer) };
        self.pool.free.lock().push(buffer);
    }
}
