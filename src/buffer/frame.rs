//! A buffer-pool frame: one in-memory page slot plus its book-keeping
//! (spec.md §3 "Frame").
//!
//! Grounded on the teacher's `storage::page::Page` (`Connor1996-bustubx`),
//! which keeps a fixed-size data array alongside a page id, pin count and
//! dirty flag. spec.md's single-threaded model (§5) means this crate does
//! not need the teacher's `Arc<RwLock<..>>` sharing — the buffer pool owns
//! the frame array outright and hands out borrowing `PageHandle`s instead.

use crate::common::config::{PageId, PAGE_SIZE};

#[derive(Debug)]
pub struct Frame {
    data: Box<[u8; PAGE_SIZE]>,
    page_id: Option<PageId>,
    pin_count: u32,
    dirty: bool,
    /// Bumped on every access (pin, mark-dirty, force, eviction); used by
    /// LRU selection and recorded for FIFO/LRU ordering observability.
    timestamp: u64,
}

impl Frame {
    pub fn empty() -> Self {
        Self {
            data: Box::new([0u8; PAGE_SIZE]),
            page_id: None,
            pin_count: 0,
            dirty: false,
            timestamp: 0,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.page_id.is_some()
    }

    pub fn page_id(&self) -> Option<PageId> {
        self.page_id
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }

    pub fn pin(&mut self) {
        self.pin_count += 1;
    }

    /// Decrements the pin count. Contract violation (spec.md §3 Invariants)
    /// if it would go negative — caught with a debug assertion, per
    /// SPEC_FULL.md section C.
    pub fn unpin(&mut self) {
        debug_assert!(self.pin_count > 0, "unpin of a frame with pin count 0");
        self.pin_count = self.pin_count.saturating_sub(1);
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn touch(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Installs a freshly loaded page into this frame, resetting all
    /// book-keeping. Caller is responsible for having evicted whatever the
    /// frame previously held.
    pub fn install(&mut self, page_id: PageId, bytes: &[u8; PAGE_SIZE], timestamp: u64) {
        self.data.copy_from_slice(bytes);
        self.page_id = Some(page_id);
        self.pin_count = 1;
        self.dirty = false;
        self.timestamp = timestamp;
    }

    /// Clears occupancy so the frame can be reused. Does not touch the
    /// data buffer — the next `install` overwrites it in full.
    pub fn vacate(&mut self) {
        self.page_id = None;
        self.pin_count = 0;
        self.dirty = false;
    }
}
