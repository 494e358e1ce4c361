//! Traverses a table's page chain slot by slot, pinning pages as it crosses
//! them and always leaving non-head pages unpinned on close (spec.md §4.6).
//!
//! Grounded on the original `BEGIN_SLOT_WALK`/`getNextSlotInWalk`/
//! `closeSlotWalk`, reworked from that macro-and-recursion shape into an
//! explicit iterator that a caller drives with `advance`.

use crate::buffer::pool::{BufferPool, PageHandle};
use crate::common::config::{PageId, NO_PAGE};
use crate::error::Result;
use crate::record::page_header::PageHeader;

pub struct SlotWalk {
    head_page: PageId,
    current: PageHandle,
    slot_index: i64,
}

impl SlotWalk {
    /// Starts a walk from the table's already-pinned head page.
    pub fn begin(head: PageHandle) -> Self {
        Self {
            head_page: head.page_id(),
            current: head,
            slot_index: -1,
        }
    }

    pub fn current_handle(&self) -> PageHandle {
        self.current
    }

    /// Valid only after `advance` has returned `Some`.
    pub fn slot_index(&self) -> usize {
        self.slot_index.max(0) as usize
    }

    /// Moves to the next slot, crossing into the next page of the chain
    /// when the current page is exhausted. Returns `None` at end of chain.
    pub fn advance(&mut self, pool: &mut BufferPool) -> Result<Option<usize>> {
        let header = PageHeader::decode(pool.data(self.current)?);
        if self.slot_index + 1 < header.num_slots as i64 {
            self.slot_index += 1;
            return Ok(Some(self.slot_index as usize));
        }

        if header.next_page == NO_PAGE {
            return Ok(None);
        }

        let next = pool.pin_page(header.next_page)?;
        if self.current.page_id() != self.head_page {
            pool.unpin_page(self.current)?;
        }
        self.current = next;
        self.slot_index = 0;
        Ok(Some(0))
    }

    /// Releases any non-head page still pinned by this walk. The head page
    /// stays pinned — it belongs to the table for its entire open lifetime.
    pub fn close(self, pool: &mut BufferPool) -> Result<()> {
        if self.current.page_id() != self.head_page {
            pool.unpin_page(self.current)?;
        }
        Ok(())
    }
}
