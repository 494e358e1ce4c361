//! The fixed header at the start of every record page (and every free-list
//! page, since the free list reuses the same `{nextPage, prevPage}` fields —
//! spec.md §4.4). Grounded on the original `RM_PageHeader`/`getPageHeader`.

use crate::common::config::{PageId, NO_PAGE, PAGE_HEADER_SIZE};

/// `{ nextPage, prevPage, numSlots }`, packed little-endian at offset 0 of a
/// page's bytes (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub next_page: PageId,
    pub prev_page: PageId,
    pub num_slots: i32,
}

impl PageHeader {
    pub fn empty() -> Self {
        Self {
            next_page: NO_PAGE,
            prev_page: NO_PAGE,
            num_slots: 0,
        }
    }

    pub fn decode(buf: &[u8]) -> Self {
        Self {
            next_page: i32::from_le_bytes(buf[0..4].try_into().unwrap()),
            prev_page: i32::from_le_bytes(buf[4..8].try_into().unwrap()),
            num_slots: i32::from_le_bytes(buf[8..12].try_into().unwrap()),
        }
    }

    pub fn encode_into(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.next_page.to_le_bytes());
        buf[4..8].copy_from_slice(&self.prev_page.to_le_bytes());
        buf[8..12].copy_from_slice(&self.num_slots.to_le_bytes());
    }
}

pub const HEADER_SIZE: usize = PAGE_HEADER_SIZE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let header = PageHeader {
            next_page: 3,
            prev_page: NO_PAGE,
            num_slots: 5,
        };
        let mut buf = [0u8; HEADER_SIZE];
        header.encode_into(&mut buf);
        assert_eq!(PageHeader::decode(&buf), header);
    }
}
