//! Record identity and the tuple buffer callers pass across the API
//! boundary (spec.md §3 "Record").

use crate::common::config::PageId;

/// `{ page, slot }` — identifies one tuple's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rid {
    pub page: PageId,
    pub slot: usize,
}

/// A tuple's identity plus its encoded bytes. Owned by the caller; the
/// record manager only ever borrows one during a single call, per spec.md §3
/// Lifecycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: Rid,
    pub data: Vec<u8>,
}

impl Record {
    pub fn new(record_size: usize) -> Self {
        Self {
            id: Rid { page: -1, slot: 0 },
            data: vec![0u8; record_size],
        }
    }
}
