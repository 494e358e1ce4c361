//! Slot bitmap and tuple-data accessors within one record page's bytes.
//! Grounded on the original `getSlots`/`getTupleData`/`getTupleDataAt`.
//!
//! Page layout (spec.md §6): `{ header }{ numSlots bytes of bitmap }{ numSlots
//! × recordSize bytes of tuples }`.

use crate::common::config::PAGE_SIZE;
use crate::record::page_header::HEADER_SIZE;

/// `numSlots = ⌊(P − headerSize) / (recordSize + 1)⌋`, per spec.md §4.5.
/// One byte of bitmap per slot, hence the `+ 1`.
pub fn compute_num_slots(record_size: usize) -> usize {
    (PAGE_SIZE - HEADER_SIZE) / (record_size + 1)
}

fn bitmap_offset() -> usize {
    HEADER_SIZE
}

fn tuple_data_offset(num_slots: usize) -> usize {
    HEADER_SIZE + num_slots
}

pub fn is_slot_set(buf: &[u8], slot: usize) -> bool {
    buf[bitmap_offset() + slot] != 0
}

pub fn set_slot(buf: &mut [u8], slot: usize, occupied: bool) {
    buf[bitmap_offset() + slot] = occupied as u8;
}

pub fn clear_all_slots(buf: &mut [u8], num_slots: usize) {
    let off = bitmap_offset();
    buf[off..off + num_slots].fill(0);
}

pub fn tuple_slice<'a>(buf: &'a [u8], num_slots: usize, slot: usize, record_size: usize) -> &'a [u8] {
    let start = tuple_data_offset(num_slots) + slot * record_size;
    &buf[start..start + record_size]
}

pub fn tuple_slice_mut<'a>(
    buf: &'a mut [u8],
    num_slots: usize,
    slot: usize,
    record_size: usize,
) -> &'a mut [u8] {
    let start = tuple_data_offset(num_slots) + slot * record_size;
    &mut buf[start..start + record_size]
}
