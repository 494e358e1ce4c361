//! The System Catalog (spec.md §3 "Catalog", §4.3) and the Free-Page List
//! (§4.4), both resident in the catalog's own page 0.
//!
//! Grounded on the original `record_mgr.c`'s `RM_SystemCatalog`,
//! `getTableByName`, `getFreePage`/`appendToFreeList`. Operates directly on
//! the catalog page's bytes through the buffer pool rather than a borrowed
//! struct pointer (as the original casts `handle->data` to
//! `RM_SystemCatalog*`) — Rust has no aliasing-safe equivalent of that cast,
//! so reads/writes go through explicit encode/decode at fixed offsets.

pub mod table;

use crate::buffer::pool::{BufferPool, PageHandle};
use crate::common::config::{
    PageId, CATALOG_HEADER_SIZE, MAX_TABLES, NO_PAGE, TABLE_DESCRIPTOR_ENCODED_SIZE,
};
use crate::error::{Error, Result};
use crate::record::page_header::PageHeader;
use table::TableDescriptor;

/// `{ totalNumPages, freePage, numTables }`, packed little-endian at offset
/// 0 of the catalog page (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogHeader {
    pub total_num_pages: PageId,
    pub free_page: PageId,
    pub num_tables: i32,
}

impl CatalogHeader {
    fn decode(buf: &[u8]) -> Self {
        Self {
            total_num_pages: i32::from_le_bytes(buf[0..4].try_into().unwrap()),
            free_page: i32::from_le_bytes(buf[4..8].try_into().unwrap()),
            num_tables: i32::from_le_bytes(buf[8..12].try_into().unwrap()),
        }
    }

    fn encode_into(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.total_num_pages.to_le_bytes());
        buf[4..8].copy_from_slice(&self.free_page.to_le_bytes());
        buf[8..12].copy_from_slice(&self.num_tables.to_le_bytes());
    }
}

fn table_slot_offset(index: usize) -> usize {
    CATALOG_HEADER_SIZE + index * TABLE_DESCRIPTOR_ENCODED_SIZE
}

pub fn read_header(pool: &BufferPool, catalog: PageHandle) -> Result<CatalogHeader> {
    Ok(CatalogHeader::decode(pool.data(catalog)?))
}

fn write_header(pool: &mut BufferPool, catalog: PageHandle, header: CatalogHeader) -> Result<()> {
    header.encode_into(pool.data_mut(catalog)?);
    pool.mark_dirty(catalog)
}

/// Initializes a freshly created catalog page (spec.md §4.3, SPEC_FULL.md
/// section F.1). Must only be called once, right after the page file was
/// created.
pub fn bootstrap(pool: &mut BufferPool, catalog: PageHandle) -> Result<()> {
    pool.data_mut(catalog)?.fill(0);
    write_header(
        pool,
        catalog,
        CatalogHeader {
            total_num_pages: 1,
            free_page: NO_PAGE,
            num_tables: 0,
        },
    )
}

pub fn read_table_at(pool: &BufferPool, catalog: PageHandle, index: usize) -> Result<TableDescriptor> {
    let off = table_slot_offset(index);
    TableDescriptor::decode(&pool.data(catalog)?[off..off + TABLE_DESCRIPTOR_ENCODED_SIZE])
}

pub fn write_table_at(
    pool: &mut BufferPool,
    catalog: PageHandle,
    index: usize,
    desc: &TableDescriptor,
) -> Result<()> {
    let off = table_slot_offset(index);
    desc.encode_into(&mut pool.data_mut(catalog)?[off..off + TABLE_DESCRIPTOR_ENCODED_SIZE]);
    pool.mark_dirty(catalog)
}

/// Linear scan for a table by name, per the original `getTableByName`.
pub fn lookup_table(
    pool: &BufferPool,
    catalog: PageHandle,
    name: &str,
) -> Result<Option<(usize, TableDescriptor)>> {
    let header = read_header(pool, catalog)?;
    for i in 0..header.num_tables as usize {
        let desc = read_table_at(pool, catalog, i)?;
        if desc.name == name {
            return Ok(Some((i, desc)));
        }
    }
    Ok(None)
}

/// Appends a new table descriptor. Fails with `NoMoreEntries` if the catalog
/// is already at `MAX_TABLES` capacity (spec.md §4.5).
pub fn append_table(pool: &mut BufferPool, catalog: PageHandle, desc: &TableDescriptor) -> Result<usize> {
    let mut header = read_header(pool, catalog)?;
    if header.num_tables as usize >= MAX_TABLES {
        return Err(Error::NoMoreEntries);
    }
    let index = header.num_tables as usize;
    write_table_at(pool, catalog, index, desc)?;
    header.num_tables += 1;
    write_header(pool, catalog, header)?;
    Ok(index)
}

/// Removes the descriptor at `index`, compacting the array down
/// (spec.md §4.5 `deleteTable`).
pub fn remove_table_at(pool: &mut BufferPool, catalog: PageHandle, index: usize) -> Result<()> {
    let mut header = read_header(pool, catalog)?;
    let last = header.num_tables as usize - 1;
    for i in index..last {
        let next = read_table_at(pool, catalog, i + 1)?;
        write_table_at(pool, catalog, i, &next)?;
    }
    header.num_tables -= 1;
    write_header(pool, catalog, header)
}

pub fn mark_dirty(pool: &mut BufferPool, catalog: PageHandle) -> Result<()> {
    pool.mark_dirty(catalog)
}

/// Allocates a page from the free list, or grows the file by one page if
/// the list is empty (spec.md §4.4 `getFreePage`).
pub fn get_free_page(pool: &mut BufferPool, catalog: PageHandle) -> Result<PageId> {
    let header = read_header(pool, catalog)?;

    if header.free_page == NO_PAGE {
        let new_page = header.total_num_pages;
        let handle = pool.pin_page(new_page)?;
        PageHeader::empty().encode_into(pool.data_mut(handle)?);
        pool.mark_dirty(handle)?;
        pool.unpin_page(handle)?;

        write_header(
            pool,
            catalog,
            CatalogHeader {
                total_num_pages: header.total_num_pages + 1,
                ..header
            },
        )?;
        return Ok(new_page);
    }

    let new_page = header.free_page;
    let handle = pool.pin_page(new_page)?;
    let next_page = PageHeader::decode(pool.data(handle)?).next_page;
    PageHeader::empty().encode_into(pool.data_mut(handle)?);
    pool.mark_dirty(handle)?;
    pool.unpin_page(handle)?;

    write_header(
        pool,
        catalog,
        CatalogHeader {
            free_page: next_page,
            ..header
        },
    )?;

    if next_page != NO_PAGE {
        let next_handle = pool.pin_page(next_page)?;
        let mut next_header = PageHeader::decode(pool.data(next_handle)?);
        next_header.prev_page = NO_PAGE;
        next_header.encode_into(pool.data_mut(next_handle)?);
        pool.mark_dirty(next_handle)?;
        pool.unpin_page(next_handle)?;
    }

    Ok(new_page)
}

/// Splices the chain rooted at `page_num` onto the front of the free list,
/// walking to its tail first (spec.md §4.4 `appendToFreeList`,
/// SPEC_FULL.md section F.2).
pub fn append_to_free_list(pool: &mut BufferPool, catalog: PageHandle, page_num: PageId) -> Result<()> {
    let header = read_header(pool, catalog)?;

    if header.free_page == NO_PAGE {
        let handle = pool.pin_page(page_num)?;
        let mut ph = PageHeader::decode(pool.data(handle)?);
        ph.prev_page = NO_PAGE;
        ph.encode_into(pool.data_mut(handle)?);
        pool.mark_dirty(handle)?;
        pool.unpin_page(handle)?;

        return write_header(
            pool,
            catalog,
            CatalogHeader {
                free_page: page_num,
                ..header
            },
        );
    }

    let mut tail = page_num;
    loop {
        let handle = pool.pin_page(tail)?;
        let next = PageHeader::decode(pool.data(handle)?).next_page;
        pool.unpin_page(handle)?;
        match next {
            NO_PAGE => break,
            p => tail = p,
        }
    }

    let old_head = header.free_page;

    let tail_handle = pool.pin_page(tail)?;
    let mut tail_header = PageHeader::decode(pool.data(tail_handle)?);
    tail_header.next_page = old_head;
    tail_header.encode_into(pool.data_mut(tail_handle)?);
    pool.mark_dirty(tail_handle)?;
    pool.unpin_page(tail_handle)?;

    let head_handle = pool.pin_page(old_head)?;
    let mut head_header = PageHeader::decode(pool.data(head_handle)?);
    head_header.prev_page = tail;
    head_header.encode_into(pool.data_mut(head_handle)?);
    pool.mark_dirty(head_handle)?;
    pool.unpin_page(head_handle)?;

    let first_handle = pool.pin_page(page_num)?;
    let mut first_header = PageHeader::decode(pool.data(first_handle)?);
    first_header.prev_page = NO_PAGE;
    first_header.encode_into(pool.data_mut(first_handle)?);
    pool.mark_dirty(first_handle)?;
    pool.unpin_page(first_handle)?;

    write_header(
        pool,
        catalog,
        CatalogHeader {
            free_page: page_num,
            ..header
        },
    )
}

/// Counts the free list by walking it (spec.md §6 `getNumFreePages`).
pub fn count_free_pages(pool: &mut BufferPool, catalog: PageHandle) -> Result<usize> {
    let header = read_header(pool, catalog)?;
    let mut count = 0;
    let mut cur = header.free_page;
    while cur != NO_PAGE {
        count += 1;
        let handle = pool.pin_page(cur)?;
        let next = PageHeader::decode(pool.data(handle)?).next_page;
        pool.unpin_page(handle)?;
        cur = next;
    }
    Ok(count)
}
