//! Compile-time constants shared across the storage stack.
//!
//! Kept as plain constants/type aliases rather than a loaded config file —
//! see SPEC_FULL.md section D for why.

/// Size in bytes of every page, frame, and disk block.
pub const PAGE_SIZE: usize = 4096;

/// Sentinel meaning "no page" (end of a chain, empty free list, unset head).
pub const NO_PAGE: PageId = -1;

/// Page numbers are signed so `NO_PAGE` can live in the same space.
pub type PageId = i32;

/// Index into the buffer pool's frame array.
pub type FrameId = usize;

/// Catalog page 0 always occupies this page number.
pub const CATALOG_PAGE_ID: PageId = 0;

/// Default pool size used by `RecordManager::open` (spec.md §4.5).
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Bounded length of a table name, NUL-terminated on disk.
pub const TABLE_NAME_SIZE: usize = 16;

/// Bounded length of an attribute name, NUL-terminated on disk.
pub const ATTR_NAME_SIZE: usize = 16;

/// Maximum number of attributes a schema may declare.
pub const MAX_ATTRS: usize = 8;

/// Maximum number of attributes that may form a primary key.
pub const MAX_KEYS: usize = 4;

/// Header bytes of one encoded `TableDescriptor` (see `catalog::table` for the
/// layout this mirrors): name + numAttr + attrNames + dataTypes + typeLength
/// + keySize + keyAttrs + numTuples + headPage.
pub const TABLE_DESCRIPTOR_ENCODED_SIZE: usize = TABLE_NAME_SIZE
    + 4
    + MAX_ATTRS * ATTR_NAME_SIZE
    + MAX_ATTRS * 4
    + MAX_ATTRS * 4
    + 4
    + MAX_KEYS * 4
    + 4
    + 4;

/// `⌊P / (sizeof(TableDescriptor) + 2·sizeof(int))⌋`, per spec.md §4.3.
pub const MAX_TABLES: usize = PAGE_SIZE / (TABLE_DESCRIPTOR_ENCODED_SIZE + 2 * 4);

/// Bytes of a record page's fixed header `{ nextPage, prevPage, numSlots }`.
pub const PAGE_HEADER_SIZE: usize = 12;

/// Bytes of the catalog page's fixed header `{ totalNumPages, freePage, numTables }`.
pub const CATALOG_HEADER_SIZE: usize = 12;
