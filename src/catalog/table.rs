//! Table Descriptor: the fixed-size, catalog-resident entry describing one
//! table's schema and page chain (spec.md §3 "Table Descriptor", §6 binary
//! layout). Grounded on the original `ResourceManagerSchema`.

use crate::common::config::{
    PageId, ATTR_NAME_SIZE, MAX_ATTRS, MAX_KEYS, NO_PAGE, TABLE_DESCRIPTOR_ENCODED_SIZE,
    TABLE_NAME_SIZE,
};
use crate::error::{Error, Result};
use crate::expr::schema::{validate_table_name, AttrDef, Schema};
use crate::expr::value::DataType;

/// The persisted part of a table's catalog entry. The transient
/// "in-memory pinned-page handle used while the table is open" spec.md §3
/// mentions is deliberately NOT a field here — spec.md §6 notes it is never
/// persisted, and it is owned by `RecordManager`'s open-table map instead
/// (see `record_manager::OpenTable`), matching the original's
/// `table->handle` being malloc'd only while a table is open.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    pub name: String,
    pub schema: Schema,
    pub num_tuples: i32,
    pub head_page: PageId,
}

impl TableDescriptor {
    pub fn new(name: &str, schema: Schema, head_page: PageId) -> Result<Self> {
        validate_table_name(name)?;
        Ok(Self {
            name: name.to_string(),
            schema,
            num_tuples: 0,
            head_page,
        })
    }

    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len(), TABLE_DESCRIPTOR_ENCODED_SIZE);
        let mut off = 0;

        write_fixed_str(&mut buf[off..off + TABLE_NAME_SIZE], &self.name);
        off += TABLE_NAME_SIZE;

        buf[off..off + 4].copy_from_slice(&(self.schema.num_attr() as i32).to_le_bytes());
        off += 4;

        for i in 0..MAX_ATTRS {
            let slot = &mut buf[off + i * ATTR_NAME_SIZE..off + (i + 1) * ATTR_NAME_SIZE];
            match self.schema.attrs.get(i) {
                Some(attr) => write_fixed_str(slot, &attr.name),
                None => slot.fill(0),
            }
        }
        off += MAX_ATTRS * ATTR_NAME_SIZE;

        for i in 0..MAX_ATTRS {
            let v = self
                .schema
                .attrs
                .get(i)
                .map(|a| a.data_type.to_i32())
                .unwrap_or(0);
            buf[off + i * 4..off + (i + 1) * 4].copy_from_slice(&v.to_le_bytes());
        }
        off += MAX_ATTRS * 4;

        for i in 0..MAX_ATTRS {
            let v = self
                .schema
                .attrs
                .get(i)
                .map(|a| a.type_length as i32)
                .unwrap_or(0);
            buf[off + i * 4..off + (i + 1) * 4].copy_from_slice(&v.to_le_bytes());
        }
        off += MAX_ATTRS * 4;

        buf[off..off + 4].copy_from_slice(&(self.schema.key_attrs.len() as i32).to_le_bytes());
        off += 4;

        for i in 0..MAX_KEYS {
            let v = self.schema.key_attrs.get(i).copied().unwrap_or(0) as i32;
            buf[off + i * 4..off + (i + 1) * 4].copy_from_slice(&v.to_le_bytes());
        }
        off += MAX_KEYS * 4;

        buf[off..off + 4].copy_from_slice(&self.num_tuples.to_le_bytes());
        off += 4;

        buf[off..off + 4].copy_from_slice(&self.head_page.to_le_bytes());
        off += 4;

        debug_assert_eq!(off, TABLE_DESCRIPTOR_ENCODED_SIZE);
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        debug_assert_eq!(buf.len(), TABLE_DESCRIPTOR_ENCODED_SIZE);
        let mut off = 0;

        let name = read_fixed_str(&buf[off..off + TABLE_NAME_SIZE]);
        off += TABLE_NAME_SIZE;

        let num_attr = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap()) as usize;
        off += 4;

        let mut attr_names = Vec::with_capacity(num_attr);
        for i in 0..MAX_ATTRS {
            let slot = &buf[off + i * ATTR_NAME_SIZE..off + (i + 1) * ATTR_NAME_SIZE];
            if i < num_attr {
                attr_names.push(read_fixed_str(slot));
            }
        }
        off += MAX_ATTRS * ATTR_NAME_SIZE;

        let mut data_types = Vec::with_capacity(num_attr);
        for i in 0..MAX_ATTRS {
            let v = i32::from_le_bytes(buf[off + i * 4..off + (i + 1) * 4].try_into().unwrap());
            if i < num_attr {
                data_types.push(DataType::from_i32(v)?);
            }
        }
        off += MAX_ATTRS * 4;

        let mut type_lengths = Vec::with_capacity(num_attr);
        for i in 0..MAX_ATTRS {
            let v = i32::from_le_bytes(buf[off + i * 4..off + (i + 1) * 4].try_into().unwrap());
            if i < num_attr {
                type_lengths.push(v as usize);
            }
        }
        off += MAX_ATTRS * 4;

        let key_size = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap()) as usize;
        off += 4;

        let mut key_attrs = Vec::with_capacity(key_size);
        for i in 0..MAX_KEYS {
            let v = i32::from_le_bytes(buf[off + i * 4..off + (i + 1) * 4].try_into().unwrap());
            if i < key_size {
                key_attrs.push(v as usize);
            }
        }
        off += MAX_KEYS * 4;

        let num_tuples = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        off += 4;

        let head_page = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        off += 4;
        debug_assert_eq!(off, TABLE_DESCRIPTOR_ENCODED_SIZE);

        let attrs = attr_names
            .into_iter()
            .zip(data_types)
            .zip(type_lengths)
            .map(|((name, data_type), type_length)| AttrDef {
                name,
                data_type,
                type_length,
            })
            .collect();

        Ok(Self {
            name,
            schema: Schema::new(attrs, key_attrs)?,
            num_tuples,
            head_page,
        })
    }
}

fn write_fixed_str(slot: &mut [u8], s: &str) {
    slot.fill(0);
    let bytes = s.as_bytes();
    let n = bytes.len().min(slot.len() - 1);
    slot[..n].copy_from_slice(&bytes[..n]);
}

fn read_fixed_str(slot: &[u8]) -> String {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}

/// An empty descriptor slot, used to zero unused catalog capacity. `NO_PAGE`
/// head page marks it unoccupied.
pub fn empty_slot_head_page() -> PageId {
    NO_PAGE
}
