//! Schema: the attribute list and primary key a table is created with
//! (spec.md §3 "Schema").

use crate::common::config::{ATTR_NAME_SIZE, MAX_ATTRS, MAX_KEYS, TABLE_NAME_SIZE};
use crate::error::{Error, Result};
use crate::expr::value::{DataType, Value};

/// One declared attribute: name, type, and (for `STRING`) declared capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrDef {
    pub name: String,
    pub data_type: DataType,
    /// Only meaningful for `DataType::String`; ignored otherwise.
    pub type_length: usize,
}

impl AttrDef {
    pub fn new(name: impl Into<String>, data_type: DataType, type_length: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            type_length,
        }
    }
}

/// A table's attribute list plus primary key, independent of any particular
/// table instance. Owned outright rather than aliasing into catalog memory
/// (unlike the original's `rel->schema` pointing straight at catalog
/// storage) — a schema is small and short-lived enough that a plain copy
/// avoids threading catalog-page lifetimes through every caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub attrs: Vec<AttrDef>,
    pub key_attrs: Vec<usize>,
}

impl Schema {
    pub fn new(attrs: Vec<AttrDef>, key_attrs: Vec<usize>) -> Result<Self> {
        if attrs.len() > MAX_ATTRS {
            return Err(Error::NoMoreEntries);
        }
        if key_attrs.len() > MAX_KEYS {
            return Err(Error::NoMoreEntries);
        }
        for attr in &attrs {
            if attr.name.len() >= ATTR_NAME_SIZE {
                return Err(Error::AllocationFailed(format!(
                    "attribute name {:?} exceeds {ATTR_NAME_SIZE} bytes",
                    attr.name
                )));
            }
        }
        Ok(Self { attrs, key_attrs })
    }

    pub fn num_attr(&self) -> usize {
        self.attrs.len()
    }

    /// Encoded byte width of attribute `index`, per spec.md §6.
    pub fn attr_size(&self, index: usize) -> usize {
        let attr = &self.attrs[index];
        Value::encoded_size(attr.data_type, attr.type_length)
    }

    /// Byte offset of attribute `index` within one encoded tuple: attributes
    /// are concatenated in schema order (spec.md §6).
    pub fn attr_offset(&self, index: usize) -> usize {
        (0..index).map(|i| self.attr_size(i)).sum()
    }

    /// Total encoded tuple width — `recordSize` in spec.md's vocabulary.
    pub fn record_size(&self) -> usize {
        (0..self.attrs.len()).map(|i| self.attr_size(i)).sum()
    }
}

pub(crate) fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() >= TABLE_NAME_SIZE {
        return Err(Error::AllocationFailed(format!(
            "table name {name:?} must be 1..{TABLE_NAME_SIZE} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_size_sums_attribute_widths() {
        let schema = Schema::new(
            vec![
                AttrDef::new("a", DataType::Int, 0),
                AttrDef::new("b", DataType::String, 4),
            ],
            vec![0],
        )
        .unwrap();
        assert_eq!(schema.attr_size(0), 4);
        assert_eq!(schema.attr_size(1), 5);
        assert_eq!(schema.record_size(), 9);
        assert_eq!(schema.attr_offset(1), 4);
    }

    #[test]
    fn too_many_attrs_rejected() {
        let attrs = (0..MAX_ATTRS + 1)
            .map(|i| AttrDef::new(format!("a{i}"), DataType::Int, 0))
            .collect();
        assert!(Schema::new(attrs, vec![]).is_err());
    }
}
