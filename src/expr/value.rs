//! Typed attribute values and their fixed-width binary encoding (spec.md §6
//! "Tuple binary layout").
//!
//! Grounded on the original `expr.c`/`tables.h` `Value`/`DataType` pair
//! (`DT_INT`/`DT_FLOAT`/`DT_BOOL`/`DT_STRING`), widened from the teacher's
//! `dbtype::Value` (which only models `Boolean`/`TinyInt`/`SmallInt`/
//! `Integer`) to the four types spec.md's Schema actually needs.

use crate::error::{Error, Result};

/// One of the four attribute types spec.md §3 allows in a Schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Float,
    Bool,
    String,
}

impl DataType {
    /// Wire representation used by the catalog's on-disk `TableDescriptor`
    /// (spec.md §6 `i32 dataTypes[8]`).
    pub fn to_i32(self) -> i32 {
        match self {
            DataType::Int => 0,
            DataType::Float => 1,
            DataType::Bool => 2,
            DataType::String => 3,
        }
    }

    pub fn from_i32(v: i32) -> Result<Self> {
        match v {
            0 => Ok(DataType::Int),
            1 => Ok(DataType::Float),
            2 => Ok(DataType::Bool),
            3 => Ok(DataType::String),
            _ => Err(Error::UnsupportedDataType),
        }
    }
}

/// A typed attribute value, either a constant in an expression tree or the
/// decoded contents of one tuple field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Bool(_) => DataType::Bool,
            Value::String(_) => DataType::String,
        }
    }

    /// Encoded width on disk for this data type. `type_length` is the
    /// schema-declared string capacity and is ignored for other types, per
    /// spec.md §6: INT = 4, FLOAT = 4, BOOL = 1, STRING = `typeLength + 1`.
    pub fn encoded_size(data_type: DataType, type_length: usize) -> usize {
        match data_type {
            DataType::Int => 4,
            DataType::Float => 4,
            DataType::Bool => 1,
            DataType::String => type_length + 1,
        }
    }

    /// Writes this value into `buf` using the fixed-width little-endian
    /// layout spec.md §6 describes. `buf` must be exactly
    /// `encoded_size(self.data_type(), type_length)` bytes.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
        match self {
            Value::Int(v) => buf.copy_from_slice(&v.to_le_bytes()),
            Value::Float(v) => buf.copy_from_slice(&v.to_le_bytes()),
            Value::Bool(v) => buf[0] = *v as u8,
            Value::String(s) => {
                let bytes = s.as_bytes();
                if bytes.len() >= buf.len() {
                    return Err(Error::AllocationFailed(format!(
                        "string value {s:?} does not fit in {} bytes",
                        buf.len()
                    )));
                }
                buf.fill(0);
                buf[..bytes.len()].copy_from_slice(bytes);
            }
        }
        Ok(())
    }

    /// Decodes a value of `data_type` from `buf`, NUL-trimming strings.
    pub fn decode(buf: &[u8], data_type: DataType) -> Result<Self> {
        Ok(match data_type {
            DataType::Int => {
                let arr: [u8; 4] = buf
                    .try_into()
                    .map_err(|_| Error::UnsupportedDataType)?;
                Value::Int(i32::from_le_bytes(arr))
            }
            DataType::Float => {
                let arr: [u8; 4] = buf
                    .try_into()
                    .map_err(|_| Error::UnsupportedDataType)?;
                Value::Float(f32::from_le_bytes(arr))
            }
            DataType::Bool => Value::Bool(buf[0] != 0),
            DataType::String => {
                let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
                let s = String::from_utf8_lossy(&buf[..end]).into_owned();
                Value::String(s)
            }
        })
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(Error::BoolExprArgNotBoolean),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trips() {
        let mut buf = [0u8; 4];
        Value::Int(-7).encode_into(&mut buf).unwrap();
        assert_eq!(Value::decode(&buf, DataType::Int).unwrap(), Value::Int(-7));
    }

    #[test]
    fn string_round_trips_with_nul_padding() {
        let mut buf = [0xffu8; 5];
        Value::String("hi".to_string()).encode_into(&mut buf).unwrap();
        assert_eq!(&buf, b"hi\0\0\0");
        assert_eq!(
            Value::decode(&buf, DataType::String).unwrap(),
            Value::String("hi".to_string())
        );
    }

    #[test]
    fn string_too_long_fails() {
        let mut buf = [0u8; 3];
        assert!(Value::String("abc".to_string()).encode_into(&mut buf).is_err());
    }
}
