//! Value types, schemas, and the filter-expression tree the scan facility
//! evaluates against each candidate tuple (spec.md §3 "Expression", §4.7).

pub mod schema;
pub mod tree;
pub mod value;

pub use schema::{AttrDef, Schema};
pub use tree::{Expr, OpKind};
pub use value::{DataType, Value};
