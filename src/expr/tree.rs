//! The filter-expression tree and its evaluator (spec.md §4.7), expressed as
//! a tagged union per the design note in spec.md §9 ("Variant expression
//! tree"). Grounded on the original `expr.c`'s `evalExpr`/`valueSmaller`/
//! `valueEquals`/`boolNot`/`boolAnd`/`boolOr`.

use crate::error::{Error, Result};
use crate::expr::schema::Schema;
use crate::expr::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Not,
    And,
    Or,
    Eq,
    Lt,
}

impl OpKind {
    /// Whether this operator takes one child (`Not`) or two.
    fn arity(self) -> usize {
        match self {
            OpKind::Not => 1,
            _ => 2,
        }
    }
}

/// A filter expression: a constant, an attribute reference by schema index,
/// or an operator over 1–2 sub-expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(Value),
    AttrRef(usize),
    Op { kind: OpKind, children: Vec<Expr> },
}

impl Expr {
    pub fn not(child: Expr) -> Expr {
        Expr::Op {
            kind: OpKind::Not,
            children: vec![child],
        }
    }

    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::Op {
            kind: OpKind::And,
            children: vec![left, right],
        }
    }

    pub fn or(left: Expr, right: Expr) -> Expr {
        Expr::Op {
            kind: OpKind::Or,
            children: vec![left, right],
        }
    }

    pub fn eq(left: Expr, right: Expr) -> Expr {
        Expr::Op {
            kind: OpKind::Eq,
            children: vec![left, right],
        }
    }

    pub fn lt(left: Expr, right: Expr) -> Expr {
        Expr::Op {
            kind: OpKind::Lt,
            children: vec![left, right],
        }
    }

    /// Evaluates this expression against one tuple's encoded bytes, per
    /// spec.md §4.7. Total over the variants: every reachable node returns a
    /// `Value` or a well-defined error, never panics.
    pub fn eval(&self, record: &[u8], schema: &Schema) -> Result<Value> {
        match self {
            Expr::Const(v) => Ok(v.clone()),
            Expr::AttrRef(index) => {
                let offset = schema.attr_offset(*index);
                let size = schema.attr_size(*index);
                Value::decode(&record[offset..offset + size], schema.attrs[*index].data_type)
            }
            Expr::Op { kind, children } => {
                if children.len() != kind.arity() {
                    return Err(Error::UnsupportedDataType);
                }
                let left = children[0].eval(record, schema)?;
                match kind {
                    OpKind::Not => Ok(Value::Bool(!left.as_bool()?)),
                    OpKind::And => {
                        let right = children[1].eval(record, schema)?;
                        Ok(Value::Bool(left.as_bool()? && right.as_bool()?))
                    }
                    OpKind::Or => {
                        let right = children[1].eval(record, schema)?;
                        Ok(Value::Bool(left.as_bool()? || right.as_bool()?))
                    }
                    OpKind::Eq => {
                        let right = children[1].eval(record, schema)?;
                        Ok(Value::Bool(values_equal(&left, &right)?))
                    }
                    OpKind::Lt => {
                        let right = children[1].eval(record, schema)?;
                        Ok(Value::Bool(value_smaller(&left, &right)?))
                    }
                }
            }
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> Result<bool> {
    if left.data_type() != right.data_type() {
        return Err(Error::CompareDifferentDataType);
    }
    Ok(left == right)
}

/// `<` on same-typed operands; strings compare lexicographically
/// (spec.md §4.7).
fn value_smaller(left: &Value, right: &Value) -> Result<bool> {
    if left.data_type() != right.data_type() {
        return Err(Error::CompareDifferentDataType);
    }
    Ok(match (left, right) {
        (Value::Int(l), Value::Int(r)) => l < r,
        (Value::Float(l), Value::Float(r)) => l < r,
        (Value::Bool(l), Value::Bool(r)) => l < r,
        (Value::String(l), Value::String(r)) => l < r,
        _ => unreachable!("data types already checked equal above"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::schema::AttrDef;
    use crate::expr::value::DataType;

    fn schema_a_int_b_string4() -> Schema {
        Schema::new(
            vec![
                AttrDef::new("a", DataType::Int, 0),
                AttrDef::new("b", DataType::String, 4),
            ],
            vec![0],
        )
        .unwrap()
    }

    fn encode_tuple(schema: &Schema, a: i32, b: &str) -> Vec<u8> {
        let mut buf = vec![0u8; schema.record_size()];
        Value::Int(a)
            .encode_into(&mut buf[schema.attr_offset(0)..schema.attr_offset(0) + schema.attr_size(0)])
            .unwrap();
        Value::String(b.to_string())
            .encode_into(&mut buf[schema.attr_offset(1)..schema.attr_offset(1) + schema.attr_size(1)])
            .unwrap();
        buf
    }

    #[test]
    fn attr_ref_decodes_correct_field() {
        let schema = schema_a_int_b_string4();
        let tuple = encode_tuple(&schema, 42, "hey");
        assert_eq!(Expr::AttrRef(0).eval(&tuple, &schema).unwrap(), Value::Int(42));
        assert_eq!(
            Expr::AttrRef(1).eval(&tuple, &schema).unwrap(),
            Value::String("hey".to_string())
        );
    }

    #[test]
    fn lt_filters_by_int_attribute() {
        let schema = schema_a_int_b_string4();
        let cond = Expr::lt(Expr::AttrRef(0), Expr::Const(Value::Int(3)));
        for (a, expect) in [(1, true), (2, true), (3, false), (4, false)] {
            let tuple = encode_tuple(&schema, a, "x");
            assert_eq!(cond.eval(&tuple, &schema).unwrap(), Value::Bool(expect));
        }
    }

    #[test]
    fn type_mismatch_on_eq_fails() {
        let schema = schema_a_int_b_string4();
        let tuple = encode_tuple(&schema, 1, "x");
        let cond = Expr::eq(Expr::AttrRef(0), Expr::AttrRef(1));
        assert!(matches!(
            cond.eval(&tuple, &schema),
            Err(Error::CompareDifferentDataType)
        ));
    }

    #[test]
    fn not_requires_boolean_operand() {
        let schema = schema_a_int_b_string4();
        let tuple = encode_tuple(&schema, 1, "x");
        let cond = Expr::not(Expr::AttrRef(0));
        assert!(matches!(
            cond.eval(&tuple, &schema),
            Err(Error::BoolExprArgNotBoolean)
        ));
    }
}
