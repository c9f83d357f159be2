//! Operators over values.
//!
//! Integer arithmetic is checked: overflow and division by zero are errors
//! rather than wrapping or panicking.

use crate::error::{OperationError, OperationResult};
use crate::object::Value;
use std::cmp::Ordering;

/// Binary operators understood by [`binary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    /// Operator spelling for messages.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }
}

// =============================================================================
// Binary Operators
// =============================================================================

/// Apply a binary operator.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> OperationResult<Value> {
    match op {
        BinaryOp::Equal => return Ok(Value::Boolean(left == right)),
        BinaryOp::NotEqual => return Ok(Value::Boolean(left != right)),
        _ => {}
    }

    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_binary(op, *a, *b),
        (Value::String(a), Value::String(b)) => match op {
            BinaryOp::Add => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                Ok(Value::string(joined))
            }
            _ => match compare(op, a.as_ref().cmp(b.as_ref())) {
                Some(result) => Ok(Value::Boolean(result)),
                None => Err(unsupported(op, left, right)),
            },
        },
        _ => Err(unsupported(op, left, right)),
    }
}

fn integer_binary(op: BinaryOp, a: i64, b: i64) -> OperationResult<Value> {
    let checked = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Mod if b == 0 => return Err(OperationError::DivisionByZero),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod => a.checked_rem(b),
        _ => {
            return match compare(op, a.cmp(&b)) {
                Some(result) => Ok(Value::Boolean(result)),
                None => Err(OperationError::UnsupportedBinary {
                    op: op.symbol(),
                    left: "INTEGER",
                    right: "INTEGER",
                }),
            };
        }
    };
    checked
        .map(Value::Integer)
        .ok_or(OperationError::IntegerOverflow(op.symbol()))
}

fn compare(op: BinaryOp, ordering: Ordering) -> Option<bool> {
    Some(match op {
        BinaryOp::Less => ordering == Ordering::Less,
        BinaryOp::LessEqual => ordering != Ordering::Greater,
        BinaryOp::Greater => ordering == Ordering::Greater,
        BinaryOp::GreaterEqual => ordering != Ordering::Less,
        _ => return None,
    })
}

#[inline]
fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> OperationError {
    OperationError::UnsupportedBinary {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

// =============================================================================
// Unary Operators
// =============================================================================

/// Arithmetic negation: `-x`.
pub fn negate(operand: &Value) -> OperationResult<Value> {
    match operand {
        Value::Integer(i) => i
            .checked_neg()
            .map(Value::Integer)
            .ok_or(OperationError::IntegerOverflow("-")),
        other => Err(OperationError::UnsupportedUnary {
            op: "-",
            operand: other.type_name(),
        }),
    }
}

/// Logical not: `!x`, defined for every value through truthiness.
#[inline]
#[must_use]
pub fn not(operand: &Value) -> Value {
    Value::Boolean(!operand.is_truthy())
}

// =============================================================================
// Indexing
// =============================================================================

/// `collection[index]`. Out-of-range array indices and missing hash keys
/// yield `null`.
pub fn index(collection: &Value, index: &Value) -> OperationResult<Value> {
    match (collection, index) {
        (Value::Array(elements), Value::Integer(i)) => Ok(usize::try_from(*i)
            .ok()
            .and_then(|i| elements.get(i))
            .cloned()
            .unwrap_or(Value::Null)),
        (Value::Hash(table), key) => {
            let key = key.hash_key()?;
            Ok(table.get(&key).cloned().unwrap_or(Value::Null))
        }
        _ => Err(OperationError::NotIndexable {
            collection: collection.type_name(),
            index: index.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::Integer(i)
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(binary(BinaryOp::Add, &int(2), &int(3)).unwrap(), int(5));
        assert_eq!(binary(BinaryOp::Sub, &int(2), &int(3)).unwrap(), int(-1));
        assert_eq!(binary(BinaryOp::Mul, &int(4), &int(3)).unwrap(), int(12));
        assert_eq!(binary(BinaryOp::Div, &int(7), &int(2)).unwrap(), int(3));
        assert_eq!(binary(BinaryOp::Mod, &int(-7), &int(3)).unwrap(), int(-1));
    }

    #[test]
    fn test_arithmetic_faults() {
        assert_eq!(
            binary(BinaryOp::Div, &int(1), &int(0)),
            Err(OperationError::DivisionByZero)
        );
        assert_eq!(
            binary(BinaryOp::Mod, &int(1), &int(0)),
            Err(OperationError::DivisionByZero)
        );
        assert_eq!(
            binary(BinaryOp::Add, &int(i64::MAX), &int(1)),
            Err(OperationError::IntegerOverflow("+"))
        );
        assert_eq!(
            binary(BinaryOp::Div, &int(i64::MIN), &int(-1)),
            Err(OperationError::IntegerOverflow("/"))
        );
        assert_eq!(negate(&int(i64::MIN)), Err(OperationError::IntegerOverflow("-")));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(binary(BinaryOp::Less, &int(1), &int(2)).unwrap(), Value::Boolean(true));
        assert_eq!(binary(BinaryOp::GreaterEqual, &int(2), &int(2)).unwrap(), Value::Boolean(true));
        assert_eq!(binary(BinaryOp::Greater, &"b".into(), &"a".into()).unwrap(), Value::Boolean(true));
        assert_eq!(binary(BinaryOp::Equal, &int(1), &true.into()).unwrap(), Value::Boolean(false));
        assert_eq!(binary(BinaryOp::NotEqual, &Value::Null, &Value::Null).unwrap(), Value::Boolean(false));
        assert!(binary(BinaryOp::Less, &true.into(), &false.into()).is_err());
    }

    #[test]
    fn test_string_concatenation() {
        let joined = binary(BinaryOp::Add, &"foo".into(), &"bar".into()).unwrap();
        assert_eq!(joined, Value::string("foobar"));
        let err = binary(BinaryOp::Sub, &"foo".into(), &"bar".into()).unwrap_err();
        assert_eq!(err.to_string(), "unsupported operand types for -: STRING and STRING");
    }

    #[test]
    fn test_unary() {
        assert_eq!(negate(&int(5)).unwrap(), int(-5));
        assert!(negate(&true.into()).is_err());
        assert_eq!(not(&int(0)), Value::Boolean(false));
        assert_eq!(not(&Value::Null), Value::Boolean(true));
    }

    #[test]
    fn test_indexing() {
        let array = Value::array(vec![int(1), int(2), int(3)]);
        assert_eq!(index(&array, &int(1)).unwrap(), int(2));
        assert_eq!(index(&array, &int(3)).unwrap(), Value::Null);
        assert_eq!(index(&array, &int(-1)).unwrap(), Value::Null);

        let hash = Value::hash_from_pairs([(Value::from("a"), int(5))]).unwrap();
        assert_eq!(index(&hash, &"a".into()).unwrap(), int(5));
        assert_eq!(index(&hash, &"b".into()).unwrap(), Value::Null);
        assert_eq!(
            index(&hash, &array),
            Err(OperationError::Unhashable("ARRAY"))
        );
        assert!(index(&int(1), &int(0)).is_err());
    }
}
