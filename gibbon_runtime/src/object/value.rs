//! The runtime value type shared by the bytecode VM and the evaluator.

use super::function::{Closure, CompiledFunction, Function};
use super::hash::{HashKey, HashTable};
use crate::builtins::Builtin;
use crate::error::OperationError;
use std::fmt;
use std::rc::Rc;

/// A Gibbon value.
///
/// Scalars are stored inline; aggregates and functions are reference counted
/// and never mutated after construction, so cloning a value is cheap.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// `true` or `false`.
    Boolean(bool),
    /// Immutable UTF-8 string.
    String(Rc<str>),
    /// Immutable ordered sequence.
    Array(Rc<Vec<Value>>),
    /// Immutable insertion-ordered map.
    Hash(Rc<HashTable>),
    /// Function produced by the tree-walking evaluator.
    Function(Rc<Function>),
    /// Function body compiled to bytecode. Only appears in the constant pool.
    CompiledFunction(Rc<CompiledFunction>),
    /// Compiled function plus its captured variables.
    Closure(Rc<Closure>),
    /// Built-in function.
    Builtin(Builtin),
}

// =============================================================================
// Construction
// =============================================================================

impl Value {
    /// Build a string value.
    #[inline]
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    /// Build an array value.
    #[inline]
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(elements))
    }

    /// Build a hash from `(key, value)` pairs. Later duplicates overwrite
    /// earlier ones but keep the first insertion position.
    pub fn hash_from_pairs(
        pairs: impl IntoIterator<Item = (Value, Value)>,
    ) -> Result<Self, OperationError> {
        let mut table = HashTable::default();
        for (key, value) in pairs {
            table.insert(key.hash_key()?, value);
        }
        Ok(Value::Hash(Rc::new(table)))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

// =============================================================================
// Inspection
// =============================================================================

impl Value {
    /// Upper-case type name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::String(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION",
            Value::Closure(_) => "CLOSURE",
            Value::Builtin(_) => "BUILTIN",
        }
    }

    /// `false` and `null` are falsy; everything else, including `0`, is truthy.
    #[inline]
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    /// Whether this is [`Value::Null`].
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer payload, if any.
    #[inline]
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Key for use in a hash, or an error for unhashable values.
    pub fn hash_key(&self) -> Result<HashKey, OperationError> {
        match self {
            Value::Integer(i) => Ok(HashKey::Integer(*i)),
            Value::Boolean(b) => Ok(HashKey::Boolean(*b)),
            Value::String(s) => Ok(HashKey::String(Rc::clone(s))),
            other => Err(OperationError::Unhashable(other.type_name())),
        }
    }
}

// =============================================================================
// Equality
// =============================================================================

impl PartialEq for Value {
    /// Structural equality for data, identity for functions.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Renders nested values; strings inside containers are quoted.
struct Nested<'a>(&'a Value);

impl fmt::Display for Nested<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::String(s) => write!(f, "{:?}", &**s),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::String(s) => f.write_str(s),
            Value::Array(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", Nested(element))?;
                }
                f.write_str("]")
            }
            Value::Hash(table) => {
                f.write_str("{")?;
                for (i, (key, value)) in table.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", Nested(&key.to_value()), Nested(value))?;
                }
                f.write_str("}")
            }
            Value::Function(function) => write!(f, "{function}"),
            Value::CompiledFunction(function) => {
                write!(f, "CompiledFunction[{}]", function.display_name())
            }
            Value::Closure(closure) => write!(f, "Closure[{}]", closure.function.display_name()),
            Value::Builtin(_) => f.write_str("builtin function"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::string("").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(Value::string("ab"), Value::from("ab"));
        assert_eq!(
            Value::array(vec![1.into(), true.into()]),
            Value::array(vec![1.into(), true.into()])
        );
        assert_ne!(Value::Integer(1), Value::Boolean(true));
        assert_ne!(Value::Null, Value::Boolean(false));
    }

    #[test]
    fn test_hash_equality_ignores_order() {
        let a = Value::hash_from_pairs([(Value::from(1), Value::from("x")), (Value::from(2), Value::from("y"))]).unwrap();
        let b = Value::hash_from_pairs([(Value::from(2), Value::from("y")), (Value::from(1), Value::from("x"))]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_values() {
        assert_eq!(Value::Integer(-5).to_string(), "-5");
        assert_eq!(Value::string("hi").to_string(), "hi");
        assert_eq!(Value::Null.to_string(), "null");
        let array = Value::array(vec![1.into(), "a".into(), Value::array(vec![])]);
        assert_eq!(array.to_string(), r#"[1, "a", []]"#);
        let hash = Value::hash_from_pairs([(Value::from("k"), Value::from(1)), (Value::from(true), Value::from("v"))]).unwrap();
        assert_eq!(hash.to_string(), r#"{"k": 1, true: "v"}"#);
        assert_eq!(Value::Builtin(Builtin::Len).to_string(), "builtin function");
    }

    #[test]
    fn test_duplicate_hash_key_keeps_first_position() {
        let hash = Value::hash_from_pairs([
            (Value::from("a"), Value::from(1)),
            (Value::from("b"), Value::from(2)),
            (Value::from("a"), Value::from(3)),
        ])
        .unwrap();
        assert_eq!(hash.to_string(), r#"{"a": 3, "b": 2}"#);
    }

    #[test]
    fn test_unhashable_key() {
        let err = Value::hash_from_pairs([(Value::array(vec![]), Value::from(1))]).unwrap_err();
        assert_eq!(err, OperationError::Unhashable("ARRAY"));
    }
}
