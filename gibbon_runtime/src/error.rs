//! Faults raised by value-level operations.
//!
//! Both engines wrap these in their own error types, so the same program
//! fails with the same message whichever engine runs it.

use thiserror::Error;

/// Error from an operator, index, or built-in function applied to values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("unsupported operand types for {op}: {left} and {right}")]
    UnsupportedBinary {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("unsupported operand type for {op}: {operand}")]
    UnsupportedUnary { op: &'static str, operand: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    IntegerOverflow(&'static str),

    #[error("index operator not supported: {collection}[{index}]")]
    NotIndexable {
        collection: &'static str,
        index: &'static str,
    },

    #[error("unusable as hash key: {0}")]
    Unhashable(&'static str),

    #[error("wrong number of arguments to `{name}`: got {got}, want {want}")]
    BuiltinArity {
        name: &'static str,
        got: usize,
        want: usize,
    },

    #[error("argument to `{name}` not supported, got {got}")]
    BuiltinArgument { name: &'static str, got: &'static str },

    #[error("output error: {0}")]
    Output(String),
}

/// Result type for value operations.
pub type OperationResult<T> = Result<T, OperationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = OperationError::UnsupportedBinary {
            op: "+",
            left: "INTEGER",
            right: "STRING",
        };
        assert_eq!(err.to_string(), "unsupported operand types for +: INTEGER and STRING");
        assert_eq!(
            OperationError::BuiltinArity { name: "len", got: 2, want: 1 }.to_string(),
            "wrong number of arguments to `len`: got 2, want 1"
        );
    }
}
