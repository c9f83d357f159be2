//! Compile errors and the operand limits that produce them.

use gibbon_parser::Span;
use thiserror::Error;

// =============================================================================
// Operand Limits
// =============================================================================

/// Constant pool entries addressable by a `u16` operand.
pub const MAX_CONSTANTS: usize = 1 << 16;
/// Global slots addressable by a `u16` operand.
pub const MAX_GLOBALS: usize = 1 << 16;
/// Local slots addressable by a `u8` operand.
pub const MAX_LOCALS: usize = 1 << 8;
/// Arguments to one call (`u8` operand); also bounds parameter lists.
pub const MAX_ARGUMENTS: usize = u8::MAX as usize;
/// Captured variables per closure (`u8` operand).
pub const MAX_FREE_VARIABLES: usize = u8::MAX as usize;
/// Operand count for `OpArray` / `OpHash` (`u16` operand).
pub const MAX_ELEMENTS: usize = u16::MAX as usize;
/// Highest absolute jump target.
pub const JUMP_LIMIT: usize = u16::MAX as usize;

// =============================================================================
// Errors
// =============================================================================

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// What went wrong during compilation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileErrorKind {
    #[error("undefined variable {0}")]
    UndefinedVariable(String),

    #[error("too many constants (limit {limit})", limit = MAX_CONSTANTS)]
    TooManyConstants,

    #[error("too many global bindings (limit {limit})", limit = MAX_GLOBALS)]
    TooManyGlobals,

    #[error("too many local bindings in function (limit {limit})", limit = MAX_LOCALS)]
    TooManyLocals,

    #[error("too many arguments (limit {limit}, got {0})", limit = MAX_ARGUMENTS)]
    TooManyArguments(usize),

    #[error("too many free variables (limit {limit}, got {0})", limit = MAX_FREE_VARIABLES)]
    TooManyFreeVariables(usize),

    #[error("too many elements in literal (limit {limit}, got {0})", limit = MAX_ELEMENTS)]
    TooManyElements(usize),

    #[error("jump target {0} out of range")]
    JumpOutOfRange(usize),

    #[error("nesting too deep (limit {0})")]
    NestingTooDeep(usize),
}

/// A compile error with the span of the construct that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct CompileError {
    /// Error category and details.
    pub kind: CompileErrorKind,
    /// Source range of the offending node.
    pub span: Span,
}

impl CompileError {
    /// Create a new error.
    #[inline]
    pub fn new(kind: CompileErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CompileError::new(CompileErrorKind::UndefinedVariable("x".into()), Span::new(0, 1));
        assert_eq!(err.to_string(), "undefined variable x");
        assert_eq!(
            CompileErrorKind::TooManyArguments(300).to_string(),
            "too many arguments (limit 255, got 300)"
        );
        assert_eq!(
            CompileErrorKind::TooManyConstants.to_string(),
            "too many constants (limit 65536)"
        );
    }
}
