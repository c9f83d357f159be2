//! Syntax errors.

use crate::token::{Position, Span, TokenKind};
use thiserror::Error;

/// Result type for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// What went wrong while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A specific token was required and something else was found.
    UnexpectedToken,
    /// The token cannot start an expression.
    NoPrefixRule,
    /// An integer literal is malformed or does not fit in 64 bits.
    InvalidInteger,
    /// A block reached end of input before its closing brace.
    UnterminatedBlock,
    /// The tokenizer rejected the input.
    Lexical,
    /// Expressions are nested deeper than the configured limit.
    NestingTooDeep,
    /// A parameter name appears twice in one list.
    DuplicateParameter,
}

/// A syntax error tagged with the source position where it was detected.
///
/// Renders as `<message> at line: L, column: C`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {position}")]
pub struct ParseError {
    /// Error category.
    pub kind: ParseErrorKind,
    /// Human-readable description without location.
    pub message: String,
    /// Line and column of the offending token.
    pub position: Position,
    /// Byte range of the offending token.
    pub span: Span,
}

impl ParseError {
    /// Create a new error.
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        position: Position,
        span: Span,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
            span,
        }
    }

    /// A required token kind was not found.
    pub(crate) fn unexpected(expected: TokenKind, found: TokenKind, position: Position, span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            format!("expected token type is {:?}, got {:?}", expected.name(), found.name()),
            position,
            span,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_location() {
        let err = ParseError::unexpected(
            TokenKind::RightParen,
            TokenKind::Semicolon,
            Position::new(2, 9),
            Span::new(12, 13),
        );
        assert_eq!(
            err.to_string(),
            "expected token type is \")\", got \";\" at line: 2, column: 9"
        );
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_missing_brace_at_eof_is_unexpected_token() {
        let err = ParseError::unexpected(
            TokenKind::RightBrace,
            TokenKind::Eof,
            Position::new(1, 10),
            Span::new(9, 9),
        );
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(err.message, "expected token type is \"}\", got \"EOF\"");
    }
}
