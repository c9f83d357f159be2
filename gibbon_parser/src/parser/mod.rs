//! Recursive descent parser with Pratt parsing for expressions.
//!
//! The parser keeps a two-token window over the lexer: `current`, the token
//! being examined, and `peek`, the one after it. Every expression rule obeys
//! the same contract: on entry `current` is the first token of the
//! expression, and on exit `current` is its last token. Callers advance past
//! it themselves.
//!
//! The first error aborts the parse and discards the partial program.

mod expr;
mod stmt;

use crate::ast::{Program, Stmt};
use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::lexer::Lexer;
use crate::token::{Position, Token, TokenKind};
use std::cell::RefCell;
use std::rc::Rc;

/// Default maximum expression nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parser limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum expression nesting before [`ParseErrorKind::NestingTooDeep`].
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Slot the lexer's error handler writes the first lexical error into.
type LexicalErrorSlot = Rc<RefCell<Option<(Position, String)>>>;

// =============================================================================
// Parser Core
// =============================================================================

/// Gibbon parser.
pub struct Parser<'src> {
    /// Token source.
    lexer: Lexer<'src>,
    /// Token under examination.
    current: Token,
    /// One-token lookahead.
    peek: Token,
    /// First error reported by the lexer, if any.
    lexical_error: LexicalErrorSlot,
    /// Current expression nesting depth.
    depth: usize,
    /// Indentation level for rule tracing.
    trace_indent: usize,
    config: ParserConfig,
}

impl<'src> Parser<'src> {
    /// Create a parser with default limits.
    pub fn new(source: &'src str) -> Self {
        Self::with_config(source, ParserConfig::default())
    }

    /// Create a parser with the given limits.
    pub fn with_config(source: &'src str, config: ParserConfig) -> Self {
        let lexical_error: LexicalErrorSlot = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&lexical_error);
        let mut lexer = Lexer::with_error_handler(source, move |position, message| {
            let mut slot = slot.borrow_mut();
            if slot.is_none() {
                *slot = Some((position, message.to_string()));
            }
        });
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            current,
            peek,
            lexical_error,
            depth: 0,
            trace_indent: 0,
            config,
        }
    }

    /// Parse the whole input as a program.
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        self.check_lexical_error()?;
        let mut statements = Vec::new();

        while !self.current_is(TokenKind::Eof) {
            if self.current_is(TokenKind::Semicolon) {
                self.advance()?;
                continue;
            }
            statements.push(self.parse_statement()?);
            self.advance()?;
        }

        log::debug!("parsed program with {} statements", statements.len());
        Ok(Program::new(statements))
    }

    /// Parse one statement starting at `current`.
    pub fn parse_statement(&mut self) -> ParseResult<Stmt> {
        self.rule("Statement", |p| p.statement())
    }

    // =========================================================================
    // Token Management
    // =========================================================================

    /// The token under examination.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.current
    }

    /// The lookahead token.
    #[inline]
    pub fn peek(&self) -> &Token {
        &self.peek
    }

    /// Shift `peek` into `current` and scan a new `peek`.
    pub(crate) fn advance(&mut self) -> ParseResult<()> {
        let next = self.lexer.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
        self.check_lexical_error()
    }

    #[inline]
    pub(crate) fn current_is(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    #[inline]
    pub(crate) fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    /// Advance if `peek` is `kind`, otherwise fail at `peek`.
    pub(crate) fn expect_peek(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.peek_is(kind) {
            self.advance()
        } else {
            Err(ParseError::unexpected(
                kind,
                self.peek.kind,
                self.peek.position,
                self.peek.span,
            ))
        }
    }

    /// Fail unless `current` is `kind`.
    pub(crate) fn expect_current(&self, kind: TokenKind) -> ParseResult<()> {
        if self.current_is(kind) {
            Ok(())
        } else {
            Err(ParseError::unexpected(
                kind,
                self.current.kind,
                self.current.position,
                self.current.span,
            ))
        }
    }

    // =========================================================================
    // Error Handling
    // =========================================================================

    /// Create an error located at `current`.
    pub(crate) fn error_at_current(&self, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        ParseError::new(kind, message, self.current.position, self.current.span)
    }

    fn check_lexical_error(&self) -> ParseResult<()> {
        match self.lexical_error.borrow_mut().take() {
            Some((position, message)) => Err(ParseError::new(
                ParseErrorKind::Lexical,
                message,
                position,
                self.current.span,
            )),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Depth Tracking and Tracing
    // =========================================================================

    /// Run `f` one nesting level deeper, failing past the configured limit.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= self.config.max_depth {
            return Err(self.error_at_current(
                ParseErrorKind::NestingTooDeep,
                format!("nesting too deep (limit {})", self.config.max_depth),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Run a named grammar rule, tracing entry and exit at `trace` level.
    pub(crate) fn rule<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if !log::log_enabled!(log::Level::Trace) {
            return f(self);
        }
        self.trace(format_args!("{name} ("));
        self.trace_indent += 1;
        let result = f(self);
        self.trace_indent -= 1;
        self.trace(format_args!(")"));
        result
    }

    fn trace(&self, message: std::fmt::Arguments<'_>) {
        let pos = self.current.position;
        log::trace!(
            "{:5}:{:3}: {:indent$}{message}",
            pos.line,
            pos.column,
            "",
            indent = 2 * self.trace_indent
        );
    }
}

// =============================================================================
// Precedence
// =============================================================================

/// Binding power of operators, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Anything that is not an operator.
    Lowest,
    /// `||`
    LogicalOr,
    /// `&&`
    LogicalAnd,
    /// `==` `!=`
    Equals,
    /// `<` `>` `<=` `>=`
    LessGreater,
    /// `+` `-`
    Sum,
    /// `*` `/` `%`
    Product,
    /// Unary `-` `!`
    Prefix,
    /// `++` `--`
    Postfix,
    /// Call `(` and index `[`.
    Call,
}

impl Precedence {
    /// Precedence of `kind` when it appears in operator position.
    #[must_use]
    pub const fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::OrOr => Precedence::LogicalOr,
            TokenKind::AndAnd => Precedence::LogicalAnd,
            TokenKind::EqualEqual | TokenKind::NotEqual => Precedence::Equals,
            TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => {
                Precedence::LessGreater
            }
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
            TokenKind::PlusPlus | TokenKind::MinusMinus => Precedence::Postfix,
            TokenKind::LeftParen | TokenKind::LeftBracket => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

// =============================================================================
// Convenience Entry Point
// =============================================================================

/// Parse `source` into a program with default limits.
pub fn parse(source: &str) -> ParseResult<Program> {
    Parser::new(source).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ordering() {
        assert!(Precedence::Lowest < Precedence::LogicalOr);
        assert!(Precedence::LogicalOr < Precedence::LogicalAnd);
        assert!(Precedence::Sum < Precedence::Product);
        assert!(Precedence::Prefix < Precedence::Postfix);
        assert!(Precedence::Postfix < Precedence::Call);
    }

    #[test]
    fn test_precedence_of_tokens() {
        assert_eq!(Precedence::of(TokenKind::Star), Precedence::Product);
        assert_eq!(Precedence::of(TokenKind::LeftBracket), Precedence::Call);
        assert_eq!(Precedence::of(TokenKind::Semicolon), Precedence::Lowest);
        assert_eq!(Precedence::of(TokenKind::Bang), Precedence::Lowest);
    }

    #[test]
    fn test_empty_program() {
        let program = parse("").unwrap();
        assert!(program.statements.is_empty());
        let program = parse(";;").unwrap();
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_window_starts_on_first_two_tokens() {
        let parser = Parser::new("let x");
        assert_eq!(parser.current().kind, TokenKind::Let);
        assert_eq!(parser.peek().kind, TokenKind::Ident);
    }

    #[test]
    fn test_lexical_error_aborts_parse() {
        let err = parse("let a = 1;\nlet b = #;").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Lexical);
        assert_eq!(err.position, Position::new(2, 9));
    }

    #[test]
    fn test_nesting_limit() {
        let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        let config = ParserConfig { max_depth: 16 };
        let err = Parser::with_config(&source, config).parse_program().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingTooDeep);
        assert!(Parser::new(&source).parse_program().is_ok());
    }
}
