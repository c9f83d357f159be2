//! Expression parsing.
//!
//! Rules are chosen by matching on the token kind. A token may start an
//! expression (prefix rule), join two expressions (infix rule), or close one
//! (postfix rule).

use super::{Parser, Precedence};
use crate::ast::{Block, Expr, ExprKind, InfixOp, PostfixOp, PrefixOp};
use crate::error::{ParseErrorKind, ParseResult};
use crate::token::TokenKind;

// =============================================================================
// Rule Tables
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrefixRule {
    Identifier,
    Integer,
    Boolean,
    String,
    Operator(PrefixOp),
    Group,
    If,
    Function,
    Array,
    Hash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfixRule {
    Binary(InfixOp),
    Call,
    Index,
}

const fn prefix_rule(kind: TokenKind) -> Option<PrefixRule> {
    Some(match kind {
        TokenKind::Ident => PrefixRule::Identifier,
        TokenKind::Int => PrefixRule::Integer,
        TokenKind::True | TokenKind::False => PrefixRule::Boolean,
        TokenKind::String => PrefixRule::String,
        TokenKind::Minus => PrefixRule::Operator(PrefixOp::Neg),
        TokenKind::Bang => PrefixRule::Operator(PrefixOp::Not),
        TokenKind::LeftParen => PrefixRule::Group,
        TokenKind::If => PrefixRule::If,
        TokenKind::Function => PrefixRule::Function,
        TokenKind::LeftBracket => PrefixRule::Array,
        TokenKind::LeftBrace => PrefixRule::Hash,
        _ => return None,
    })
}

const fn infix_rule(kind: TokenKind) -> Option<InfixRule> {
    let op = match kind {
        TokenKind::Plus => InfixOp::Add,
        TokenKind::Minus => InfixOp::Sub,
        TokenKind::Star => InfixOp::Mul,
        TokenKind::Slash => InfixOp::Div,
        TokenKind::Percent => InfixOp::Mod,
        TokenKind::EqualEqual => InfixOp::Eq,
        TokenKind::NotEqual => InfixOp::NotEq,
        TokenKind::Less => InfixOp::Lt,
        TokenKind::Greater => InfixOp::Gt,
        TokenKind::LessEqual => InfixOp::LtEq,
        TokenKind::GreaterEqual => InfixOp::GtEq,
        TokenKind::AndAnd => InfixOp::And,
        TokenKind::OrOr => InfixOp::Or,
        TokenKind::LeftParen => return Some(InfixRule::Call),
        TokenKind::LeftBracket => return Some(InfixRule::Index),
        _ => return None,
    };
    Some(InfixRule::Binary(op))
}

const fn postfix_rule(kind: TokenKind) -> Option<PostfixOp> {
    match kind {
        TokenKind::PlusPlus => Some(PostfixOp::Increment),
        TokenKind::MinusMinus => Some(PostfixOp::Decrement),
        _ => None,
    }
}

// =============================================================================
// Expression Parser
// =============================================================================

impl Parser<'_> {
    /// Parse an expression whose operators bind tighter than `precedence`.
    pub fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expr> {
        self.nested(|p| p.rule("Expression", |p| p.expression(precedence)))
    }

    fn expression(&mut self, precedence: Precedence) -> ParseResult<Expr> {
        let Some(prefix) = prefix_rule(self.current.kind) else {
            return Err(self.error_at_current(
                ParseErrorKind::NoPrefixRule,
                format!("can not parse token type {:?}", self.current.kind.name()),
            ));
        };
        let mut left = self.prefix(prefix)?;

        // `current` is the last token of `left`; `peek` is the candidate
        // operator. Loop while it binds tighter than our caller's operator.
        while !self.peek_is(TokenKind::Semicolon) && precedence < Precedence::of(self.peek.kind) {
            let kind = self.peek.kind;
            if let Some(op) = postfix_rule(kind) {
                self.advance()?;
                let span = left.span.merge(self.current.span);
                left = Expr::new(
                    ExprKind::Postfix {
                        op,
                        operand: Box::new(left),
                    },
                    span,
                );
                continue;
            }
            let Some(infix) = infix_rule(kind) else {
                break;
            };
            self.advance()?;
            left = self.infix(infix, left)?;
        }

        Ok(left)
    }

    // =========================================================================
    // Prefix Rules
    // =========================================================================

    fn prefix(&mut self, rule: PrefixRule) -> ParseResult<Expr> {
        let span = self.current.span;
        match rule {
            PrefixRule::Identifier => Ok(Expr::new(
                ExprKind::Ident(self.current.literal.clone()),
                span,
            )),
            PrefixRule::Integer => {
                let value = parse_integer(&self.current.literal).ok_or_else(|| {
                    self.error_at_current(
                        ParseErrorKind::InvalidInteger,
                        format!("invalid integer literal {:?}", self.current.literal),
                    )
                })?;
                Ok(Expr::new(ExprKind::Integer(value), span))
            }
            PrefixRule::Boolean => Ok(Expr::new(
                ExprKind::Boolean(self.current_is(TokenKind::True)),
                span,
            )),
            PrefixRule::String => Ok(Expr::new(
                ExprKind::String(self.current.literal.clone()),
                span,
            )),
            PrefixRule::Operator(op) => self.rule("Prefix", |p| {
                p.advance()?;
                let operand = p.parse_expression(Precedence::Prefix)?;
                let span = span.merge(operand.span);
                Ok(Expr::new(
                    ExprKind::Prefix {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }),
            PrefixRule::Group => self.rule("GroupedExpression", |p| {
                p.advance()?;
                let mut inner = p.parse_expression(Precedence::Lowest)?;
                p.expect_peek(TokenKind::RightParen)?;
                inner.span = span.merge(p.current.span);
                Ok(inner)
            }),
            PrefixRule::If => self.rule("IfExpression", |p| p.if_expression()),
            PrefixRule::Function => self.rule("Function", |p| p.function_literal()),
            PrefixRule::Array => self.rule("ArrayLiteral", |p| {
                let elements = p.expression_list(TokenKind::RightBracket)?;
                Ok(Expr::new(ExprKind::Array(elements), span.merge(p.current.span)))
            }),
            PrefixRule::Hash => self.rule("HashLiteral", |p| p.hash_literal()),
        }
    }

    /// `if (condition) { ... } else { ... }` with `current` on `if`.
    fn if_expression(&mut self) -> ParseResult<Expr> {
        let start = self.current.span;
        self.expect_peek(TokenKind::LeftParen)?;
        self.advance()?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let then_block = self.parse_block()?;

        let else_block = if self.peek_is(TokenKind::Else) {
            self.advance()?;
            self.expect_peek(TokenKind::LeftBrace)?;
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Expr::new(
            ExprKind::If {
                condition: Box::new(condition),
                then_block,
                else_block,
            },
            start.merge(self.current.span),
        ))
    }

    /// `fn [name](a, b) { ... }` with `current` on `fn`.
    fn function_literal(&mut self) -> ParseResult<Expr> {
        let start = self.current.span;
        let name = if self.peek_is(TokenKind::Ident) {
            self.advance()?;
            Some(self.current.literal.clone())
        } else {
            None
        };

        self.expect_peek(TokenKind::LeftParen)?;
        let parameters = self.rule("Parameters", |p| p.parameters())?;
        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block()?;

        Ok(Expr::new(
            ExprKind::Function {
                name,
                parameters,
                body,
            },
            start.merge(self.current.span),
        ))
    }

    /// Parameter names with `current` on `(`; leaves `current` on `)`.
    fn parameters(&mut self) -> ParseResult<Vec<String>> {
        let mut names = Vec::new();
        if self.peek_is(TokenKind::RightParen) {
            self.advance()?;
            return Ok(names);
        }

        loop {
            self.expect_peek(TokenKind::Ident)?;
            let name = &self.current.literal;
            if names.contains(name) {
                return Err(self.error_at_current(
                    ParseErrorKind::DuplicateParameter,
                    format!("duplicate parameter {name}"),
                ));
            }
            names.push(name.clone());
            if !self.peek_is(TokenKind::Comma) {
                break;
            }
            self.advance()?;
        }
        self.expect_peek(TokenKind::RightParen)?;
        Ok(names)
    }

    /// `{k: v, ...}` with `current` on `{`.
    fn hash_literal(&mut self) -> ParseResult<Expr> {
        let start = self.current.span;
        let mut pairs = Vec::new();

        if !self.peek_is(TokenKind::RightBrace) {
            loop {
                self.advance()?;
                let key = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::Colon)?;
                self.advance()?;
                let value = self.parse_expression(Precedence::Lowest)?;
                pairs.push((key, value));

                if !self.peek_is(TokenKind::Comma) {
                    break;
                }
                self.advance()?;
            }
        }
        self.expect_peek(TokenKind::RightBrace)?;

        Ok(Expr::new(ExprKind::Hash(pairs), start.merge(self.current.span)))
    }

    /// Comma-separated expressions with `current` on the opening delimiter;
    /// leaves `current` on `end`.
    fn expression_list(&mut self, end: TokenKind) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.peek_is(end) {
            self.advance()?;
            return Ok(items);
        }

        self.advance()?;
        items.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.advance()?;
            self.advance()?;
            items.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;
        Ok(items)
    }

    // =========================================================================
    // Infix Rules
    // =========================================================================

    /// Apply an infix rule with `current` on the operator token.
    fn infix(&mut self, rule: InfixRule, left: Expr) -> ParseResult<Expr> {
        match rule {
            InfixRule::Binary(op) => self.rule("Infix", |p| {
                let precedence = Precedence::of(p.current.kind);
                p.advance()?;
                let right = p.parse_expression(precedence)?;
                let span = left.span.merge(right.span);
                Ok(Expr::new(
                    ExprKind::Infix {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    span,
                ))
            }),
            InfixRule::Call => self.rule("CallExpression", |p| {
                let arguments = p.expression_list(TokenKind::RightParen)?;
                let span = left.span.merge(p.current.span);
                Ok(Expr::new(
                    ExprKind::Call {
                        callee: Box::new(left),
                        arguments,
                    },
                    span,
                ))
            }),
            InfixRule::Index => self.rule("IndexExpression", |p| {
                p.advance()?;
                let index = p.parse_expression(Precedence::Lowest)?;
                p.expect_peek(TokenKind::RightBracket)?;
                let span = left.span.merge(p.current.span);
                Ok(Expr::new(
                    ExprKind::Index {
                        collection: Box::new(left),
                        index: Box::new(index),
                    },
                    span,
                ))
            }),
        }
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// `{ statements }` with `current` on `{`; leaves `current` on `}`.
    pub(crate) fn parse_block(&mut self) -> ParseResult<Block> {
        self.nested(|p| {
            p.rule("BlockExpression", |p| {
                let start = p.current.span;
                p.expect_current(TokenKind::LeftBrace)?;
                p.advance()?;

                let mut statements = Vec::new();
                while !p.current_is(TokenKind::RightBrace) && !p.current_is(TokenKind::Eof) {
                    if !p.current_is(TokenKind::Semicolon) {
                        statements.push(p.parse_statement()?);
                    }
                    p.advance()?;
                }
                if p.current_is(TokenKind::Eof) {
                    return Err(p.error_at_current(
                        ParseErrorKind::UnterminatedBlock,
                        format!(
                            "expected token type is {:?}, got {:?}",
                            TokenKind::RightBrace.name(),
                            TokenKind::Eof.name()
                        ),
                    ));
                }

                Ok(Block {
                    statements,
                    span: start.merge(p.current.span),
                })
            })
        })
    }
}

/// Parse an integer literal with an optional radix prefix.
///
/// Accepts `0x`, `0o` and `0b` prefixes, a bare leading `0` for octal, and
/// `_` digit separators between digits.
fn parse_integer(literal: &str) -> Option<i64> {
    let (digits, radix) = match literal.as_bytes() {
        [b'0', b'x' | b'X', ..] => (&literal[2..], 16),
        [b'0', b'o' | b'O', ..] => (&literal[2..], 8),
        [b'0', b'b' | b'B', ..] => (&literal[2..], 2),
        [b'0', _, ..] => (&literal[1..], 8),
        _ => (literal, 10),
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    i64::from_str_radix(&cleaned, radix).ok()
}
