//! Statement parsing.

use super::{Parser, Precedence};
use crate::ast::{ExprKind, Stmt, StmtKind};
use crate::error::ParseResult;
use crate::token::TokenKind;

impl Parser<'_> {
    pub(super) fn statement(&mut self) -> ParseResult<Stmt> {
        match self.current.kind {
            TokenKind::Let => self.rule("LetStatement", |p| p.let_statement()),
            TokenKind::Return => self.rule("ReturnStatement", |p| p.return_statement()),
            _ => self.rule("ExpressionStatement", |p| p.expression_statement()),
        }
    }

    /// `let name = value;`
    fn let_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span;
        self.expect_peek(TokenKind::Ident)?;
        let name = self.current.literal.clone();
        self.expect_peek(TokenKind::Assign)?;
        self.advance()?;

        let mut value = self.parse_expression(Precedence::Lowest)?;
        if let ExprKind::Function { name: fn_name, .. } = &mut value.kind {
            *fn_name = Some(name.clone());
        }

        let span = start.merge(value.span);
        self.skip_semicolon()?;
        Ok(Stmt::new(StmtKind::Let { name, value }, span))
    }

    /// `return;` or `return value;`
    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span;
        let value = if self.peek_is(TokenKind::Semicolon)
            || self.peek_is(TokenKind::RightBrace)
            || self.peek_is(TokenKind::Eof)
        {
            None
        } else {
            self.advance()?;
            Some(self.parse_expression(Precedence::Lowest)?)
        };

        let span = value.as_ref().map_or(start, |v| start.merge(v.span));
        self.skip_semicolon()?;
        Ok(Stmt::new(StmtKind::Return(value), span))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        let span = expr.span;
        self.skip_semicolon()?;
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }

    /// Consume an optional trailing `;`.
    fn skip_semicolon(&mut self) -> ParseResult<()> {
        if self.peek_is(TokenKind::Semicolon) {
            self.advance()?;
        }
        Ok(())
    }
}
