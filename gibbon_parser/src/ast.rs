//! Abstract syntax tree.
//!
//! Every node owns its children. Nodes carry the [`Span`] of the source they
//! were parsed from, and render back to a fully parenthesized form through
//! `Display`, which makes operator grouping visible in tests and messages.

use crate::token::Span;
use std::fmt;

// =============================================================================
// Program and Statements
// =============================================================================

/// A parsed unit of source: one file or one REPL line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Top-level statements in source order.
    pub statements: Vec<Stmt>,
}

impl Program {
    /// Create a program from its statements.
    #[must_use]
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// Statement kind.
    pub kind: StmtKind,
    /// Source location.
    pub span: Span,
}

impl Stmt {
    /// Create a new statement.
    #[inline]
    #[must_use]
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `let name = value;`
    Let { name: String, value: Expr },
    /// `return;` or `return value;`
    Return(Option<Expr>),
    /// A bare expression.
    Expr(Expr),
}

/// A `{ ... }` block. Its value is the value of the last statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Statements in source order.
    pub statements: Vec<Stmt>,
    /// Source location including the braces.
    pub span: Span,
}

// =============================================================================
// Expressions
// =============================================================================

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Expression kind.
    pub kind: ExprKind,
    /// Source location.
    pub span: Span,
}

impl Expr {
    /// Create a new expression.
    #[inline]
    #[must_use]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A name reference.
    Ident(String),
    /// Integer literal.
    Integer(i64),
    /// `true` or `false`.
    Boolean(bool),
    /// String literal, already unescaped.
    String(String),
    /// `-x`, `!x`.
    Prefix { op: PrefixOp, operand: Box<Expr> },
    /// `a + b` and friends.
    Infix {
        op: InfixOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `x++`, `x--`.
    Postfix { op: PostfixOp, operand: Box<Expr> },
    /// `if (cond) { ... } else { ... }`
    If {
        condition: Box<Expr>,
        then_block: Block,
        else_block: Option<Block>,
    },
    /// `fn name(params) { body }`. The name is optional and is filled in
    /// from the enclosing `let` when absent.
    Function {
        name: Option<String>,
        parameters: Vec<String>,
        body: Block,
    },
    /// `[a, b, c]`
    Array(Vec<Expr>),
    /// `{k: v, ...}` with pairs kept in source order.
    Hash(Vec<(Expr, Expr)>),
    /// `callee(args)`
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    /// `collection[index]`
    Index {
        collection: Box<Expr>,
        index: Box<Expr>,
    },
}

// =============================================================================
// Operators
// =============================================================================

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

/// Postfix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

impl PrefixOp {
    /// Source spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PrefixOp::Neg => "-",
            PrefixOp::Not => "!",
        }
    }
}

impl InfixOp {
    /// Source spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Mod => "%",
            InfixOp::Eq => "==",
            InfixOp::NotEq => "!=",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::LtEq => "<=",
            InfixOp::GtEq => ">=",
            InfixOp::And => "&&",
            InfixOp::Or => "||",
        }
    }
}

impl PostfixOp {
    /// Source spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PostfixOp::Increment => "++",
            PostfixOp::Decrement => "--",
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{stmt}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Let { name, value } => write!(f, "let {name} = {value};"),
            StmtKind::Return(Some(value)) => write!(f, "return {value};"),
            StmtKind::Return(None) => f.write_str("return;"),
            StmtKind::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for stmt in &self.statements {
            write!(f, " {stmt}")?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Ident(name) => f.write_str(name),
            ExprKind::Integer(value) => write!(f, "{value}"),
            ExprKind::Boolean(value) => write!(f, "{value}"),
            ExprKind::String(value) => write!(f, "{value:?}"),
            ExprKind::Prefix { op, operand } => write!(f, "({}{operand})", op.as_str()),
            ExprKind::Infix { op, left, right } => {
                write!(f, "({left} {} {right})", op.as_str())
            }
            ExprKind::Postfix { op, operand } => write!(f, "({operand}{})", op.as_str()),
            ExprKind::If {
                condition,
                then_block,
                else_block,
            } => {
                write!(f, "if {condition} {then_block}")?;
                if let Some(else_block) = else_block {
                    write!(f, " else {else_block}")?;
                }
                Ok(())
            }
            ExprKind::Function {
                name,
                parameters,
                body,
            } => {
                f.write_str("fn")?;
                if let Some(name) = name {
                    write!(f, " {name}")?;
                }
                f.write_str("(")?;
                write_list(f, parameters)?;
                write!(f, ") {body}")
            }
            ExprKind::Array(elements) => {
                f.write_str("[")?;
                write_list(f, elements)?;
                f.write_str("]")
            }
            ExprKind::Hash(pairs) => {
                f.write_str("{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            ExprKind::Call { callee, arguments } => {
                write!(f, "{callee}(")?;
                write_list(f, arguments)?;
                f.write_str(")")
            }
            ExprKind::Index { collection, index } => write!(f, "({collection}[{index}])"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(kind, Span::default())
    }

    #[test]
    fn test_render_let_with_infix() {
        let stmt = Stmt::new(
            StmtKind::Let {
                name: "x".into(),
                value: expr(ExprKind::Infix {
                    op: InfixOp::Add,
                    left: Box::new(expr(ExprKind::Ident("y".into()))),
                    right: Box::new(expr(ExprKind::Integer(1))),
                }),
            },
            Span::default(),
        );
        assert_eq!(stmt.to_string(), "let x = (y + 1);");
    }

    #[test]
    fn test_render_function_and_hash() {
        let body = Block {
            statements: vec![Stmt::new(
                StmtKind::Expr(expr(ExprKind::Ident("a".into()))),
                Span::default(),
            )],
            span: Span::default(),
        };
        let function = expr(ExprKind::Function {
            name: Some("id".into()),
            parameters: vec!["a".into()],
            body,
        });
        assert_eq!(function.to_string(), "fn id(a) { a }");

        let hash = expr(ExprKind::Hash(vec![(
            expr(ExprKind::String("k".into())),
            expr(ExprKind::Boolean(true)),
        )]));
        assert_eq!(hash.to_string(), "{\"k\": true}");
    }
}
