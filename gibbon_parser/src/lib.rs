//! Gibbon front end: tokenizer, syntax tree and Pratt parser.
//!
//! ```
//! let program = gibbon_parser::parse("let x = 1 + 2 * 3;").unwrap();
//! assert_eq!(program.to_string(), "let x = (1 + (2 * 3));");
//! ```

#![deny(unsafe_code)]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Block, Expr, ExprKind, InfixOp, PostfixOp, PrefixOp, Program, Stmt, StmtKind};
pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::Lexer;
pub use parser::{DEFAULT_MAX_DEPTH, Parser, ParserConfig, Precedence, parse};
pub use token::{Position, Span, Token, TokenKind};
