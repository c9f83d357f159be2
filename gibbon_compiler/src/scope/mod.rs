//! Lexical scope tracking for the compiler.

mod symbol;

pub use symbol::{Symbol, SymbolScope, SymbolTable};
