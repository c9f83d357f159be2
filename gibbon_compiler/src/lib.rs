//! Gibbon bytecode compiler.
//!
//! Lowers a parsed [`Program`](gibbon_parser::Program) into a flat
//! instruction stream plus a constant pool for the stack VM.
//!
//! ```
//! use gibbon_compiler::{Compiler, Opcode};
//!
//! let program = gibbon_parser::parse("1 + 2").unwrap();
//! let bytecode = Compiler::new().compile(&program).unwrap();
//! assert_eq!(bytecode.instructions[0], Opcode::Constant as u8);
//! assert_eq!(bytecode.constants.len(), 2);
//! ```

#![deny(unsafe_code)]

pub mod bytecode;
pub mod compiler;
pub mod error;
pub mod scope;

pub use bytecode::{FunctionBuilder, Label, Opcode, disassemble, make, read_operands};
pub use compiler::{Bytecode, Compiler, CompilerConfig};
pub use error::{CompileError, CompileErrorKind, CompileResult};
pub use scope::{Symbol, SymbolScope, SymbolTable};
