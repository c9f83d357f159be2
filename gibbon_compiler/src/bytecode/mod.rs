//! Stack-machine bytecode.
//!
//! - [`Opcode`] and the [`make`] / [`read_operands`] codec
//! - [`FunctionBuilder`] for emitting a function body with labels
//! - [`disassemble`] for a readable listing

mod builder;
mod instruction;

pub use builder::{FunctionBuilder, Label};
pub use instruction::{
    Disassembly, Opcode, Operands, disassemble, make, read_operands, read_u8, read_u16,
};
