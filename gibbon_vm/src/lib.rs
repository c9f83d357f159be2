//! Gibbon execution engines.
//!
//! [`VirtualMachine`] runs compiled [`Bytecode`](gibbon_compiler::Bytecode)
//! over a fixed-capacity value stack; [`Evaluator`] walks the syntax tree
//! directly. Both produce the same values for the same program, except
//! when a closure captures a local that a later `let` in the same function
//! rebinds: compiled closures keep the value seen at creation, while the
//! evaluator reads the scope live. See [`evaluator`].
//!
//! ```
//! use gibbon_compiler::Compiler;
//! use gibbon_runtime::Value;
//! use gibbon_vm::VirtualMachine;
//!
//! let program = gibbon_parser::parse("let x = 6; x * 7").unwrap();
//! let bytecode = Compiler::new().compile(&program).unwrap();
//! let mut vm = VirtualMachine::new();
//! vm.run(&bytecode).unwrap();
//! assert_eq!(vm.last_popped(), &Value::Integer(42));
//! ```

#![deny(unsafe_code)]

mod dispatch;
pub mod error;
pub mod evaluator;
pub mod frame;
pub mod globals;
mod ops;
pub mod stack;
pub mod vm;

pub use error::{VmError, VmResult};
pub use evaluator::{EvalConfig, EvalError, EvalResult, Evaluator, evaluate};
pub use frame::{DEFAULT_MAX_FRAMES, Frame, FrameStack};
pub use globals::{GLOBALS_SIZE, Globals};
pub use stack::{DEFAULT_STACK_SIZE, ValueStack};
pub use vm::{VirtualMachine, VmConfig};
