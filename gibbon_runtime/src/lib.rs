//! Runtime support shared by the Gibbon bytecode VM and tree-walking
//! evaluator: the value model, built-in functions, operators and
//! evaluator environments.

#![deny(unsafe_code)]

pub mod builtins;
pub mod environment;
pub mod error;
pub mod object;
pub mod ops;

pub use builtins::Builtin;
pub use environment::{Env, Environment};
pub use error::{OperationError, OperationResult};
pub use object::{Closure, CompiledFunction, FreeVars, Function, HashKey, HashTable, Value};
pub use ops::BinaryOp;
