//! Runtime object model.

pub mod function;
pub mod hash;
pub mod value;

pub use function::{Closure, CompiledFunction, FreeVars, Function};
pub use hash::{HashKey, HashTable};
pub use value::Value;
