//! Function objects: evaluator functions, compiled functions and closures.

use super::value::Value;
use crate::environment::Env;
use gibbon_parser::ast::Block;
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Evaluator Function
// =============================================================================

/// A function literal evaluated by the tree-walker, closed over its
/// defining environment.
pub struct Function {
    /// Name from the binding `let`, bound to the function inside its body.
    pub name: Option<Rc<str>>,
    /// Parameter names.
    pub parameters: Vec<String>,
    /// Function body.
    pub body: Block,
    /// Environment the literal was evaluated in.
    pub env: Env,
}

impl fmt::Debug for Function {
    // The environment may hold this function, so it is left out.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn({}) {}", self.parameters.join(", "), self.body)
    }
}

// =============================================================================
// Compiled Function
// =============================================================================

/// A function body lowered to bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFunction {
    /// Name from the binding `let`, if any.
    pub name: Option<Rc<str>>,
    /// Encoded instruction stream.
    pub instructions: Box<[u8]>,
    /// Local slots needed, parameters included.
    pub num_locals: usize,
    /// Number of declared parameters.
    pub num_parameters: usize,
}

impl CompiledFunction {
    /// Create a compiled function.
    pub fn new(
        name: Option<Rc<str>>,
        instructions: impl Into<Box<[u8]>>,
        num_locals: usize,
        num_parameters: usize,
    ) -> Self {
        Self {
            name,
            instructions: instructions.into(),
            num_locals,
            num_parameters,
        }
    }

    /// Name for rendering; anonymous functions show as `<anonymous>`.
    #[inline]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

// =============================================================================
// Closure
// =============================================================================

/// Captured values stored inline for the common small case.
pub type FreeVars = SmallVec<[Value; 4]>;

/// A compiled function bundled with a snapshot of its free variables.
#[derive(Debug, Clone)]
pub struct Closure {
    /// Code to execute.
    pub function: Rc<CompiledFunction>,
    /// Captured values, indexed by free-variable slot.
    pub free: FreeVars,
}

impl Closure {
    /// Wrap `function` with the given captures.
    pub fn new(function: Rc<CompiledFunction>, free: FreeVars) -> Self {
        Self { function, free }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_compiled_function_rendering() {
        let named = CompiledFunction::new(Some("add".into()), vec![0u8], 2, 2);
        assert_eq!(Value::CompiledFunction(Rc::new(named)).to_string(), "CompiledFunction[add]");

        let anonymous = Rc::new(CompiledFunction::new(None, Vec::new(), 0, 0));
        let closure = Closure::new(anonymous, smallvec![Value::Integer(1)]);
        assert!(!closure.free.spilled());
        assert_eq!(Value::Closure(Rc::new(closure)).to_string(), "Closure[<anonymous>]");
    }
}
