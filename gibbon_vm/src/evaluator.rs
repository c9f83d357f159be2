//! Tree-walking evaluator.
//!
//! Evaluates the syntax tree directly against a chain of [`Env`] scopes.
//! It shares operators and built-ins with the VM through `gibbon_runtime`
//! and follows the VM's evaluation order, so both engines agree on values
//! and on error messages, with one exception: a closure here reads its
//! enclosing scope live, while a compiled closure copies its free variables
//! when it is created. The two differ only when a captured local is
//! rebound by a later `let` in the same function:
//!
//! ```text
//! let h = fn() { let x = 1; let g = fn() { x }; let x = 2; g() }; h()
//! // vm: 1    eval: 2
//! ```
//!
//! Expression nesting and call depth are bounded separately. Nesting is
//! counted per function body, so recursion is limited by
//! [`EvalConfig::max_calls`] alone, matching the VM's frame limit.
//!
//! `return` unwinds through nested expressions as the error side of an
//! internal result, stopping at the nearest function call or at the
//! program.

use gibbon_parser::ast::{Block, Expr, ExprKind, InfixOp, PostfixOp, PrefixOp, Program, Stmt, StmtKind};
use crate::frame::DEFAULT_MAX_FRAMES;
use gibbon_parser::DEFAULT_MAX_DEPTH;
use gibbon_runtime::{BinaryOp, Builtin, Env, Environment, Function, OperationError, Value, ops};
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;
use thiserror::Error;

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// A fault that aborts evaluation of the program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("identifier not found: {0}")]
    UndefinedIdentifier(String),

    #[error("calling non-function and non-builtin: {0}")]
    NotCallable(&'static str),

    #[error("wrong number of arguments: want={want}, got={got}")]
    WrongArgumentCount { want: usize, got: usize },

    #[error("nesting too deep (limit {0})")]
    NestingTooDeep(usize),

    #[error("call stack exhausted")]
    CallStackExhausted,

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Evaluator limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// Maximum nesting of expressions within one function body.
    pub max_depth: usize,
    /// Maximum number of active function calls.
    pub max_calls: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_calls: DEFAULT_MAX_FRAMES,
        }
    }
}

/// Non-local exit from an expression.
enum Unwind {
    Return(Value),
    Error(EvalError),
}

impl From<EvalError> for Unwind {
    #[inline]
    fn from(err: EvalError) -> Self {
        Unwind::Error(err)
    }
}

impl From<OperationError> for Unwind {
    #[inline]
    fn from(err: OperationError) -> Self {
        Unwind::Error(err.into())
    }
}

type Flow<T> = Result<T, Unwind>;

// =============================================================================
// Evaluator
// =============================================================================

/// Tree-walking interpreter.
pub struct Evaluator {
    config: EvalConfig,
    depth: usize,
    calls: usize,
    /// Sink for `puts`.
    output: Box<dyn Write>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("config", &self.config)
            .field("depth", &self.depth)
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

impl Evaluator {
    /// Create an evaluator printing to stdout.
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Self {
            config,
            depth: 0,
            calls: 0,
            output: Box::new(io::stdout()),
        }
    }

    /// Redirect `puts` output.
    #[must_use]
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Evaluate a program in `env`.
    ///
    /// The result is the value of the last expression statement, or the
    /// value of a top-level `return`. Bindings made by `let` stay in `env`.
    pub fn eval_program(&mut self, program: &Program, env: &Env) -> EvalResult<Value> {
        self.depth = 0;
        self.calls = 0;
        let mut result = Value::Null;
        for stmt in &program.statements {
            match self.statement(stmt, env) {
                Ok(Some(value)) => result = value,
                Ok(None) => {}
                Err(Unwind::Return(value)) => return Ok(value),
                Err(Unwind::Error(err)) => {
                    log::debug!("evaluation failed: {err}");
                    return Err(err);
                }
            }
        }
        Ok(result)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Evaluate a statement; `let` produces no value.
    fn statement(&mut self, stmt: &Stmt, env: &Env) -> Flow<Option<Value>> {
        match &stmt.kind {
            StmtKind::Let { name, value } => {
                let value = self.expression(value, env)?;
                env.borrow_mut().set(name.as_str(), value);
                Ok(None)
            }
            StmtKind::Return(Some(value)) => Err(Unwind::Return(self.expression(value, env)?)),
            StmtKind::Return(None) => Err(Unwind::Return(Value::Null)),
            StmtKind::Expr(expr) => self.expression(expr, env).map(Some),
        }
    }

    /// Value of the last statement; null when empty or ending in `let`.
    fn block(&mut self, block: &Block, env: &Env) -> Flow<Value> {
        let mut result = Value::Null;
        for stmt in &block.statements {
            result = self.statement(stmt, env)?.unwrap_or_default();
        }
        Ok(result)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expression(&mut self, expr: &Expr, env: &Env) -> Flow<Value> {
        if self.depth >= self.config.max_depth {
            return Err(EvalError::NestingTooDeep(self.config.max_depth).into());
        }
        self.depth += 1;
        let result = self.expression_inner(expr, env);
        self.depth -= 1;
        result
    }

    fn expression_inner(&mut self, expr: &Expr, env: &Env) -> Flow<Value> {
        match &expr.kind {
            ExprKind::Integer(value) => Ok(Value::Integer(*value)),
            ExprKind::Boolean(value) => Ok(Value::Boolean(*value)),
            ExprKind::String(value) => Ok(Value::string(value.as_str())),
            ExprKind::Ident(name) => {
                let bound = env.borrow().get(name);
                bound
                    .or_else(|| Builtin::lookup(name).map(Value::Builtin))
                    .ok_or_else(|| EvalError::UndefinedIdentifier(name.clone()).into())
            }
            ExprKind::Prefix { op, operand } => {
                let operand = self.expression(operand, env)?;
                match op {
                    PrefixOp::Neg => Ok(ops::negate(&operand)?),
                    PrefixOp::Not => Ok(ops::not(&operand)),
                }
            }
            ExprKind::Infix { op, left, right } => self.infix(*op, left, right, env),
            ExprKind::Postfix { op, operand } => {
                let operand = self.expression(operand, env)?;
                let op = match op {
                    PostfixOp::Increment => BinaryOp::Add,
                    PostfixOp::Decrement => BinaryOp::Sub,
                };
                Ok(ops::binary(op, &operand, &Value::Integer(1))?)
            }
            ExprKind::If {
                condition,
                then_block,
                else_block,
            } => {
                if self.expression(condition, env)?.is_truthy() {
                    self.block(then_block, env)
                } else if let Some(else_block) = else_block {
                    self.block(else_block, env)
                } else {
                    Ok(Value::Null)
                }
            }
            ExprKind::Function {
                name,
                parameters,
                body,
            } => Ok(Value::Function(Rc::new(Function {
                name: name.as_deref().map(Rc::from),
                parameters: parameters.clone(),
                body: body.clone(),
                env: Rc::clone(env),
            }))),
            ExprKind::Array(elements) => {
                let elements = self.expressions(elements, env)?;
                Ok(Value::array(elements))
            }
            ExprKind::Hash(pairs) => {
                let mut evaluated = Vec::with_capacity(pairs.len());
                for (key, value) in pairs {
                    let key = self.expression(key, env)?;
                    let value = self.expression(value, env)?;
                    evaluated.push((key, value));
                }
                Ok(Value::hash_from_pairs(evaluated)?)
            }
            ExprKind::Call { callee, arguments } => {
                let callee = self.expression(callee, env)?;
                let arguments = self.expressions(arguments, env)?;
                self.apply(callee, arguments)
            }
            ExprKind::Index { collection, index } => {
                let collection = self.expression(collection, env)?;
                let index = self.expression(index, env)?;
                Ok(ops::index(&collection, &index)?)
            }
        }
    }

    fn expressions(&mut self, exprs: &[Expr], env: &Env) -> Flow<Vec<Value>> {
        exprs.iter().map(|expr| self.expression(expr, env)).collect()
    }

    fn infix(&mut self, op: InfixOp, left: &Expr, right: &Expr, env: &Env) -> Flow<Value> {
        let op = match op {
            InfixOp::And => {
                let result = self.expression(left, env)?.is_truthy()
                    && self.expression(right, env)?.is_truthy();
                return Ok(Value::Boolean(result));
            }
            InfixOp::Or => {
                let result = self.expression(left, env)?.is_truthy()
                    || self.expression(right, env)?.is_truthy();
                return Ok(Value::Boolean(result));
            }
            InfixOp::Add => BinaryOp::Add,
            InfixOp::Sub => BinaryOp::Sub,
            InfixOp::Mul => BinaryOp::Mul,
            InfixOp::Div => BinaryOp::Div,
            InfixOp::Mod => BinaryOp::Mod,
            InfixOp::Eq => BinaryOp::Equal,
            InfixOp::NotEq => BinaryOp::NotEqual,
            InfixOp::Gt => BinaryOp::Greater,
            InfixOp::GtEq => BinaryOp::GreaterEqual,
            InfixOp::Lt => BinaryOp::Less,
            InfixOp::LtEq => BinaryOp::LessEqual,
        };
        let left = self.expression(left, env)?;
        let right = self.expression(right, env)?;
        Ok(ops::binary(op, &left, &right)?)
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn apply(&mut self, callee: Value, arguments: Vec<Value>) -> Flow<Value> {
        match callee {
            Value::Function(function) => {
                let want = function.parameters.len();
                if arguments.len() != want {
                    return Err(EvalError::WrongArgumentCount {
                        want,
                        got: arguments.len(),
                    }
                    .into());
                }

                let scope = Environment::enclosed(&function.env);
                {
                    let mut scope = scope.borrow_mut();
                    if let Some(name) = &function.name {
                        scope.set(&**name, Value::Function(Rc::clone(&function)));
                    }
                    for (parameter, argument) in function.parameters.iter().zip(arguments) {
                        scope.set(parameter.as_str(), argument);
                    }
                }

                if self.calls >= self.config.max_calls {
                    return Err(EvalError::CallStackExhausted.into());
                }
                self.calls += 1;
                let depth = std::mem::take(&mut self.depth);
                let result = self.block(&function.body, &scope);
                self.depth = depth;
                self.calls -= 1;

                match result {
                    Err(Unwind::Return(value)) => Ok(value),
                    other => other,
                }
            }
            Value::Builtin(builtin) => Ok(builtin.call(&arguments, self.output.as_mut())?),
            other => Err(EvalError::NotCallable(other.type_name()).into()),
        }
    }
}

/// Evaluate `program` in `env` with default limits, printing to stdout.
pub fn evaluate(program: &Program, env: &Env) -> EvalResult<Value> {
    Evaluator::new().eval_program(program, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gibbon_parser::parse;

    fn eval(source: &str) -> EvalResult<Value> {
        let program = parse(source).expect("parse failed");
        Evaluator::new()
            .with_output(io::sink())
            .eval_program(&program, &Environment::new())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Ok(Value::Integer(7)));
        assert_eq!(eval("(5 + 10 * 2 + 15 / 3) * 2 + -10"), Ok(Value::Integer(50)));
        assert_eq!(eval("7 % 3"), Ok(Value::Integer(1)));
        assert_eq!(eval("5++"), Ok(Value::Integer(6)));
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(eval("1 < 2"), Ok(Value::Boolean(true)));
        assert_eq!(eval("2 <= 1"), Ok(Value::Boolean(false)));
        assert_eq!(eval("1 == true"), Ok(Value::Boolean(false)));
        assert_eq!(eval("1 && 0"), Ok(Value::Boolean(true)));
        assert_eq!(eval("false || if (false) { 1 }"), Ok(Value::Boolean(false)));
    }

    #[test]
    fn test_short_circuit_skips_right_operand() {
        assert_eq!(eval("false && missing"), Ok(Value::Boolean(false)));
        assert_eq!(eval("true || missing"), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(eval("if (1 > 2) { 10 }"), Ok(Value::Null));
        assert_eq!(eval("if (1 < 2) { 10 } else { 20 }"), Ok(Value::Integer(10)));
        assert_eq!(eval("if (true) { let a = 1; }"), Ok(Value::Null));
    }

    #[test]
    fn test_return_unwinds_nested_blocks() {
        let source = "let f = fn(x) { if (x > 1) { if (true) { return 10; } } 1 }; f(5)";
        assert_eq!(eval(source), Ok(Value::Integer(10)));
        assert_eq!(eval("return 3; 4"), Ok(Value::Integer(3)));
        assert_eq!(eval("let f = fn() { return; }; f()"), Ok(Value::Null));
    }

    #[test]
    fn test_let_keeps_previous_result() {
        assert_eq!(eval("1; let a = 2;"), Ok(Value::Integer(1)));
    }

    #[test]
    fn test_closures_and_recursion() {
        let source = "let adder = fn(a) { fn(b) { a + b } }; adder(2)(3)";
        assert_eq!(eval(source), Ok(Value::Integer(5)));

        let source = "let fib = fn(n) { if (n < 2) { n } else { fib(n - 1) + fib(n - 2) } }; fib(10)";
        assert_eq!(eval(source), Ok(Value::Integer(55)));
    }

    #[test]
    fn test_function_sees_its_own_name_after_rebinding() {
        let source = "let f = fn(n) { if (n == 0) { 0 } else { f(n - 1) } }; let g = f; let f = 5; g(3)";
        assert_eq!(eval(source), Ok(Value::Integer(0)));
    }

    #[test]
    fn test_collections() {
        assert_eq!(eval("[1, 2 * 2][1]"), Ok(Value::Integer(4)));
        assert_eq!(eval(r#"{"a": 1}["a"]"#), Ok(Value::Integer(1)));
        assert_eq!(eval(r#"{"a": 1}["b"]"#), Ok(Value::Null));
        assert_eq!(eval("len(push([1], 2))"), Ok(Value::Integer(2)));
        assert_eq!(
            eval("{fn(x) { x }: 1}"),
            Err(EvalError::Operation(OperationError::Unhashable("FUNCTION")))
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval("foo"), Err(EvalError::UndefinedIdentifier("foo".into())));
        assert_eq!(eval("1()"), Err(EvalError::NotCallable("INTEGER")));
        assert_eq!(
            eval("fn(a) { a }()"),
            Err(EvalError::WrongArgumentCount { want: 1, got: 0 })
        );
        assert_eq!(
            eval("5 + true").unwrap_err().to_string(),
            "unsupported operand types for +: INTEGER and BOOLEAN"
        );
        assert_eq!(
            eval("1 < true").unwrap_err().to_string(),
            "unsupported operand types for <: INTEGER and BOOLEAN"
        );
    }

    #[test]
    fn test_unbounded_recursion_is_caught() {
        let program = parse("let f = fn() { f() }; f()").unwrap();
        let mut evaluator = Evaluator::with_config(EvalConfig {
            max_calls: 64,
            ..EvalConfig::default()
        });
        assert_eq!(
            evaluator.eval_program(&program, &Environment::new()),
            Err(EvalError::CallStackExhausted)
        );
    }

    #[test]
    fn test_recursion_depth_not_charged_to_nesting() {
        // Each call nests several expressions; only the call count limits it.
        let program = parse("let f = fn(n) { if (n == 0) { 0 } else { 1 + f(n - 1) } }; f(60)").unwrap();
        let mut evaluator = Evaluator::with_config(EvalConfig {
            max_depth: 16,
            max_calls: 64,
        })
        .with_output(io::sink());
        assert_eq!(
            evaluator.eval_program(&program, &Environment::new()),
            Ok(Value::Integer(60))
        );

        let mut evaluator = Evaluator::with_config(EvalConfig {
            max_depth: 16,
            max_calls: 40,
        });
        assert_eq!(
            evaluator.eval_program(&program, &Environment::new()),
            Err(EvalError::CallStackExhausted)
        );
    }

    #[test]
    fn test_nesting_limit_within_a_body() {
        let source = format!("{}true", "!".repeat(40));
        let program = parse(&source).unwrap();
        let mut evaluator = Evaluator::with_config(EvalConfig {
            max_depth: 16,
            ..EvalConfig::default()
        });
        assert_eq!(
            evaluator.eval_program(&program, &Environment::new()),
            Err(EvalError::NestingTooDeep(16))
        );
    }

    #[test]
    fn test_call_count_recovers_after_failure() {
        let env = Environment::new();
        let mut evaluator = Evaluator::with_config(EvalConfig {
            max_calls: 8,
            ..EvalConfig::default()
        });
        let looping = parse("let f = fn() { f() }; f()").unwrap();
        assert!(evaluator.eval_program(&looping, &env).is_err());
        let value = evaluator
            .eval_program(&parse("let g = fn(n) { n }; g(g(g(3)))").unwrap(), &env)
            .unwrap();
        assert_eq!(value, Value::Integer(3));
    }

    #[test]
    fn test_environment_persists_between_programs() {
        let env = Environment::new();
        let mut evaluator = Evaluator::new();
        evaluator
            .eval_program(&parse("let x = 41;").unwrap(), &env)
            .unwrap();
        let value = evaluator.eval_program(&parse("x + 1").unwrap(), &env).unwrap();
        assert_eq!(value, Value::Integer(42));
    }
}
