//! AST to stack-machine bytecode compiler.
//!
//! The compiler makes a single depth-first pass over the tree. Every
//! expression leaves exactly one value on the stack; expression statements
//! pop it. Function literals are compiled into their own instruction
//! streams, stored in the constant pool, and materialized at run time by
//! `OpClosure` together with the values they capture.
//!
//! A `Compiler` keeps its symbol table and constant pool between calls to
//! [`Compiler::compile`], which is how an interactive session sees earlier
//! definitions. A unit that fails to compile leaves that state untouched.

use crate::bytecode::{Disassembly, FunctionBuilder, Opcode};
use crate::error::{
    CompileError, CompileErrorKind, CompileResult, MAX_ARGUMENTS, MAX_CONSTANTS, MAX_ELEMENTS,
    MAX_FREE_VARIABLES, MAX_GLOBALS, MAX_LOCALS,
};
use crate::scope::{Symbol, SymbolScope, SymbolTable};

use gibbon_parser::ast::{Block, Expr, ExprKind, InfixOp, PostfixOp, PrefixOp, Program, Stmt, StmtKind};
use gibbon_parser::{DEFAULT_MAX_DEPTH, Span};
use gibbon_runtime::{Builtin, CompiledFunction, Value};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

/// Builders of the functions enclosing the one being compiled, outermost
/// first. Function literals rarely nest deeper than a few levels.
type ScopeStack = SmallVec<[FunctionBuilder; 4]>;

/// Compiler limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Maximum expression nesting before [`CompileErrorKind::NestingTooDeep`].
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// =============================================================================
// Bytecode
// =============================================================================

/// Output of one compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Bytecode {
    /// Top-level instruction stream.
    pub instructions: Box<[u8]>,
    /// Constant pool, including constants from earlier units.
    pub constants: Vec<Value>,
}

impl Bytecode {
    /// Listing of the top-level stream followed by every compiled function
    /// in the constant pool.
    #[must_use]
    pub fn disassemble(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== main ==")?;
        write!(f, "{}", Disassembly(&self.instructions[..]))?;
        for (index, constant) in self.constants.iter().enumerate() {
            if let Value::CompiledFunction(function) = constant {
                writeln!(
                    f,
                    "\n== constant {index}: {} (params: {}, locals: {}) ==",
                    function.display_name(),
                    function.num_parameters,
                    function.num_locals
                )?;
                write!(f, "{}", Disassembly(&function.instructions[..]))?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Constant Pool Keys
// =============================================================================

/// Key for constant deduplication. Functions are never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Integer(i64),
    String(Rc<str>),
}

// =============================================================================
// Compiler
// =============================================================================

/// Bytecode compiler.
pub struct Compiler {
    /// Constant pool shared by every function.
    constants: Vec<Value>,
    constant_map: FxHashMap<ConstantKey, usize>,
    /// Symbols for the innermost function being compiled.
    symbols: SymbolTable,
    /// Builder for the innermost function being compiled.
    builder: FunctionBuilder,
    /// Suspended builders of the enclosing functions.
    enclosing: ScopeStack,
    /// Current expression nesting depth.
    depth: usize,
    /// Span of the node being compiled, for error reporting.
    span: Span,
    config: CompilerConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Create a compiler with the built-ins defined.
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    /// Create a compiler with the given limits.
    pub fn with_config(config: CompilerConfig) -> Self {
        let mut symbols = SymbolTable::new();
        for (index, builtin) in Builtin::ALL.iter().enumerate() {
            symbols.define_builtin(index, builtin.name());
        }
        Self {
            constants: Vec::new(),
            constant_map: FxHashMap::default(),
            symbols,
            builder: FunctionBuilder::new(),
            enclosing: ScopeStack::new(),
            depth: 0,
            span: Span::default(),
            config,
        }
    }

    /// Compile a program.
    ///
    /// On failure, definitions and constants from this unit are discarded.
    pub fn compile(&mut self, program: &Program) -> CompileResult<Bytecode> {
        let symbols = self.symbols.clone();
        let constant_count = self.constants.len();

        let result = self.compile_program(program);
        if result.is_err() {
            self.symbols = symbols;
            self.constants.truncate(constant_count);
            self.constant_map.retain(|_, index| *index < constant_count);
            self.depth = 0;
        }
        result
    }

    /// Constants accumulated so far.
    #[inline]
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// The global symbol table.
    #[inline]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn compile_program(&mut self, program: &Program) -> CompileResult<Bytecode> {
        self.builder = FunctionBuilder::new();
        self.enclosing.clear();
        for stmt in &program.statements {
            self.compile_statement(stmt)?;
        }

        let instructions = self.leave_builder()?;
        log::debug!(
            "compiled {} statements into {} bytes, {} constants",
            program.statements.len(),
            instructions.len(),
            self.constants.len()
        );
        Ok(Bytecode {
            instructions: instructions.into_boxed_slice(),
            constants: self.constants.clone(),
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn compile_statement(&mut self, stmt: &Stmt) -> CompileResult<()> {
        self.span = stmt.span;
        match &stmt.kind {
            StmtKind::Let { name, value } => {
                self.compile_expression(value)?;
                self.span = stmt.span;
                let symbol = self.symbols.define(name);
                self.store_symbol(&symbol)
            }
            StmtKind::Return(Some(value)) => {
                self.compile_expression(value)?;
                self.emit(Opcode::ReturnValue, &[]);
                Ok(())
            }
            StmtKind::Return(None) => {
                self.emit(Opcode::Return, &[]);
                Ok(())
            }
            StmtKind::Expr(expr) => {
                self.compile_expression(expr)?;
                self.emit(Opcode::Pop, &[]);
                Ok(())
            }
        }
    }

    /// Compile a block so that it leaves its value on the stack.
    fn compile_block(&mut self, block: &Block) -> CompileResult<()> {
        for stmt in &block.statements {
            self.compile_statement(stmt)?;
        }
        let builder = self.builder();
        if !builder.remove_last_pop()
            && !builder.last_is(Opcode::ReturnValue)
            && !builder.last_is(Opcode::Return)
        {
            // Empty, or ends in `let`: the block's value is null.
            self.emit(Opcode::Null, &[]);
        }
        Ok(())
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn compile_expression(&mut self, expr: &Expr) -> CompileResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(CompileError::new(
                CompileErrorKind::NestingTooDeep(self.config.max_depth),
                expr.span,
            ));
        }
        self.depth += 1;
        let result = self.compile_expression_inner(expr);
        self.depth -= 1;
        result
    }

    fn compile_expression_inner(&mut self, expr: &Expr) -> CompileResult<()> {
        self.span = expr.span;
        match &expr.kind {
            ExprKind::Integer(value) => {
                let index = self.add_constant(Value::Integer(*value))?;
                self.emit(Opcode::Constant, &[index]);
            }
            ExprKind::String(value) => {
                let index = self.add_constant(Value::string(value.as_str()))?;
                self.emit(Opcode::Constant, &[index]);
            }
            ExprKind::Boolean(true) => {
                self.emit(Opcode::True, &[]);
            }
            ExprKind::Boolean(false) => {
                self.emit(Opcode::False, &[]);
            }
            ExprKind::Ident(name) => {
                let symbol = self
                    .symbols
                    .resolve(name)
                    .ok_or_else(|| self.error(CompileErrorKind::UndefinedVariable(name.clone())))?;
                self.load_symbol(&symbol);
            }
            ExprKind::Prefix { op, operand } => {
                self.compile_expression(operand)?;
                let opcode = match op {
                    PrefixOp::Neg => Opcode::Minus,
                    PrefixOp::Not => Opcode::Bang,
                };
                self.emit(opcode, &[]);
            }
            ExprKind::Infix { op, left, right } => self.compile_infix(*op, left, right)?,
            ExprKind::Postfix { op, operand } => {
                // No assignment exists, so `x++` is the value `x + 1`.
                self.compile_expression(operand)?;
                let one = self.add_constant(Value::Integer(1))?;
                self.emit(Opcode::Constant, &[one]);
                let opcode = match op {
                    PostfixOp::Increment => Opcode::Add,
                    PostfixOp::Decrement => Opcode::Sub,
                };
                self.emit(opcode, &[]);
            }
            ExprKind::If {
                condition,
                then_block,
                else_block,
            } => {
                self.compile_expression(condition)?;
                let else_label = self.builder().create_label();
                let end_label = self.builder().create_label();

                self.builder().emit_jump(Opcode::JumpNotTruthy, else_label);
                self.compile_block(then_block)?;
                self.builder().emit_jump(Opcode::Jump, end_label);

                self.builder().bind_label(else_label);
                match else_block {
                    Some(block) => self.compile_block(block)?,
                    None => {
                        self.emit(Opcode::Null, &[]);
                    }
                }
                self.builder().bind_label(end_label);
            }
            ExprKind::Function {
                name,
                parameters,
                body,
            } => self.compile_function(name.as_deref(), parameters, body)?,
            ExprKind::Array(elements) => {
                self.check_limit(elements.len(), MAX_ELEMENTS, CompileErrorKind::TooManyElements)?;
                for element in elements {
                    self.compile_expression(element)?;
                }
                self.emit(Opcode::Array, &[elements.len()]);
            }
            ExprKind::Hash(pairs) => {
                let count = pairs.len() * 2;
                self.check_limit(count, MAX_ELEMENTS, CompileErrorKind::TooManyElements)?;
                for (key, value) in pairs {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Opcode::Hash, &[count]);
            }
            ExprKind::Call { callee, arguments } => {
                self.check_limit(arguments.len(), MAX_ARGUMENTS, CompileErrorKind::TooManyArguments)?;
                self.compile_expression(callee)?;
                for argument in arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Opcode::Call, &[arguments.len()]);
            }
            ExprKind::Index { collection, index } => {
                self.compile_expression(collection)?;
                self.compile_expression(index)?;
                self.emit(Opcode::Index, &[]);
            }
        }
        Ok(())
    }

    fn compile_infix(&mut self, op: InfixOp, left: &Expr, right: &Expr) -> CompileResult<()> {
        let opcode = match op {
            InfixOp::And | InfixOp::Or => return self.compile_logical(op, left, right),
            InfixOp::Add => Opcode::Add,
            InfixOp::Sub => Opcode::Sub,
            InfixOp::Mul => Opcode::Mul,
            InfixOp::Div => Opcode::Div,
            InfixOp::Mod => Opcode::Mod,
            InfixOp::Eq => Opcode::Equal,
            InfixOp::NotEq => Opcode::NotEqual,
            InfixOp::Gt => Opcode::GreaterThan,
            InfixOp::GtEq => Opcode::GreaterEqual,
            InfixOp::Lt => Opcode::LessThan,
            InfixOp::LtEq => Opcode::LessEqual,
        };
        self.compile_expression(left)?;
        self.compile_expression(right)?;
        self.emit(opcode, &[]);
        Ok(())
    }

    /// Short-circuit `&&` / `||`. The result is always a boolean.
    fn compile_logical(&mut self, op: InfixOp, left: &Expr, right: &Expr) -> CompileResult<()> {
        let false_label = self.builder().create_label();
        let end_label = self.builder().create_label();

        self.compile_expression(left)?;
        if op == InfixOp::Or {
            let right_label = self.builder().create_label();
            self.builder().emit_jump(Opcode::JumpNotTruthy, right_label);
            self.emit(Opcode::True, &[]);
            self.builder().emit_jump(Opcode::Jump, end_label);
            self.builder().bind_label(right_label);
        } else {
            self.builder().emit_jump(Opcode::JumpNotTruthy, false_label);
        }

        self.compile_expression(right)?;
        self.builder().emit_jump(Opcode::JumpNotTruthy, false_label);
        self.emit(Opcode::True, &[]);
        self.builder().emit_jump(Opcode::Jump, end_label);

        self.builder().bind_label(false_label);
        self.emit(Opcode::False, &[]);
        self.builder().bind_label(end_label);
        Ok(())
    }

    fn compile_function(
        &mut self,
        name: Option<&str>,
        parameters: &[String],
        body: &Block,
    ) -> CompileResult<()> {
        let span = self.span;
        self.check_limit(parameters.len(), MAX_ARGUMENTS, CompileErrorKind::TooManyArguments)?;

        self.enter_scope();
        if let Some(name) = name {
            self.symbols.define_function_name(name);
        }
        for parameter in parameters {
            self.symbols.define(parameter);
        }

        for stmt in &body.statements {
            self.compile_statement(stmt)?;
        }
        let builder = self.builder();
        if !builder.replace_last_pop_with_return()
            && !builder.last_is(Opcode::ReturnValue)
            && !builder.last_is(Opcode::Return)
        {
            self.emit(Opcode::Return, &[]);
        }

        let free_symbols = self.symbols.free_symbols().to_vec();
        let num_locals = self.symbols.num_definitions();
        let instructions = self.leave_scope()?;
        self.span = span;

        if num_locals > MAX_LOCALS {
            return Err(self.error(CompileErrorKind::TooManyLocals));
        }
        self.check_limit(
            free_symbols.len(),
            MAX_FREE_VARIABLES,
            CompileErrorKind::TooManyFreeVariables,
        )?;

        for symbol in &free_symbols {
            self.load_symbol(symbol);
        }

        let function = CompiledFunction::new(
            name.map(Rc::from),
            instructions,
            num_locals,
            parameters.len(),
        );
        let index = self.add_constant(Value::CompiledFunction(Rc::new(function)))?;
        self.emit(Opcode::Closure, &[index, free_symbols.len()]);
        Ok(())
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Opcode::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Opcode::GetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(Opcode::GetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(Opcode::GetFree, &[symbol.index]),
            SymbolScope::Function => self.emit(Opcode::CurrentClosure, &[]),
        };
    }

    fn store_symbol(&mut self, symbol: &Symbol) -> CompileResult<()> {
        match symbol.scope {
            SymbolScope::Global if symbol.index < MAX_GLOBALS => {
                self.emit(Opcode::SetGlobal, &[symbol.index]);
            }
            SymbolScope::Global => return Err(self.error(CompileErrorKind::TooManyGlobals)),
            SymbolScope::Local if symbol.index < MAX_LOCALS => {
                self.emit(Opcode::SetLocal, &[symbol.index]);
            }
            _ => return Err(self.error(CompileErrorKind::TooManyLocals)),
        }
        Ok(())
    }

    // =========================================================================
    // Scopes and Emission
    // =========================================================================

    #[inline]
    fn builder(&mut self) -> &mut FunctionBuilder {
        &mut self.builder
    }

    #[inline]
    fn emit(&mut self, opcode: Opcode, operands: &[usize]) -> usize {
        self.builder().emit(opcode, operands)
    }

    fn enter_scope(&mut self) {
        let outer = std::mem::take(&mut self.builder);
        self.enclosing.push(outer);
        let outer = std::mem::take(&mut self.symbols);
        self.symbols = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> CompileResult<Vec<u8>> {
        if let Some(outer) = self.symbols.take_outer() {
            self.symbols = outer;
        }
        self.leave_builder()
    }

    /// Finish the current builder and resume the enclosing one.
    fn leave_builder(&mut self) -> CompileResult<Vec<u8>> {
        let outer = self.enclosing.pop().unwrap_or_default();
        let builder = std::mem::replace(&mut self.builder, outer);
        builder.finish().map_err(|kind| self.error(kind))
    }

    fn add_constant(&mut self, value: Value) -> CompileResult<usize> {
        let key = match &value {
            Value::Integer(i) => Some(ConstantKey::Integer(*i)),
            Value::String(s) => Some(ConstantKey::String(Rc::clone(s))),
            _ => None,
        };
        if let Some(&index) = key.as_ref().and_then(|k| self.constant_map.get(k)) {
            return Ok(index);
        }
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(self.error(CompileErrorKind::TooManyConstants));
        }

        let index = self.constants.len();
        self.constants.push(value);
        if let Some(key) = key {
            self.constant_map.insert(key, index);
        }
        Ok(index)
    }

    fn check_limit(
        &self,
        count: usize,
        limit: usize,
        kind: fn(usize) -> CompileErrorKind,
    ) -> CompileResult<()> {
        if count > limit {
            Err(self.error(kind(count)))
        } else {
            Ok(())
        }
    }

    #[inline]
    fn error(&self, kind: CompileErrorKind) -> CompileError {
        CompileError::new(kind, self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{disassemble, make};
    use gibbon_parser::parse;

    fn compile(source: &str) -> Bytecode {
        let program = parse(source).expect("parse failed");
        Compiler::new().compile(&program).expect("compile failed")
    }

    fn concat(parts: &[SmallVec<[u8; 4]>]) -> String {
        let bytes: Vec<u8> = parts.iter().flat_map(|p| p.iter().copied()).collect();
        disassemble(&bytes)
    }

    fn function_constant(bytecode: &Bytecode, index: usize) -> Rc<CompiledFunction> {
        match &bytecode.constants[index] {
            Value::CompiledFunction(function) => Rc::clone(function),
            other => panic!("constant {index} is not a function: {other:?}"),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    #[test]
    fn test_integer_arithmetic() {
        let bytecode = compile("1 + 2");
        assert_eq!(bytecode.constants, vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::Constant, &[0]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Add, &[]),
                make(Opcode::Pop, &[]),
            ])
        );
    }

    #[test]
    fn test_constants_are_deduplicated() {
        let bytecode = compile(r#"1; 1; "a"; "a"; 2"#);
        assert_eq!(
            bytecode.constants,
            vec![Value::Integer(1), Value::from("a"), Value::Integer(2)]
        );
    }

    #[test]
    fn test_less_than_keeps_source_order() {
        let bytecode = compile("1 < 2; 3 <= 4");
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::Constant, &[0]),
                make(Opcode::Constant, &[1]),
                make(Opcode::LessThan, &[]),
                make(Opcode::Pop, &[]),
                make(Opcode::Constant, &[2]),
                make(Opcode::Constant, &[3]),
                make(Opcode::LessEqual, &[]),
                make(Opcode::Pop, &[]),
            ])
        );
    }

    #[test]
    fn test_prefix_and_postfix() {
        let bytecode = compile("-1; !true; 5++");
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::Constant, &[0]),
                make(Opcode::Minus, &[]),
                make(Opcode::Pop, &[]),
                make(Opcode::True, &[]),
                make(Opcode::Bang, &[]),
                make(Opcode::Pop, &[]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Constant, &[0]),
                make(Opcode::Add, &[]),
                make(Opcode::Pop, &[]),
            ])
        );
    }

    #[test]
    fn test_conditional_without_else_pushes_null() {
        let bytecode = compile("if (true) { 10 }; 3333;");
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::True, &[]),              // 0000
                make(Opcode::JumpNotTruthy, &[10]),   // 0001
                make(Opcode::Constant, &[0]),         // 0004
                make(Opcode::Jump, &[11]),            // 0007
                make(Opcode::Null, &[]),              // 0010
                make(Opcode::Pop, &[]),               // 0011
                make(Opcode::Constant, &[1]),         // 0012
                make(Opcode::Pop, &[]),               // 0015
            ])
        );
    }

    #[test]
    fn test_conditional_with_else() {
        let bytecode = compile("if (true) { 10 } else { 20 }");
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::True, &[]),
                make(Opcode::JumpNotTruthy, &[10]),
                make(Opcode::Constant, &[0]),
                make(Opcode::Jump, &[13]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Pop, &[]),
            ])
        );
    }

    #[test]
    fn test_block_ending_in_let_yields_null() {
        let bytecode = compile("if (true) { let a = 1; }");
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::True, &[]),
                make(Opcode::JumpNotTruthy, &[14]),
                make(Opcode::Constant, &[0]),
                make(Opcode::SetGlobal, &[0]),
                make(Opcode::Null, &[]),
                make(Opcode::Jump, &[15]),
                make(Opcode::Null, &[]),
                make(Opcode::Pop, &[]),
            ])
        );
    }

    #[test]
    fn test_collections_and_index() {
        let bytecode = compile("[1, 2][0]; {1: 2}");
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::Constant, &[0]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Array, &[2]),
                make(Opcode::Constant, &[2]),
                make(Opcode::Index, &[]),
                make(Opcode::Pop, &[]),
                make(Opcode::Constant, &[0]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Hash, &[2]),
                make(Opcode::Pop, &[]),
            ])
        );
    }

    #[test]
    fn test_logical_and_short_circuits() {
        let bytecode = compile("true && false");
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::True, &[]),            // 0000
                make(Opcode::JumpNotTruthy, &[12]), // 0001
                make(Opcode::False, &[]),           // 0004
                make(Opcode::JumpNotTruthy, &[12]), // 0005
                make(Opcode::True, &[]),            // 0008
                make(Opcode::Jump, &[13]),          // 0009
                make(Opcode::False, &[]),           // 0012
                make(Opcode::Pop, &[]),             // 0013
            ])
        );
    }

    #[test]
    fn test_logical_or_short_circuits() {
        let bytecode = compile("false || true");
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::False, &[]),           // 0000
                make(Opcode::JumpNotTruthy, &[8]),  // 0001
                make(Opcode::True, &[]),            // 0004
                make(Opcode::Jump, &[17]),          // 0005
                make(Opcode::True, &[]),            // 0008
                make(Opcode::JumpNotTruthy, &[16]), // 0009
                make(Opcode::True, &[]),            // 0012
                make(Opcode::Jump, &[17]),          // 0013
                make(Opcode::False, &[]),           // 0016
                make(Opcode::Pop, &[]),             // 0017
            ])
        );
    }

    // =========================================================================
    // Bindings
    // =========================================================================

    #[test]
    fn test_global_let_statements() {
        let bytecode = compile("let one = 1; let two = one; two");
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::Constant, &[0]),
                make(Opcode::SetGlobal, &[0]),
                make(Opcode::GetGlobal, &[0]),
                make(Opcode::SetGlobal, &[1]),
                make(Opcode::GetGlobal, &[1]),
                make(Opcode::Pop, &[]),
            ])
        );
    }

    #[test]
    fn test_builtins() {
        let bytecode = compile("len([]); push([], 1);");
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::GetBuiltin, &[0]),
                make(Opcode::Array, &[0]),
                make(Opcode::Call, &[1]),
                make(Opcode::Pop, &[]),
                make(Opcode::GetBuiltin, &[5]),
                make(Opcode::Array, &[0]),
                make(Opcode::Constant, &[0]),
                make(Opcode::Call, &[2]),
                make(Opcode::Pop, &[]),
            ])
        );
    }

    #[test]
    fn test_undefined_variable() {
        let program = parse("let a = 1;\nb").unwrap();
        let err = Compiler::new().compile(&program).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UndefinedVariable("b".into()));
        assert_eq!(err.to_string(), "undefined variable b");
        assert_eq!(err.span, Span::new(11, 12));
    }

    #[test]
    fn test_failed_unit_leaves_state_untouched() {
        let mut compiler = Compiler::new();
        compiler.compile(&parse("let a = 1;").unwrap()).unwrap();
        assert!(compiler.compile(&parse("let b = 99; c").unwrap()).is_err());
        assert_eq!(compiler.constants(), &[Value::Integer(1)]);
        assert_eq!(compiler.symbols().num_definitions(), 1);

        let bytecode = compiler.compile(&parse("let b = 2; a + b").unwrap()).unwrap();
        assert_eq!(bytecode.constants, vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::Constant, &[1]),
                make(Opcode::SetGlobal, &[1]),
                make(Opcode::GetGlobal, &[0]),
                make(Opcode::GetGlobal, &[1]),
                make(Opcode::Add, &[]),
                make(Opcode::Pop, &[]),
            ])
        );
    }

    // =========================================================================
    // Functions and Closures
    // =========================================================================

    #[test]
    fn test_function_returns_last_expression() {
        let bytecode = compile("fn() { 5 + 10 }");
        let function = function_constant(&bytecode, 2);
        assert_eq!(
            disassemble(&function.instructions),
            concat(&[
                make(Opcode::Constant, &[0]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Add, &[]),
                make(Opcode::ReturnValue, &[]),
            ])
        );
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[make(Opcode::Closure, &[2, 0]), make(Opcode::Pop, &[])])
        );
    }

    #[test]
    fn test_empty_function_returns_null() {
        let bytecode = compile("fn() { }");
        let function = function_constant(&bytecode, 0);
        assert_eq!(&*function.instructions, &[Opcode::Return as u8]);
    }

    #[test]
    fn test_locals_and_parameters() {
        let bytecode = compile("fn(a, b) { let c = a; c + b }");
        let function = function_constant(&bytecode, 0);
        assert_eq!(function.num_parameters, 2);
        assert_eq!(function.num_locals, 3);
        assert_eq!(
            disassemble(&function.instructions),
            concat(&[
                make(Opcode::GetLocal, &[0]),
                make(Opcode::SetLocal, &[2]),
                make(Opcode::GetLocal, &[2]),
                make(Opcode::GetLocal, &[1]),
                make(Opcode::Add, &[]),
                make(Opcode::ReturnValue, &[]),
            ])
        );
    }

    #[test]
    fn test_closure_captures_free_variables() {
        let bytecode = compile("fn(a) { fn(b) { a + b } }");
        let inner = function_constant(&bytecode, 0);
        assert_eq!(
            disassemble(&inner.instructions),
            concat(&[
                make(Opcode::GetFree, &[0]),
                make(Opcode::GetLocal, &[0]),
                make(Opcode::Add, &[]),
                make(Opcode::ReturnValue, &[]),
            ])
        );
        let outer = function_constant(&bytecode, 1);
        assert_eq!(
            disassemble(&outer.instructions),
            concat(&[
                make(Opcode::GetLocal, &[0]),
                make(Opcode::Closure, &[0, 1]),
                make(Opcode::ReturnValue, &[]),
            ])
        );
    }

    #[test]
    fn test_nested_closures_capture_through_middle_scope() {
        let bytecode = compile("fn(a) { fn(b) { fn(c) { a + b + c } } }");
        let innermost = function_constant(&bytecode, 0);
        assert_eq!(
            disassemble(&innermost.instructions),
            concat(&[
                make(Opcode::GetFree, &[0]),
                make(Opcode::GetFree, &[1]),
                make(Opcode::Add, &[]),
                make(Opcode::GetLocal, &[0]),
                make(Opcode::Add, &[]),
                make(Opcode::ReturnValue, &[]),
            ])
        );
        let middle = function_constant(&bytecode, 1);
        assert_eq!(
            disassemble(&middle.instructions),
            concat(&[
                make(Opcode::GetFree, &[0]),
                make(Opcode::GetLocal, &[0]),
                make(Opcode::Closure, &[0, 2]),
                make(Opcode::ReturnValue, &[]),
            ])
        );
    }

    #[test]
    fn test_recursive_function_uses_current_closure() {
        let bytecode = compile("let countdown = fn(x) { countdown(x - 1) }; countdown(1);");
        let function = function_constant(&bytecode, 1);
        assert_eq!(function.name.as_deref(), Some("countdown"));
        assert_eq!(
            disassemble(&function.instructions),
            concat(&[
                make(Opcode::CurrentClosure, &[]),
                make(Opcode::GetLocal, &[0]),
                make(Opcode::Constant, &[0]),
                make(Opcode::Sub, &[]),
                make(Opcode::Call, &[1]),
                make(Opcode::ReturnValue, &[]),
            ])
        );
    }

    #[test]
    fn test_call_arguments() {
        let bytecode = compile("let f = fn(a, b) { a }; f(1, 2)");
        assert_eq!(
            disassemble(&bytecode.instructions),
            concat(&[
                make(Opcode::Closure, &[0, 0]),
                make(Opcode::SetGlobal, &[0]),
                make(Opcode::GetGlobal, &[0]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Constant, &[2]),
                make(Opcode::Call, &[2]),
                make(Opcode::Pop, &[]),
            ])
        );
    }

    // =========================================================================
    // Limits
    // =========================================================================

    #[test]
    fn test_too_many_arguments() {
        let args = vec!["1"; 256].join(", ");
        let program = parse(&format!("len({args})")).unwrap();
        let err = Compiler::new().compile(&program).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::TooManyArguments(256));
    }

    #[test]
    fn test_too_many_locals() {
        let body: String = (0..257).map(|i| format!("let v{i} = {i};")).collect();
        let program = parse(&format!("fn() {{ {body} }}")).unwrap();
        let err = Compiler::new().compile(&program).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::TooManyLocals);
    }

    #[test]
    fn test_nesting_limit() {
        let source = format!("{}1{}", "-(".repeat(20), ")".repeat(20));
        let program = parse(&source).unwrap();
        let mut compiler = Compiler::with_config(CompilerConfig { max_depth: 8 });
        let err = compiler.compile(&program).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::NestingTooDeep(8));
        assert!(Compiler::new().compile(&program).is_ok());
    }
}
