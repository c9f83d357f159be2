//! Long-lived execution state shared by every input unit of a run.
//!
//! On the VM engine the compiler's constants and symbols and the VM's
//! globals carry over between units; on the evaluator engine the top-level
//! environment does. A unit that fails leaves that state usable.

use crate::args::EngineKind;
use crate::config::RuntimeConfig;
use crate::error::CliError;
use gibbon_compiler::Compiler;
use gibbon_parser::{Parser, ParserConfig, Program, StmtKind};
use gibbon_runtime::{Env, Environment, Value};
use gibbon_vm::{Evaluator, VirtualMachine};
use std::fmt;
use std::io::Write;

enum Engine {
    Vm {
        compiler: Compiler,
        vm: VirtualMachine,
    },
    Eval {
        evaluator: Evaluator,
        env: Env,
    },
}

/// Parses, then compiles and runs or evaluates, one unit at a time.
pub struct Session {
    engine: Engine,
    parser: ParserConfig,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.engine_kind())
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session whose `puts` writes to stdout.
    pub fn new(config: &RuntimeConfig) -> Self {
        Self::with_output(config, std::io::stdout())
    }

    /// Create a session whose `puts` writes to `output`.
    pub fn with_output(config: &RuntimeConfig, output: impl Write + 'static) -> Self {
        let engine = match config.engine {
            EngineKind::Vm => Engine::Vm {
                compiler: Compiler::with_config(config.compiler_config()),
                vm: VirtualMachine::with_config(config.vm_config()).with_output(output),
            },
            EngineKind::Eval => Engine::Eval {
                evaluator: Evaluator::with_config(config.eval_config()).with_output(output),
                env: Environment::new(),
            },
        };
        Self {
            engine,
            parser: config.parser_config(),
        }
    }

    /// Engine this session runs on.
    pub fn engine_kind(&self) -> EngineKind {
        match self.engine {
            Engine::Vm { .. } => EngineKind::Vm,
            Engine::Eval { .. } => EngineKind::Eval,
        }
    }

    /// Run one unit of source text.
    ///
    /// Returns the unit's value, or `None` when its last statement is a
    /// `let` (or it has no statements) and there is nothing to show.
    pub fn run(&mut self, source: &str) -> Result<Option<Value>, CliError> {
        let program = Parser::with_config(source, self.parser)
            .parse_program()
            .map_err(CliError::Parse)?;
        let shows_value = produces_value(&program);

        let value = match &mut self.engine {
            Engine::Vm { compiler, vm } => {
                let bytecode = compiler.compile(&program).map_err(CliError::Compile)?;
                vm.run(&bytecode).map_err(CliError::Runtime)?;
                vm.last_popped().clone()
            }
            Engine::Eval { evaluator, env } => {
                evaluator.eval_program(&program, env).map_err(CliError::Eval)?
            }
        };

        log::debug!("unit finished on {} engine", self.engine_kind());
        Ok(shows_value.then_some(value))
    }
}

/// Compile `source` on its own and return the disassembly listing.
pub fn disassemble(source: &str, config: &RuntimeConfig) -> Result<String, CliError> {
    let program = Parser::with_config(source, config.parser_config())
        .parse_program()
        .map_err(CliError::Parse)?;
    let bytecode = Compiler::with_config(config.compiler_config())
        .compile(&program)
        .map_err(CliError::Compile)?;
    Ok(bytecode.disassemble())
}

fn produces_value(program: &Program) -> bool {
    program
        .statements
        .last()
        .is_some_and(|stmt| !matches!(stmt.kind, StmtKind::Let { .. }))
}
