//! Runtime configuration aggregated from CLI flags and environment variables.
//!
//! Everything is resolved once at startup. Flags win over the environment,
//! and `-E` ignores the environment entirely.

use crate::args::{EngineKind, GibbonArgs, parse_limit};
use crate::error::CliError;
use gibbon_compiler::CompilerConfig;
use gibbon_parser::{DEFAULT_MAX_DEPTH, ParserConfig};
use gibbon_vm::{DEFAULT_MAX_FRAMES, DEFAULT_STACK_SIZE, EvalConfig, VmConfig};

/// Selects the execution engine.
pub const ENV_ENGINE: &str = "GIBBON_ENGINE";
/// Overrides the nesting depth limit.
pub const ENV_MAX_DEPTH: &str = "GIBBON_MAX_DEPTH";
/// Overrides the VM stack capacity.
pub const ENV_STACK_SIZE: &str = "GIBBON_STACK_SIZE";
/// Log filter in `env_logger` syntax.
pub const ENV_LOG: &str = "GIBBON_LOG";
/// Fallback log filter.
pub const ENV_RUST_LOG: &str = "RUST_LOG";

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Complete runtime configuration resolved from CLI args and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Execution backend.
    pub engine: EngineKind,
    /// Nesting limit shared by the parser, compiler and evaluator.
    pub max_depth: usize,
    /// VM value stack capacity.
    pub stack_size: usize,
    /// Call depth limit for both engines.
    pub max_frames: usize,
    /// `-v` count.
    pub verbose: u8,
    /// Suppress the interactive banner.
    pub quiet: bool,
    /// Print disassembly instead of running.
    pub dump: bool,
    /// `-E` was given.
    pub ignore_environment: bool,
    /// Log filter taken from the environment, if any.
    pub env_log_filter: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            stack_size: DEFAULT_STACK_SIZE,
            max_frames: DEFAULT_MAX_FRAMES,
            verbose: 0,
            quiet: false,
            dump: false,
            ignore_environment: false,
            env_log_filter: None,
        }
    }
}

impl RuntimeConfig {
    /// Resolve configuration from parsed args and the process environment.
    pub fn from_args(args: &GibbonArgs) -> Result<Self, CliError> {
        Self::resolve(args, |name| std::env::var(name).ok())
    }

    /// Resolve configuration using `lookup` to read environment variables.
    pub fn resolve(
        args: &GibbonArgs,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CliError> {
        let env = |name: &str| {
            if args.ignore_environment {
                None
            } else {
                lookup(name).filter(|v| !v.is_empty())
            }
        };

        let engine = match (args.engine, env(ENV_ENGINE)) {
            (Some(engine), _) => engine,
            (None, Some(value)) => {
                EngineKind::parse(&value).ok_or_else(|| invalid(ENV_ENGINE, value))?
            }
            (None, None) => EngineKind::default(),
        };

        let max_depth = match (args.max_depth, env(ENV_MAX_DEPTH)) {
            (Some(n), _) => n,
            (None, Some(value)) => parse_limit(&value).map_err(|_| invalid(ENV_MAX_DEPTH, value))?,
            (None, None) => DEFAULT_MAX_DEPTH,
        };

        let stack_size = match (args.stack_size, env(ENV_STACK_SIZE)) {
            (Some(n), _) => n,
            (None, Some(value)) => {
                parse_limit(&value).map_err(|_| invalid(ENV_STACK_SIZE, value))?
            }
            (None, None) => DEFAULT_STACK_SIZE,
        };

        let env_log_filter = env(ENV_LOG).or_else(|| env(ENV_RUST_LOG));

        Ok(Self {
            engine,
            max_depth,
            stack_size,
            max_frames: DEFAULT_MAX_FRAMES,
            verbose: args.verbose,
            quiet: args.quiet,
            dump: args.dump,
            ignore_environment: args.ignore_environment,
            env_log_filter,
        })
    }

    /// Filter string for the logger. `-v` flags take precedence over the
    /// environment; the default shows warnings only.
    pub fn log_filter(&self) -> String {
        match self.verbose {
            0 => self
                .env_log_filter
                .clone()
                .unwrap_or_else(|| "warn".to_string()),
            1 => "info".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }

    // =========================================================================
    // Per-crate Limits
    // =========================================================================

    /// Parser limits.
    #[inline]
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            max_depth: self.max_depth,
        }
    }

    /// Compiler limits.
    #[inline]
    pub fn compiler_config(&self) -> CompilerConfig {
        CompilerConfig {
            max_depth: self.max_depth,
        }
    }

    /// VM limits.
    #[inline]
    pub fn vm_config(&self) -> VmConfig {
        VmConfig {
            stack_size: self.stack_size,
            max_frames: self.max_frames,
        }
    }

    /// Evaluator limits.
    #[inline]
    pub fn eval_config(&self) -> EvalConfig {
        EvalConfig {
            max_depth: self.max_depth,
            max_calls: self.max_frames,
        }
    }
}

fn invalid(var: &'static str, value: String) -> CliError {
    CliError::InvalidEnvironment { var, value }
}

// =============================================================================
// Tests
// =============================================================================
