//! Command-line argument definitions.
//!
//! Usage:
//! ```text
//! gibbon [options] [script]
//! gibbon [options] -c <code>
//! ```
//!
//! With neither a script nor `-c`, input comes from stdin when it is piped
//! and from the interactive prompt otherwise.

use clap::{ArgAction, Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Engine Selection
// =============================================================================

/// Which backend executes programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EngineKind {
    /// Compile to bytecode and run on the stack VM.
    #[default]
    Vm,
    /// Walk the syntax tree directly.
    Eval,
}

impl EngineKind {
    /// Parse an engine name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name.trim(), true).ok()
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vm => "vm",
            Self::Eval => "eval",
        })
    }
}

// =============================================================================
// Execution Mode
// =============================================================================

/// Where program text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run a script file.
    Script(PathBuf),
    /// Run code passed with `-c`.
    Command(String),
    /// Run everything read from piped stdin.
    Stdin,
    /// Interactive read-eval-print loop.
    Repl,
}

// =============================================================================
// Arguments
// =============================================================================

/// Parsed command-line arguments.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "gibbon", version, about = "Run Gibbon programs or start an interactive prompt")]
pub struct GibbonArgs {
    /// Script file to run.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Program passed in as a string.
    #[arg(short = 'c', value_name = "CODE", conflicts_with = "script")]
    pub command: Option<String>,

    /// Execution backend [env: GIBBON_ENGINE].
    #[arg(long, value_enum)]
    pub engine: Option<EngineKind>,

    /// Don't print the banner on interactive startup.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Maximum expression nesting depth [env: GIBBON_MAX_DEPTH].
    #[arg(long, value_name = "N", value_parser = parse_limit)]
    pub max_depth: Option<usize>,

    /// Value stack capacity of the VM [env: GIBBON_STACK_SIZE].
    #[arg(long, value_name = "N", value_parser = parse_limit)]
    pub stack_size: Option<usize>,

    /// Print the compiled bytecode instead of running it.
    #[arg(long)]
    pub dump: bool,

    /// Ignore GIBBON_* environment variables.
    #[arg(short = 'E')]
    pub ignore_environment: bool,
}

impl GibbonArgs {
    /// Decide the execution mode. Stdin is used only when it is not a terminal.
    pub fn mode(&self, stdin_is_terminal: bool) -> ExecutionMode {
        if let Some(code) = &self.command {
            ExecutionMode::Command(code.clone())
        } else if let Some(path) = &self.script {
            ExecutionMode::Script(path.clone())
        } else if stdin_is_terminal {
            ExecutionMode::Repl
        } else {
            ExecutionMode::Stdin
        }
    }
}

/// Accept a positive integer.
pub fn parse_limit(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<GibbonArgs, clap::Error> {
        GibbonArgs::try_parse_from(std::iter::once("gibbon").chain(args.iter().copied()))
    }

    #[test]
    fn test_no_args_is_repl_on_terminal() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.mode(true), ExecutionMode::Repl);
        assert_eq!(args.mode(false), ExecutionMode::Stdin);
    }

    #[test]
    fn test_script_path() {
        let args = parse(&["fib.gb"]).unwrap();
        assert_eq!(args.mode(true), ExecutionMode::Script(PathBuf::from("fib.gb")));
    }

    #[test]
    fn test_command() {
        let args = parse(&["-c", "puts(1)"]).unwrap();
        assert_eq!(args.mode(false), ExecutionMode::Command("puts(1)".into()));
    }

    #[test]
    fn test_command_conflicts_with_script() {
        assert!(parse(&["-c", "1", "fib.gb"]).is_err());
    }

    #[test]
    fn test_engine_flag() {
        assert_eq!(parse(&["--engine", "eval"]).unwrap().engine, Some(EngineKind::Eval));
        assert_eq!(parse(&["--engine", "vm"]).unwrap().engine, Some(EngineKind::Vm));
        assert!(parse(&["--engine", "jit"]).is_err());
    }

    #[test]
    fn test_verbose_counts() {
        assert_eq!(parse(&["-vvv"]).unwrap().verbose, 3);
        assert_eq!(parse(&["-v", "-v"]).unwrap().verbose, 2);
    }

    #[test]
    fn test_limits_reject_zero() {
        assert_eq!(parse(&["--max-depth", "64"]).unwrap().max_depth, Some(64));
        assert_eq!(parse(&["--stack-size", "128"]).unwrap().stack_size, Some(128));
        assert!(parse(&["--max-depth", "0"]).is_err());
        assert!(parse(&["--stack-size", "lots"]).is_err());
    }

    #[test]
    fn test_flags() {
        let args = parse(&["-q", "-E", "--dump", "x.gb"]).unwrap();
        assert!(args.quiet);
        assert!(args.ignore_environment);
        assert!(args.dump);
    }

    #[test]
    fn test_engine_name_parsing() {
        assert_eq!(EngineKind::parse("VM"), Some(EngineKind::Vm));
        assert_eq!(EngineKind::parse(" eval "), Some(EngineKind::Eval));
        assert_eq!(EngineKind::parse("tree"), None);
        assert_eq!(EngineKind::Eval.to_string(), "eval");
    }
}
