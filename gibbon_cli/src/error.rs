//! CLI errors, their rendering and process exit codes.
//!
//! Library errors are wrapped here so each fault domain keeps its own
//! message. The `Display` form of the program errors is exactly the line the
//! interactive prompt prints; scripts get a located diagnostic instead.

use crate::diagnostics::{self, SourceMap};
use gibbon_compiler::CompileError;
use gibbon_parser::{ParseError, Span};
use gibbon_vm::{EvalError, VmError};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

// =============================================================================
// Exit Codes
// =============================================================================

/// Successful execution.
pub const EXIT_SUCCESS: u8 = 0;
/// The program failed to parse, compile or run.
pub const EXIT_ERROR: u8 = 1;
/// Bad invocation: unreadable script, invalid environment.
pub const EXIT_USAGE_ERROR: u8 = 2;

// =============================================================================
// Errors
// =============================================================================

/// Anything that can stop the `gibbon` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("parse program failed: {0}")]
    Parse(#[source] ParseError),

    #[error("compile program failed: {0}")]
    Compile(#[source] CompileError),

    #[error("vm run program failed: {0}")]
    Runtime(#[source] VmError),

    #[error("evaluate program failed: {0}")]
    Eval(#[source] EvalError),

    #[error("can't open file '{}': {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("invalid value {value:?} for {var}")]
    InvalidEnvironment { var: &'static str, value: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Open { .. } | Self::InvalidEnvironment { .. } => EXIT_USAGE_ERROR,
            _ => EXIT_ERROR,
        }
    }
}

// =============================================================================
// Error Formatting
// =============================================================================

/// Print `error` to stderr and return the exit code.
///
/// `source` is the program text, when there is one, for located errors.
pub fn report_error(error: &CliError, source: Option<&str>, filename: &str) -> ExitCode {
    eprint!("{}", format_error_string(error, source, filename));
    ExitCode::from(error.exit_code())
}

/// Format `error` for a script run (for testing).
pub fn format_error_string(error: &CliError, source: Option<&str>, filename: &str) -> String {
    let located = |label: &str, message: &str, span: Span| match source {
        Some(src) => {
            let sm = SourceMap::new(src, filename);
            format!("{}\n", diagnostics::render_source_error(&sm, span, label, message))
        }
        None => format!("  File \"{filename}\"\n{label}: {message}\n"),
    };

    match error {
        CliError::Parse(e) => located("SyntaxError", &e.message, e.span),
        CliError::Compile(e) => located("CompileError", &e.kind.to_string(), e.span),
        CliError::Runtime(e) => format!("  File \"{filename}\"\nRuntimeError: {e}\n"),
        CliError::Eval(e) => format!("  File \"{filename}\"\nRuntimeError: {e}\n"),
        other => format!("gibbon: {other}\n"),
    }
}

// =============================================================================
// Tests
// =============================================================================
