//! Front end for the `gibbon` binary: argument handling, configuration,
//! the interactive prompt and error reporting.

#![deny(unsafe_code)]

pub mod args;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod repl;
pub mod session;

pub use args::{EngineKind, ExecutionMode, GibbonArgs};
pub use config::RuntimeConfig;
pub use error::{CliError, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR, report_error};
pub use repl::{PROMPT, run_repl};
pub use session::{Session, disassemble};

/// Package version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
