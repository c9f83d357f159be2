//! Gibbon: run a script, a `-c` string, piped stdin, or the interactive prompt.

use clap::Parser;
use gibbon_cli::{
    CliError, EXIT_SUCCESS, ExecutionMode, GibbonArgs, RuntimeConfig, Session, disassemble,
    report_error, run_repl,
};
use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = GibbonArgs::parse();
    let config = match RuntimeConfig::from_args(&args) {
        Ok(config) => config,
        Err(err) => return report_error(&err, None, "<environment>"),
    };
    init_logging(&config);

    let mode = args.mode(io::stdin().is_terminal());
    log::debug!("{mode:?} on {} engine", config.engine);

    match mode {
        ExecutionMode::Repl => {
            let mut session = Session::new(&config);
            match run_repl(&mut session, io::stdin().lock(), &mut io::stdout(), config.quiet) {
                Ok(()) => ExitCode::from(EXIT_SUCCESS),
                Err(err) => report_error(&CliError::Io(err), None, "<stdin>"),
            }
        }
        ExecutionMode::Script(path) => match std::fs::read_to_string(&path) {
            Ok(source) => execute(&config, &source, &path.display().to_string()),
            Err(source) => report_error(&CliError::Open { path, source }, None, ""),
        },
        ExecutionMode::Command(code) => execute(&config, &code, "<string>"),
        ExecutionMode::Stdin => {
            let mut source = String::new();
            match io::stdin().read_to_string(&mut source) {
                Ok(_) => execute(&config, &source, "<stdin>"),
                Err(err) => report_error(&CliError::Io(err), None, "<stdin>"),
            }
        }
    }
}

/// Run (or with `--dump`, disassemble) a whole program.
fn execute(config: &RuntimeConfig, source: &str, filename: &str) -> ExitCode {
    let result = if config.dump {
        disassemble(source, config).map(|listing| print!("{listing}"))
    } else {
        Session::new(config).run(source).map(drop)
    };
    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => report_error(&err, Some(source), filename),
    }
}

fn init_logging(config: &RuntimeConfig) {
    let filter = config.log_filter();
    let installed = env_logger::Builder::new()
        .parse_filters(&filter)
        .format_timestamp(None)
        .try_init();
    if installed.is_err() {
        eprintln!("gibbon: logger already initialized");
    }
}
