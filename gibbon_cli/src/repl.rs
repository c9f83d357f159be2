//! Interactive read-eval-print loop.
//!
//! Each line is one unit: parsed, then compiled and run (or evaluated)
//! against the session's accumulated state. Failures are printed and the
//! loop carries on.

use crate::VERSION;
use crate::session::Session;
use std::io::{self, BufRead, Write};

/// Printed before each line is read.
pub const PROMPT: &str = ">> ";

/// Read lines from `input` until end of input, writing prompts, results and
/// error messages to `output`.
pub fn run_repl(
    session: &mut Session,
    input: impl BufRead,
    output: &mut impl Write,
    quiet: bool,
) -> io::Result<()> {
    if !quiet {
        writeln!(output, "Gibbon {VERSION} ({} engine)", session.engine_kind())?;
        writeln!(output, "Press Ctrl-D to exit.")?;
    }

    let mut lines = input.lines();
    loop {
        output.write_all(PROMPT.as_bytes())?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            return Ok(());
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match session.run(&line) {
            Ok(Some(value)) => writeln!(output, "{value}")?,
            Ok(None) => {}
            Err(err) => {
                log::debug!("line failed: {err:?}");
                writeln!(output, "{err}")?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;

    fn transcript(lines: &str, quiet: bool) -> String {
        let mut session = Session::with_output(&RuntimeConfig::default(), io::sink());
        let mut output = Vec::new();
        run_repl(&mut session, lines.as_bytes(), &mut output, quiet).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_prompt_and_result() {
        assert_eq!(transcript("1 + 2\n", true), ">> 3\n>> \n");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(transcript("\n   \n", true), ">> >> >> \n");
    }

    #[test]
    fn test_banner() {
        let output = transcript("", false);
        assert!(output.starts_with(&format!("Gibbon {VERSION} (vm engine)\n")));
        assert!(output.ends_with("Press Ctrl-D to exit.\n>> \n"));
    }
}
