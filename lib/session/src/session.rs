use std::io::{self, Write};

use errors::Diagnostics;
use interpreter::Interpreter;
use log::debug;
use parser::Parser;

/// What to echo on the output stream besides the values themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub print_tokens: bool,
    pub print_ast: bool,
}

/// Runs source text through scanner, parser and interpreter, one expression at a time.
///
/// A session can be fed many times (once per prompt line, or once for a whole script); the
/// [`Diagnostics`] accumulate across runs until the caller resets them.
#[derive(Debug, Default)]
pub struct Session {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
    options: Options,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self { options, ..Default::default() }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Values are written to `output`, diagnostics to `errors`.
    ///
    /// Scan errors are all reported. Parsing stops at the first parse error, and nothing is
    /// evaluated once a compile error has been seen. A runtime error only aborts the expression
    /// it occurred in.
    pub fn run_source(
        &mut self,
        source: &str,
        output: &mut impl Write,
        errors: &mut impl Write,
    ) -> io::Result<()> {
        let scanned = scanner::scan(source);
        debug!("Scanned {} tokens, {} errors", scanned.tokens.len(), scanned.errors.len());

        if self.options.print_tokens {
            for token in &scanned.tokens {
                writeln!(output, "{}", token.describe())?;
            }
        }

        let mut had_error = scanned.had_error();
        for error in scanned.errors {
            writeln!(errors, "{error}")?;
            self.diagnostics.compile_error(error);
        }

        let mut parser = Parser::new(scanned.tokens);
        while !parser.is_at_end() {
            let expr = match parser.parse_one() {
                Ok(expr) => expr,
                Err(error) => {
                    writeln!(errors, "{error}")?;
                    self.diagnostics.compile_error(error);
                    had_error = true;
                    break;
                }
            };

            if had_error {
                break;
            }

            if self.options.print_ast {
                writeln!(output, "{expr}")?;
            }

            match self.interpreter.evaluate(&expr) {
                Ok(value) => writeln!(output, "{value}")?,
                Err(error) => {
                    writeln!(errors, "{error}")?;
                    self.diagnostics.runtime_error(error);
                }
            }
        }

        debug!("Run finished, had_error: {had_error}");
        Ok(())
    }
}
