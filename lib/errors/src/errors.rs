use std::fmt::{self, Display, Formatter};

use cursor::Line;
use itertools::Itertools;

/// The command was used incorrectly.
pub const EX_USAGE: i32 = 64;
/// The input data was malformed (scan or parse error).
pub const EX_DATAERR: i32 = 65;
/// An input file did not exist or was not readable.
pub const EX_NOINPUT: i32 = 66;
/// Evaluation failed at runtime.
pub const EX_SOFTWARE: i32 = 70;

/// Where a compile-time error was detected, relative to the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Location {
    #[default]
    Unspecified,
    AtEnd,
    At(String),
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Location::Unspecified => Ok(()),
            Location::AtEnd => write!(f, " at end"),
            Location::At(lexeme) => write!(f, " at '{lexeme}'"),
        }
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("[line {line}] Error{location}: {message}")]
pub struct CompileError {
    pub line: Line,
    pub location: Location,
    pub message: String,
}

impl CompileError {
    pub fn new(line: Line, location: Location, message: impl ToString) -> Self {
        Self { line, location, message: message.to_string() }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Default)]
pub struct CompileErrors(pub Vec<CompileError>);

impl Display for CompileErrors {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("\n"))
    }
}

/// Collects everything that went wrong while running source text.
///
/// The session pushes every reported error in here; the driver only looks at [`Self::exit_code`]
/// once a whole script has been run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    compile_errors: Vec<CompileError>,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile_error(&mut self, error: impl Into<CompileError>) {
        let error = error.into();
        log::debug!("compile error: {error}");
        self.compile_errors.push(error);
    }

    pub fn runtime_error(&mut self, error: impl Display) {
        log::debug!("runtime error: {error}");
        self.had_runtime_error = true;
    }

    pub fn had_error(&self) -> bool {
        !self.compile_errors.is_empty()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn compile_errors(&self) -> &[CompileError] {
        &self.compile_errors
    }

    /// Forgets compile errors, so that a prompt can keep going after a malformed line.
    pub fn reset_compile_errors(&mut self) {
        self.compile_errors.clear();
    }

    pub fn exit_code(&self) -> i32 {
        if self.had_error() {
            EX_DATAERR
        } else if self.had_runtime_error() {
            EX_SOFTWARE
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn compile_error_format() {
        let unspecified = CompileError::new(Line(1), Location::Unspecified, "Unexpected character.");
        assert_eq!(unspecified.to_string(), "[line 1] Error: Unexpected character.");

        let at_end = CompileError::new(Line(3), Location::AtEnd, "Expected expression.");
        assert_eq!(at_end.to_string(), "[line 3] Error at end: Expected expression.");

        let at = CompileError::new(Line(2), Location::At(")".to_string()), "Expected expression.");
        assert_eq!(at.to_string(), "[line 2] Error at ')': Expected expression.");

        assert_eq!(
            CompileErrors(vec![unspecified, at_end]).to_string(),
            "[line 1] Error: Unexpected character.\n[line 3] Error at end: Expected expression."
        );
    }

    #[test]
    fn exit_codes() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(diagnostics.exit_code(), 0);

        diagnostics.runtime_error("[line 1] - Operand must be a number.");
        assert!(diagnostics.had_runtime_error());
        assert_eq!(diagnostics.exit_code(), EX_SOFTWARE);

        diagnostics.compile_error(CompileError::new(Line(1), Location::AtEnd, "oops"));
        assert!(diagnostics.had_error());
        assert_eq!(diagnostics.exit_code(), EX_DATAERR);

        diagnostics.reset_compile_errors();
        assert!(!diagnostics.had_error());
        assert_eq!(diagnostics.exit_code(), EX_SOFTWARE);
    }

    #[test]
    fn runtime_errors_only_set_a_flag() {
        let mut diagnostics = Diagnostics::new();
        for line in 1..=1000 {
            diagnostics.runtime_error(format!("[line {line}] + Operands must be numbers."));
        }
        assert!(diagnostics.had_runtime_error());
        assert!(diagnostics.compile_errors().is_empty());
        assert_eq!(diagnostics.exit_code(), EX_SOFTWARE);

        // Compile errors are forgotten between prompt lines, runtime errors are not
        diagnostics.reset_compile_errors();
        assert!(diagnostics.had_runtime_error());
    }
}
