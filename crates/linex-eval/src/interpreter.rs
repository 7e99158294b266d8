//! The Linex program controller.
//!
//! Validates the init directive, runs the program in a fresh [`Session`] and
//! turns any failure into a single error line.

use crate::block::exec_block;
use crate::error::Error;
use crate::options::RunOptions;
use crate::session::Session;

/// The mandatory first line of every program.
pub const INIT_DIRECTIVE: &str = "linex init project";

/// First output line of a successful run.
pub const PROJECT_STARTED: &str = "✅ Project started successfully!";

/// Last output line of a successful run.
pub const END_OF_EXECUTION: &str = "**--- End of Execution ---**";

/// Render an error as the single line a failed run returns.
pub fn format_error(error: &Error) -> String {
    format!("❌ Execution error: {}", error)
}

/// Drop blank lines and `#` comments.
fn program_lines(source: &str) -> Vec<String> {
    source
        .lines()
        .filter(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(str::to_string)
        .collect()
}

/// The Linex interpreter.
///
/// Holds only configuration: every call builds its own [`Session`] and
/// drops it on return.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    options: RunOptions,
}

impl Interpreter {
    /// Create a new interpreter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new interpreter with the given options.
    pub fn with_options(options: RunOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Execute a program, returning its output or the first error.
    ///
    /// Line numbers in errors count the program's non-blank, non-comment
    /// lines, with the init directive as line 0.
    pub fn execute(&self, source: &str, input: &[&str]) -> crate::Result<Vec<String>> {
        let lines = program_lines(source);
        let body = match lines.split_first() {
            Some((first, body)) if first.trim().eq_ignore_ascii_case(INIT_DIRECTIVE) => body,
            _ => return Err(Error::Directive),
        };

        let input = input.iter().map(|s| s.to_string()).collect();
        let mut session = Session::with_input(self.options.clone(), input);
        session.emit(PROJECT_STARTED);
        exec_block(body, 1, &mut session)?;
        session.emit(END_OF_EXECUTION);

        Ok(session.into_output())
    }

    /// Run a program, returning its output lines.
    ///
    /// On failure the output produced so far is discarded and the result is
    /// exactly one formatted error line.
    pub fn run(&self, source: &str, input: &[&str]) -> Vec<String> {
        let span = tracing::info_span!("linex_run");
        let _entered = span.enter();

        match self.execute(source, input) {
            Ok(output) => {
                tracing::info!(lines = output.len(), "program finished");
                output
            }
            Err(e) => {
                tracing::warn!(error = %e, "program failed");
                vec![format_error(&e)]
            }
        }
    }
}
