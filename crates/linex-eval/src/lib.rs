//! Linex interpreter.
//!
//! Linex is a line-oriented scripting language: every program starts with
//! the `linex init project` directive and is followed by one command per
//! line, with `func`, `if` and `loop` blocks closed by `end ...` lines.
//! Programs run against simulated input and produce a list of output lines.
//! A failed run produces exactly one error line instead.
//!
//! Whole runs through [`run`] and [`run_with_options`] are serialized
//! process-wide, since `save` and `load` share the working directory.

mod arith;
mod block;
mod condition;
mod error;
mod expr;
mod guard;
mod interpreter;
mod options;
mod session;
mod statement;
mod value;

pub use block::exec_block;
pub use condition::{compare, eval_condition, CompareOp};
pub use error::{Error, ErrorKind};
pub use expr::{eval_expr, resolve_simple};
pub use guard::{process_guard, RunGuard};
pub use interpreter::{format_error, Interpreter, END_OF_EXECUTION, INIT_DIRECTIVE, PROJECT_STARTED};
pub use options::{
    BlockScan, RunOptions, DEFAULT_HTTP_TIMEOUT, DEFAULT_INPUT_PLACEHOLDER, DEFAULT_MAX_CALL_DEPTH,
};
pub use session::{Function, Session};
pub use statement::exec_statement;
pub use value::{Value, MAX_STRING_LEN};

/// Result type for interpreter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Run a Linex program with default options.
///
/// `input` supplies the values consumed by `input` commands, in order.
pub fn run(source: &str, input: &[&str]) -> Vec<String> {
    run_with_options(source, input, &RunOptions::default())
}

/// Run a Linex program with the given options.
pub fn run_with_options(source: &str, input: &[&str], options: &RunOptions) -> Vec<String> {
    let interpreter = Interpreter::with_options(options.clone());
    process_guard().run(|| interpreter.run(source, input))
}
