//! Mutable state of a single program run.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Error;
use crate::options::RunOptions;
use crate::value::Value;

/// A user-defined function: the raw lines between `func <name> begin` and
/// `end func`, captured verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Body lines, including any nested block headers and closers.
    pub body: Vec<String>,
    /// Program line number of the first body line, for diagnostics.
    pub first_line: usize,
}

/// The state of one interpreter run.
///
/// Variables live in a single flat namespace: function bodies read and write
/// the same mapping as the top-level program.
#[derive(Debug)]
pub struct Session {
    /// Variable bindings.
    variables: HashMap<String, Value>,
    /// Function table. Redefining a name replaces the previous body.
    functions: HashMap<String, Arc<Function>>,
    /// Pre-supplied values for `input` statements.
    input: Vec<String>,
    /// Index of the next unread `input` entry.
    input_cursor: usize,
    /// Output lines produced so far.
    output: Vec<String>,
    /// Number of `call`s currently executing.
    call_depth: usize,
    options: RunOptions,
    http: ureq::Agent,
}

impl Session {
    /// Create a session with the given options and no simulated input.
    pub fn new(options: RunOptions) -> Self {
        Self::with_input(options, Vec::new())
    }

    /// Create a session whose `input` statements consume `input` in order.
    pub fn with_input(options: RunOptions, input: Vec<String>) -> Self {
        let http = ureq::AgentBuilder::new()
            .timeout(options.http_timeout)
            .build();
        Self {
            variables: HashMap::new(),
            functions: HashMap::new(),
            input,
            input_cursor: 0,
            output: Vec::new(),
            call_depth: 0,
            options,
            http,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Resolve a file name against the run's working directory.
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        self.options.resolve_path(name)
    }

    pub(crate) fn http(&self) -> &ureq::Agent {
        &self.http
    }

    /// Get the value of a variable.
    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Bind a variable, replacing any previous value.
    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// All variable bindings.
    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    /// Store a function body under `name`.
    pub fn define_function(&mut self, name: impl Into<String>, function: Function) {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Look up a function. The handle stays valid if the function is
    /// redefined while it runs.
    pub fn function(&self, name: &str) -> Option<Arc<Function>> {
        self.functions.get(name).cloned()
    }

    /// Record entry into a function call, failing once the configured
    /// depth is exceeded.
    pub(crate) fn enter_call(&mut self) -> Result<(), Error> {
        if self.call_depth >= self.options.max_call_depth {
            return Err(Error::runtime("maximum recursion depth exceeded"));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub(crate) fn leave_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// Consume the next simulated input value, or the placeholder once the
    /// input is exhausted.
    pub fn next_input(&mut self) -> String {
        match self.input.get(self.input_cursor) {
            Some(value) => {
                self.input_cursor += 1;
                value.clone()
            }
            None => self.options.input_placeholder.clone(),
        }
    }

    /// Append a line to the output log.
    pub fn emit(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::trace!(%line, "output");
        self.output.push(line);
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn into_output(self) -> Vec<String> {
        self.output
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(RunOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_var() {
        let mut session = Session::default();
        session.set_var("x", Value::Integer(42));
        assert_eq!(session.get_var("x"), Some(&Value::Integer(42)));
    }

    #[test]
    fn test_undefined_var() {
        let session = Session::default();
        assert_eq!(session.get_var("x"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let mut session = Session::default();
        session.set_var("x", Value::Integer(1));
        session.set_var("x", Value::from("one"));
        assert_eq!(session.get_var("x"), Some(&Value::from("one")));
        assert_eq!(session.variables().len(), 1);
    }

    #[test]
    fn test_input_then_placeholder() {
        let options = RunOptions::new().input_placeholder("nothing left");
        let mut session = Session::with_input(options, vec!["a".into(), "b".into()]);
        assert_eq!(session.next_input(), "a");
        assert_eq!(session.next_input(), "b");
        assert_eq!(session.next_input(), "nothing left");
        assert_eq!(session.next_input(), "nothing left");
    }

    #[test]
    fn test_call_depth_is_capped() {
        let mut session = Session::new(RunOptions::new().max_call_depth(2));
        session.enter_call().unwrap();
        session.enter_call().unwrap();
        let err = session.enter_call().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Runtime);
        assert!(err.to_string().contains("maximum recursion depth exceeded"));

        session.leave_call();
        assert!(session.enter_call().is_ok());
    }

    #[test]
    fn test_redefining_function_replaces_body() {
        let mut session = Session::default();
        session.define_function("f", Function { body: vec!["calc 1".into()], first_line: 2 });
        let old = session.function("f").unwrap();
        session.define_function("f", Function { body: vec!["calc 2".into()], first_line: 9 });
        assert_eq!(old.body, vec!["calc 1".to_string()]);
        assert_eq!(session.function("f").unwrap().first_line, 9);
    }
}
