//! Error types for the Linex interpreter.

use std::path::PathBuf;
use thiserror::Error;

/// The category of a failure, with any line annotations stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Directive,
    Syntax,
    Name,
    Value,
    Type,
    FileNotFound,
    Runtime,
    Expression,
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("the program must start with 'linex init project'")]
    Directive,

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("name error: {0}")]
    Name(String),

    #[error("value error: {0}")]
    Value(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("file '{}' not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("invalid expression or undefined variable: '{0}'")]
    Expression(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error raised while executing the given program line.
    ///
    /// Nested blocks wrap the same error once per level, so the rendered
    /// message carries one `(line N)` suffix per enclosing block.
    #[error("{source} (line {line})")]
    AtLine {
        line: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn syntax(message: impl Into<String>) -> Self {
        Error::Syntax(message.into())
    }

    pub fn name(message: impl Into<String>) -> Self {
        Error::Name(message.into())
    }

    pub fn value(message: impl Into<String>) -> Self {
        Error::Value(message.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Error::Type(message.into())
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Error::Runtime(message.into())
    }

    /// Annotate this error with the program line it was raised on.
    pub fn at_line(self, line: usize) -> Self {
        Error::AtLine {
            line,
            source: Box::new(self),
        }
    }

    /// The kind of the underlying failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Directive => ErrorKind::Directive,
            Error::Syntax(_) => ErrorKind::Syntax,
            Error::Name(_) => ErrorKind::Name,
            Error::Value(_) => ErrorKind::Value,
            Error::Type(_) => ErrorKind::Type,
            Error::FileNotFound(_) => ErrorKind::FileNotFound,
            Error::Runtime(_) => ErrorKind::Runtime,
            Error::Expression(_) => ErrorKind::Expression,
            Error::Io(_) => ErrorKind::Io,
            Error::AtLine { source, .. } => source.kind(),
        }
    }

    /// Line annotations, innermost first (the order they are rendered in).
    pub fn lines(&self) -> Vec<usize> {
        let mut lines = Vec::new();
        let mut current = self;
        while let Error::AtLine { line, source } = current {
            lines.push(*line);
            current = source;
        }
        lines.reverse();
        lines
    }
}
