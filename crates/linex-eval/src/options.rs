//! Configuration for a single program run.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timeout applied to `http get` requests.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Value handed to `input` once the simulated input is exhausted.
pub const DEFAULT_INPUT_PLACEHOLDER: &str = "User input";

/// Deepest chain of nested `call`s a run may build.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

/// How the block executor finds the closer of a `func`, `if` or `loop` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockScan {
    /// Count nested openers of the same kind and stop at the closer that
    /// brings the depth back to zero.
    #[default]
    Nested,
    /// Stop at the first textual closer (or `else`), ignoring nesting.
    ///
    /// An `if` nested in an `if` (or a `loop` in a `loop`) terminates the
    /// outer block early in this mode.
    Flat,
}

/// Options for running a program.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory that `save`/`load` resolve file names against.
    /// `None` means the process working directory.
    pub working_dir: Option<PathBuf>,
    /// Timeout for each `http get` request.
    pub http_timeout: Duration,
    /// Text returned by `input` when no simulated input is left.
    pub input_placeholder: String,
    /// Closer scanning mode for blocks.
    pub block_scan: BlockScan,
    /// Maximum number of `call`s active at once. Deeper recursion fails the
    /// run with a runtime error.
    pub max_call_depth: usize,
}

impl RunOptions {
    pub fn new() -> Self {
        Self {
            working_dir: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            input_placeholder: DEFAULT_INPUT_PLACEHOLDER.to_string(),
            block_scan: BlockScan::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn input_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.input_placeholder = placeholder.into();
        self
    }

    pub fn block_scan(mut self, scan: BlockScan) -> Self {
        self.block_scan = scan;
        self
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Resolve a file name against the configured working directory.
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        match &self.working_dir {
            Some(dir) => dir.join(name),
            None => Path::new(name).to_path_buf(),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RunOptions::default();
        assert_eq!(options.http_timeout, Duration::from_secs(10));
        assert_eq!(options.input_placeholder, "User input");
        assert_eq!(options.block_scan, BlockScan::Nested);
        assert_eq!(options.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(options.resolve_path("state.json"), PathBuf::from("state.json"));
    }

    #[test]
    fn test_resolve_against_working_dir() {
        let options = RunOptions::new().working_dir("/tmp/linex");
        assert_eq!(
            options.resolve_path("state.json"),
            PathBuf::from("/tmp/linex/state.json")
        );
    }
}
