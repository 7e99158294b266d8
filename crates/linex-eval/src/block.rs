//! Block execution: `func`, `if` and `loop` blocks and the statements
//! between them.
//!
//! Blocks are not parsed ahead of time. The executor walks the lines of the
//! current block, and when it meets a block header it scans forward for the
//! matching closer, then recurses into the collected lines.

use crate::condition::eval_condition;
use crate::error::Error;
use crate::expr::is_identifier;
use crate::options::BlockScan;
use crate::session::{Function, Session};
use crate::statement::{exec_statement, split_word};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Func,
    If,
    Loop,
}

impl BlockKind {
    fn opener(self) -> &'static str {
        match self {
            BlockKind::Func => "func",
            BlockKind::If => "if",
            BlockKind::Loop => "loop",
        }
    }

    fn closer(self) -> &'static str {
        match self {
            BlockKind::Func => "end func",
            BlockKind::If => "end if",
            BlockKind::Loop => "end loop",
        }
    }
}

/// Where a block's groups end, as indices into the enclosing line slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockSpan {
    /// The `else` line of an `if` block, if any.
    else_at: Option<usize>,
    /// The closer line.
    end_at: usize,
}

/// Check whether a trimmed line starts with `keyword` as a whole word,
/// ignoring case.
fn is_keyword_line(line: &str, keyword: &str) -> bool {
    line.get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        && line[keyword.len()..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
}

/// Scan `lines[start..]` for the closer of a `kind` block.
fn scan_block(lines: &[String], start: usize, kind: BlockKind, scan: BlockScan) -> Option<BlockSpan> {
    let mut depth = 0usize;
    let mut else_at = None;

    for (offset, raw) in lines[start..].iter().enumerate() {
        let index = start + offset;
        let line = raw.trim();

        if scan == BlockScan::Nested && is_keyword_line(line, kind.opener()) {
            depth += 1;
        } else if is_keyword_line(line, kind.closer()) {
            if depth == 0 {
                return Some(BlockSpan { else_at, end_at: index });
            }
            depth -= 1;
        } else if kind == BlockKind::If
            && depth == 0
            && else_at.is_none()
            && is_keyword_line(line, "else")
        {
            else_at = Some(index);
        }
    }

    None
}

/// Execute a block of lines.
///
/// `first_line` is the program line number of `lines[0]`. An error raised
/// on any line is annotated with that line's number before it propagates,
/// so an error inside nested blocks carries one annotation per level.
pub fn exec_block(lines: &[String], first_line: usize, session: &mut Session) -> Result<(), Error> {
    let mut index = 0;
    while index < lines.len() {
        index = exec_line(lines, index, first_line, session)
            .map_err(|e| e.at_line(first_line + index))?;
    }
    Ok(())
}

/// Execute the line at `index`, returning the index of the next line to run.
fn exec_line(
    lines: &[String],
    index: usize,
    first_line: usize,
    session: &mut Session,
) -> Result<usize, Error> {
    let line = lines[index].trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(index + 1);
    }

    let (keyword, header) = split_word(line);
    let kind = match keyword.to_ascii_lowercase().as_str() {
        "func" => BlockKind::Func,
        "if" => BlockKind::If,
        "loop" => BlockKind::Loop,
        _ => {
            exec_statement(line, session)?;
            return Ok(index + 1);
        }
    };

    let scan = session.options().block_scan;
    let span = scan_block(lines, index + 1, kind, scan).ok_or_else(|| {
        Error::syntax(format!("'{}' block is not closed with '{}'", kind.opener(), kind.closer()))
    })?;
    let body_start = index + 1;
    let line_of = |i: usize| first_line + i;

    match kind {
        BlockKind::Func => {
            let name = parse_func_header(header)?;
            let body = lines[body_start..span.end_at].to_vec();
            tracing::debug!(name, lines = body.len(), "define function");
            session.define_function(
                name,
                Function {
                    body,
                    first_line: line_of(body_start),
                },
            );
            session.emit(format!("📦 Function '{}' defined.", name));
        }

        BlockKind::If => {
            let condition = parse_if_header(header)?;
            let then_end = span.else_at.unwrap_or(span.end_at);

            if eval_condition(condition, session)? {
                session.emit("✅ Condition true. Running 'if' block...");
                exec_block(&lines[body_start..then_end], line_of(body_start), session)?;
            } else {
                session.emit("❌ Condition false. Skipping to 'else' block...");
                if let Some(else_at) = span.else_at {
                    exec_block(&lines[else_at + 1..span.end_at], line_of(else_at + 1), session)?;
                }
            }
        }

        BlockKind::Loop => {
            let times = parse_loop_header(header)?;
            let body = &lines[body_start..span.end_at];
            tracing::debug!(times, "loop");

            session.emit(format!("🔄 Starting loop for {} iterations...", times));
            for _ in 0..times {
                exec_block(body, line_of(body_start), session)?;
            }
            session.emit("✅ Loop finished.");
        }
    }

    Ok(span.end_at + 1)
}

/// `<name> begin`
fn parse_func_header(header: &str) -> Result<&str, Error> {
    match header.split_whitespace().collect::<Vec<_>>().as_slice() {
        [name, begin] if is_identifier(name) && begin.eq_ignore_ascii_case("begin") => Ok(name),
        _ => Err(Error::syntax("usage: func <name> begin")),
    }
}

/// `<condition> begin`
fn parse_if_header(header: &str) -> Result<&str, Error> {
    match header.rsplit_once(char::is_whitespace) {
        Some((condition, begin))
            if begin.eq_ignore_ascii_case("begin") && !condition.trim().is_empty() =>
        {
            Ok(condition.trim())
        }
        _ => Err(Error::syntax("usage: if <condition> begin")),
    }
}

/// `<count> begin`
fn parse_loop_header(header: &str) -> Result<u64, Error> {
    match header.split_whitespace().collect::<Vec<_>>().as_slice() {
        [count, begin]
            if begin.eq_ignore_ascii_case("begin") && count.chars().all(|c| c.is_ascii_digit()) =>
        {
            count.parse().map_err(|_| {
                Error::value(format!("loop count '{}' is out of range", count))
            })
        }
        _ => Err(Error::syntax("usage: loop <count> begin")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RunOptions;
    use crate::value::Value;
    use crate::ErrorKind;

    fn lines(source: &str) -> Vec<String> {
        source.lines().map(str::to_string).collect()
    }

    fn run_block(source: &str, scan: BlockScan) -> Result<Session, Error> {
        let mut session = Session::new(RunOptions::new().block_scan(scan));
        exec_block(&lines(source), 1, &mut session)?;
        Ok(session)
    }

    #[test]
    fn test_keyword_lines() {
        assert!(is_keyword_line("end if", "end if"));
        assert!(is_keyword_line("END IF", "end if"));
        assert!(is_keyword_line("else", "else"));
        assert!(!is_keyword_line("elsewhere = 1", "else"));
        assert!(!is_keyword_line("iffy", "if"));
    }

    #[test]
    fn test_loop_mutations_persist() {
        let session = run_block(
            "var c = 0\nloop 3 begin\nvar c = calc c - -1\nend loop",
            BlockScan::Nested,
        )
        .unwrap();
        assert_eq!(session.get_var("c"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_loop_zero_times() {
        let session = run_block("loop 0 begin\nvar x = 1\nend loop", BlockScan::Nested).unwrap();
        assert_eq!(session.get_var("x"), None);
        assert_eq!(
            session.output(),
            ["🔄 Starting loop for 0 iterations...", "✅ Loop finished."]
        );
    }

    #[test]
    fn test_if_else_runs_one_group() {
        let source = "if 1 == 2 begin\nvar a = 1\nelse\nvar b = 2\nend if";
        let session = run_block(source, BlockScan::Nested).unwrap();
        assert_eq!(session.get_var("a"), None);
        assert_eq!(session.get_var("b"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_function_is_stored_not_run() {
        let session = run_block("func f begin\nvar x = 1\nend func", BlockScan::Nested).unwrap();
        assert_eq!(session.get_var("x"), None);
        let function = session.function("f").unwrap();
        assert_eq!(function.body, vec!["var x = 1".to_string()]);
        assert_eq!(function.first_line, 2);
    }

    const NESTED_IFS: &str = "\
if 1 == 1 begin
if 1 == 2 begin
var inner = 1
else
var inner = 2
end if
var after = 3
end if";

    #[test]
    fn test_nested_scan_matches_closers_by_depth() {
        let session = run_block(NESTED_IFS, BlockScan::Nested).unwrap();
        assert_eq!(session.get_var("inner"), Some(&Value::Integer(2)));
        assert_eq!(session.get_var("after"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_flat_scan_stops_at_first_closer() {
        // The outer `if` takes the inner `else` and `end if` as its own, which
        // leaves the inner `if` without a closer inside the "then" group.
        let err = run_block(NESTED_IFS, BlockScan::Flat).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.lines(), vec![2, 1]);
        assert!(err.to_string().contains("not closed"));
    }

    #[test]
    fn test_nested_loops() {
        let source = "var n = 0\nloop 2 begin\nloop 3 begin\nvar n = calc n - -1\nend loop\nend loop";
        let nested = run_block(source, BlockScan::Nested).unwrap();
        assert_eq!(nested.get_var("n"), Some(&Value::Integer(6)));

        // Flat scanning ends the outer loop at the first `end loop`
        let flat = run_block(source, BlockScan::Flat).unwrap_err();
        assert_eq!(flat.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_malformed_headers() {
        for source in [
            "func begin\nend func",
            "func f\nend func",
            "if 1 == 1\nend if",
            "loop x begin\nend loop",
            "loop -1 begin\nend loop",
            "loop 3 begin\nvar x = 1",
        ] {
            let err = run_block(source, BlockScan::Nested).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Syntax, "{}", source);
            assert_eq!(err.lines(), vec![1], "{}", source);
        }
    }

    #[test]
    fn test_errors_stack_line_annotations() {
        let source = "var x = 1\nif 1 == 1 begin\nloop 1 begin\ncall missing\nend loop\nend if";
        let err = run_block(source, BlockScan::Nested).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Name);
        assert_eq!(err.lines(), vec![4, 3, 2]);
        assert!(err.to_string().ends_with("(line 4) (line 3) (line 2)"));
    }
}
