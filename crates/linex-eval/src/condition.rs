//! Condition evaluation for `if` headers.

use std::cmp::Ordering;

use crate::error::Error;
use crate::expr::{eval_expr, is_word_char};
use crate::session::Session;
use crate::value::Value;

/// A binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl CompareOp {
    /// Two-character operators come first so `>=` is never read as `>`.
    const SYMBOLS: [(&'static str, CompareOp); 6] = [
        ("==", CompareOp::Eq),
        ("!=", CompareOp::NotEq),
        (">=", CompareOp::GtEq),
        ("<=", CompareOp::LtEq),
        (">", CompareOp::Gt),
        ("<", CompareOp::Lt),
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::LtEq => "<=",
            CompareOp::GtEq => ">=",
        }
    }

    /// Match an operator at the start of `s`.
    pub(crate) fn parse_prefix(s: &str) -> Option<CompareOp> {
        Self::SYMBOLS
            .iter()
            .find(|(symbol, _)| s.starts_with(symbol))
            .map(|(_, op)| *op)
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering.is_eq(),
            CompareOp::NotEq => ordering.is_ne(),
            CompareOp::Lt => ordering.is_lt(),
            CompareOp::Gt => ordering.is_gt(),
            CompareOp::LtEq => ordering.is_le(),
            CompareOp::GtEq => ordering.is_ge(),
        }
    }
}

/// Compare two values.
///
/// Numbers compare numerically across Integer and Float, strings
/// lexicographically, booleans as false < true. Equality between any other
/// pair of kinds is false; ordering them is a type error.
pub fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool, Error> {
    let ordering = match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            let (a, b) = (left.as_f64(), right.as_f64());
            match a.zip(b).and_then(|(a, b)| a.partial_cmp(&b)) {
                Some(ordering) => Some(ordering),
                // NaN is unordered: only `!=` holds
                None => return Ok(op == CompareOp::NotEq),
            }
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    };

    match (ordering, op) {
        (Some(ordering), _) => Ok(op.holds(ordering)),
        (None, CompareOp::Eq) => Ok(left == right),
        (None, CompareOp::NotEq) => Ok(left != right),
        (None, _) => Err(Error::type_error(format!(
            "'{}' not supported between {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Evaluate a condition to true or false.
///
/// The first comparison operator outside double quotes splits the condition
/// into two expressions. Without one, the whole condition is evaluated as an
/// expression and coerced to a boolean.
pub fn eval_condition(text: &str, session: &Session) -> Result<bool, Error> {
    let normalized = normalize_keywords(text);

    match find_comparison(&normalized) {
        Some((left, op, right)) => {
            let left = eval_expr(left, session)?;
            let right = eval_expr(right, session)?;
            compare(&left, op, &right)
        }
        None => Ok(eval_expr(&normalized, session)?.to_bool()),
    }
}

/// Pad whole-word `and` / `or` outside quotes with single spaces.
fn normalize_keywords(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_quote = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if c == '"' {
            in_quote = !in_quote;
        }
        if !in_quote && !out.ends_with(is_word_char) {
            if let Some(keyword) = ["and", "or"].into_iter().find(|kw| starts_word(rest, kw)) {
                out.push(' ');
                out.push_str(keyword);
                out.push(' ');
                rest = &rest[keyword.len()..];
                continue;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn starts_word(s: &str, word: &str) -> bool {
    s.starts_with(word) && !s[word.len()..].starts_with(is_word_char)
}

/// Find the first `<left> <op> <right>` split with non-empty sides.
fn find_comparison(text: &str) -> Option<(&str, CompareOp, &str)> {
    let mut in_quote = false;

    for (i, c) in text.char_indices() {
        if c == '"' {
            in_quote = !in_quote;
            continue;
        }
        if in_quote || i == 0 {
            continue;
        }
        if let Some(op) = CompareOp::parse_prefix(&text[i..]) {
            let left = &text[..i];
            let right = &text[i + op.symbol().len()..];
            if !right.trim().is_empty() {
                return Some((left.trim(), op, right.trim()));
            }
        }
    }

    None
}
