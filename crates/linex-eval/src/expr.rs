//! Expression evaluation.
//!
//! An expression resolves in a fixed order: quoted literal, numeric literal,
//! exact variable name, dotted object path, `+` concatenation, and finally
//! the restricted arithmetic evaluator in [`crate::arith`].

use crate::arith;
use crate::error::Error;
use crate::session::Session;
use crate::value::{Value, MAX_STRING_LEN};

/// Characters allowed in variable and function names.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub(crate) fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_word_char)
}

/// Evaluate an expression against the session's variables.
///
/// A `+` outside double quotes always means string concatenation: every
/// operand is resolved as a simple value and the textual forms of the
/// non-null ones are joined, so `2 + 3` is `"23"`.
pub fn eval_expr(text: &str, session: &Session) -> Result<Value, Error> {
    let text = text.trim();

    if let Some(value) = resolve_simple(text, session) {
        return Ok(value);
    }

    if let Some(parts) = split_concat(text) {
        let mut joined = String::new();
        for part in parts {
            match resolve_simple(part.trim(), session) {
                Some(value) if !value.is_null() => {
                    let text = value.to_string_value();
                    if joined.len() + text.len() > MAX_STRING_LEN {
                        return Err(Error::value("concatenated string is too long"));
                    }
                    joined.push_str(&text);
                }
                _ => {}
            }
        }
        return Ok(Value::String(joined));
    }

    match arith::evaluate(text, session.variables()) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::trace!(expr = text, error = %e, "arithmetic fallback failed");
            Err(Error::Expression(text.to_string()))
        }
    }
}

/// Resolve a literal, a variable or a dotted object path.
///
/// Returns `None` when none of them applies.
pub fn resolve_simple(text: &str, session: &Session) -> Option<Value> {
    if let Some(inner) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        if !inner.contains('"') {
            return Some(Value::String(inner.to_string()));
        }
    }

    if text.contains('.') {
        if let Ok(f) = text.parse::<f64>() {
            return Some(Value::Float(f));
        }
    } else if let Ok(n) = text.parse::<i64>() {
        return Some(Value::Integer(n));
    }

    if let Some(value) = session.get_var(text) {
        return Some(value.clone());
    }

    let (name, path) = text.split_once('.')?;
    if !is_identifier(name) {
        return None;
    }
    match session.get_var(name) {
        Some(object @ Value::Object(_)) => Some(object.get_path(path.split('.'))),
        _ => None,
    }
}

/// Split on every `+` outside double quotes, or `None` if there is none.
fn split_concat(text: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut in_quote = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quote = !in_quote,
            '+' if !in_quote => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if parts.is_empty() {
        return None;
    }
    parts.push(&text[start..]);
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(vars: &[(&str, Value)]) -> Session {
        let mut session = Session::default();
        for (name, value) in vars {
            session.set_var(*name, value.clone());
        }
        session
    }

    #[test]
    fn test_literals() {
        let session = Session::default();
        assert_eq!(eval_expr(r#""hello""#, &session).unwrap(), Value::from("hello"));
        assert_eq!(eval_expr("42", &session).unwrap(), Value::Integer(42));
        assert_eq!(eval_expr("-7", &session).unwrap(), Value::Integer(-7));
        assert_eq!(eval_expr("2.5", &session).unwrap(), Value::Float(2.5));
        assert_eq!(eval_expr(r#""""#, &session).unwrap(), Value::from(""));
    }

    #[test]
    fn test_quoted_plus_is_literal() {
        let session = Session::default();
        assert_eq!(eval_expr(r#""a+b""#, &session).unwrap(), Value::from("a+b"));
    }

    #[test]
    fn test_plus_is_always_concatenation() {
        let session = session_with(&[("x", Value::from("a")), ("y", Value::from("b"))]);
        assert_eq!(eval_expr("x + y", &session).unwrap(), Value::from("ab"));
        assert_eq!(eval_expr("2 + 3", &session).unwrap(), Value::from("23"));
        assert_eq!(
            eval_expr(r#""Hello, " + x + "!""#, &session).unwrap(),
            Value::from("Hello, a!")
        );
    }

    #[test]
    fn test_concatenation_skips_unresolved_and_null() {
        let session = session_with(&[("x", Value::from("a")), ("n", Value::Null)]);
        assert_eq!(eval_expr("x + missing + n", &session).unwrap(), Value::from("a"));
    }

    #[test]
    fn test_arithmetic_without_plus() {
        let session = session_with(&[("c", Value::Integer(10))]);
        assert_eq!(eval_expr("2 - 3", &session).unwrap(), Value::Integer(-1));
        assert_eq!(eval_expr("c * 3", &session).unwrap(), Value::Integer(30));
        assert_eq!(eval_expr("c / 4", &session).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn test_dotted_path() {
        let data = Value::from_json(r#"{"user": {"name": "ana", "age": 30}}"#).unwrap();
        let session = session_with(&[("data", data)]);
        assert_eq!(eval_expr("data.user.name", &session).unwrap(), Value::from("ana"));
        assert_eq!(eval_expr("data.user.age", &session).unwrap(), Value::Integer(30));
        assert_eq!(eval_expr("data.user.email", &session).unwrap(), Value::Null);
        assert_eq!(
            eval_expr(r#""Name: " + data.user.name"#, &session).unwrap(),
            Value::from("Name: ana")
        );
    }

    #[test]
    fn test_unresolved_is_an_expression_error() {
        let session = Session::default();
        let err = eval_expr("nope", &session).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Expression);
        assert!(err.to_string().contains("'nope'"));
    }

    #[test]
    fn test_oversized_concatenation_is_an_error() {
        let half = "x".repeat(MAX_STRING_LEN / 2 + 1);
        let session = session_with(&[("half", Value::String(half))]);
        let err = eval_expr("half + half", &session).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Value);
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_split_concat() {
        assert_eq!(split_concat("a + b"), Some(vec!["a ", " b"]));
        assert_eq!(split_concat(r#""x+y""#), None);
        assert_eq!(split_concat("a - b"), None);
    }
}
