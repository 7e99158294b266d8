//! Execution of single, non-block command lines.

use std::fs;

use serde_json::Value as JsonValue;

use crate::block::exec_block;
use crate::error::Error;
use crate::expr::{eval_expr, is_identifier};
use crate::session::Session;
use crate::value::Value;

/// Split off the first whitespace-separated word; the rest is trimmed.
pub(crate) fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

/// Execute a single statement.
pub fn exec_statement(line: &str, session: &mut Session) -> Result<(), Error> {
    let (verb, args) = split_word(line);
    tracing::debug!(verb, args, "statement");

    match verb.to_ascii_lowercase().as_str() {
        "linex" => exec_linex(args, session),
        "var" => exec_var(args, session),
        "input" => exec_input(args, session),
        "calc" => exec_calc(args, session),
        "save" => exec_save(args, session),
        "load" => exec_load(args, session),
        "json" => exec_json(args, session),
        "http" => exec_http(args, session),
        "call" => exec_call(args, session),
        _ => Err(Error::syntax(format!("unknown command '{}'", verb))),
    }
}

fn exec_linex(args: &str, session: &mut Session) -> Result<(), Error> {
    let (sub, expr) = split_word(args);
    if !sub.eq_ignore_ascii_case("print") {
        return Err(Error::syntax(format!("unknown 'linex' sub-command '{}'", sub)));
    }
    if expr.is_empty() {
        return Err(Error::syntax("usage: linex print <expression>"));
    }
    let value = eval_expr(expr, session)?;
    session.emit(format!("📢 {}", value));
    Ok(())
}

fn exec_var(args: &str, session: &mut Session) -> Result<(), Error> {
    let name_len = args
        .find(|c: char| !crate::expr::is_word_char(c))
        .unwrap_or(args.len());
    let (name, rest) = args.split_at(name_len);
    let expr = rest
        .trim_start()
        .strip_prefix('=')
        .filter(|_| !name.is_empty())
        .ok_or_else(|| Error::syntax("usage: var <name> = <expression>"))?;

    let expr = match split_word(expr) {
        (calc, rest) if calc.eq_ignore_ascii_case("calc") => {
            if rest.is_empty() {
                return Err(Error::syntax("usage: var <name> = calc <expression>"));
            }
            rest
        }
        _ => expr,
    };

    let value = eval_expr(expr, session)?;
    session.set_var(name, value);
    session.emit(format!("✅ Variable '{}' created/updated.", name));
    Ok(())
}

fn exec_input(args: &str, session: &mut Session) -> Result<(), Error> {
    if args.is_empty() {
        return Err(Error::syntax("usage: input <variable>"));
    }
    let value = session.next_input();
    session.emit(format!("⌨️ Variable '{}' received input '{}'", args, value));
    session.set_var(args, Value::String(value));
    Ok(())
}

fn exec_calc(args: &str, session: &mut Session) -> Result<(), Error> {
    if args.is_empty() {
        return Err(Error::syntax("usage: calc <expression>"));
    }
    let value = eval_expr(args, session)?;
    session.emit(format!("🧮 Result: {}", value));
    Ok(())
}

/// The text between the first and the last double quote of `args`.
fn quoted_argument(args: &str) -> Option<&str> {
    let inner = args.strip_prefix('"')?;
    let end = inner.rfind('"')?;
    Some(&inner[..end])
}

fn exec_save(args: &str, session: &mut Session) -> Result<(), Error> {
    let name = quoted_argument(args)
        .ok_or_else(|| Error::syntax("usage: save \"<file>\""))?;
    let file_name = format!("{}.json", name);
    let path = session.resolve_path(&file_name);

    let map: serde_json::Map<String, JsonValue> = session
        .variables()
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json_value()))
        .collect();
    let text = serde_json::to_string_pretty(&JsonValue::Object(map))
        .map_err(|e| Error::value(format!("cannot serialize variables: {}", e)))?;
    fs::write(&path, text)?;

    tracing::debug!(path = %path.display(), "saved variables");
    session.emit(format!("💾 Variables saved to {}", file_name));
    Ok(())
}

fn exec_load(args: &str, session: &mut Session) -> Result<(), Error> {
    let name = quoted_argument(args)
        .ok_or_else(|| Error::syntax("usage: load \"<file>\""))?;
    let file_name = format!("{}.json", name);
    let path = session.resolve_path(&file_name);

    if !path.exists() {
        return Err(Error::FileNotFound(file_name.into()));
    }
    let text = fs::read_to_string(&path)?;
    let json: JsonValue = serde_json::from_str(&text)
        .map_err(|e| Error::value(format!("'{}' is not valid JSON: {}", file_name, e)))?;
    let JsonValue::Object(entries) = json else {
        return Err(Error::value(format!("'{}' does not hold a JSON object", file_name)));
    };

    for (key, value) in entries {
        session.set_var(key, Value::from_json_value(value));
    }

    tracing::debug!(path = %path.display(), "loaded variables");
    session.emit(format!("📂 Variables loaded from {}", file_name));
    Ok(())
}

fn exec_json(args: &str, session: &mut Session) -> Result<(), Error> {
    let words: Vec<&str> = args.split_whitespace().collect();
    let (source, target) = match words.as_slice() {
        [load, source, to, target]
            if load.eq_ignore_ascii_case("load")
                && to.eq_ignore_ascii_case("to")
                && is_identifier(source)
                && is_identifier(target) =>
        {
            (*source, *target)
        }
        _ => return Err(Error::syntax("usage: json load <source> to <target>")),
    };

    let text = match session.get_var(source) {
        Some(Value::String(text)) => text,
        Some(other) => {
            return Err(Error::value(format!(
                "variable '{}' holds a {}, not JSON text",
                source,
                other.type_name()
            )))
        }
        None => return Err(Error::name(format!("source variable '{}' is not defined", source))),
    };
    let value = Value::from_json(text).map_err(|_| {
        Error::value(format!("content of variable '{}' is not valid JSON", source))
    })?;

    session.set_var(target, value);
    session.emit(format!(
        "📄 Content of '{}' loaded as JSON into '{}'.",
        source, target
    ));
    Ok(())
}

/// Parse `get "<url>" to <var>`.
fn parse_http_get(args: &str) -> Option<(&str, &str)> {
    let (method, rest) = split_word(args);
    if !method.eq_ignore_ascii_case("get") {
        return None;
    }
    let rest = rest.strip_prefix('"')?;
    let (url, tail) = rest.split_once('"')?;
    match split_word(tail) {
        (to, target) if to.eq_ignore_ascii_case("to") && is_identifier(target) => {
            Some((url, target))
        }
        _ => None,
    }
}

fn exec_http(args: &str, session: &mut Session) -> Result<(), Error> {
    let (url, target) = parse_http_get(args)
        .ok_or_else(|| Error::syntax("usage: http get \"<url>\" to <variable>"))?;

    tracing::debug!(url, "http get");
    let body = session
        .http()
        .get(url)
        .call()
        .map_err(|e| e.to_string())
        .and_then(|response| response.into_string().map_err(|e| e.to_string()));

    match body {
        Ok(body) => {
            session.set_var(target, Value::String(body));
            session.emit(format!(
                "🌐 GET request to `{}` succeeded. Content saved in `{}`.",
                url, target
            ));
            Ok(())
        }
        Err(cause) => {
            session.set_var(target, Value::Null);
            Err(Error::runtime(format!("request to `{}` failed: {}", url, cause)))
        }
    }
}

fn exec_call(args: &str, session: &mut Session) -> Result<(), Error> {
    if args.is_empty() {
        return Err(Error::syntax("usage: call <function>"));
    }
    let function = session
        .function(args)
        .ok_or_else(|| Error::name(format!("function '{}' is not defined", args)))?;

    session.enter_call()?;
    session.emit(format!("➡️ Calling function '{}'...", args));
    let result = exec_block(&function.body, function.first_line, session);
    session.leave_call();
    result?;
    session.emit(format!("⬅️ Finished function '{}'.", args));
    Ok(())
}
