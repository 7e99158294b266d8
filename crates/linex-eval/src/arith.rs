//! Restricted arithmetic and boolean evaluation.
//!
//! This is the last resort of the expression evaluator: a small grammar with
//! Python-like operators and precedence, an allow-list of builtin functions
//! (`len`, `str`, `int`, `float`, `bool`, `abs`, `round`, `min`, `max`) and the
//! `math.*` / `random.*` namespaces. Variables are visible by name unless they
//! hold an object.
//!
//! Precedence, lowest first:
//!
//! ```text
//! or
//! and
//! not
//! == != < > <= >=      (chained: a < b < c)
//! + -
//! * / // %
//! unary - +
//! **                   (right associative, binds tighter than a unary on its left)
//! call, (...), literals, names
//! ```

use std::collections::HashMap;
use std::f64::consts;

use rand::Rng;

use crate::condition::{compare, CompareOp};
use crate::error::Error;
use crate::value::{Value, MAX_STRING_LEN};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
    Dot,
}

const OPERATORS: [&str; 13] = [
    "**", "//", "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%",
];

fn fail(message: impl Into<String>) -> Error {
    Error::Expression(message.into())
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
        } else if c.is_ascii_digit()
            || (c == '.' && rest[1..].starts_with(|d: char| d.is_ascii_digit()))
        {
            let (token, len) = lex_number(rest)?;
            tokens.push(token);
            rest = &rest[len..];
        } else if c == '"' || c == '\'' {
            let body = &rest[1..];
            let end = body
                .find(c)
                .ok_or_else(|| fail(format!("unterminated string in '{}'", text)))?;
            tokens.push(Token::Str(body[..end].to_string()));
            rest = &body[end + 1..];
        } else if c.is_alphabetic() || c == '_' {
            let len = rest
                .find(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
                .unwrap_or(rest.len());
            tokens.push(Token::Ident(rest[..len].to_string()));
            rest = &rest[len..];
        } else {
            let single = match c {
                '(' => Some(Token::LParen),
                ')' => Some(Token::RParen),
                ',' => Some(Token::Comma),
                '.' => Some(Token::Dot),
                _ => None,
            };
            if let Some(token) = single {
                tokens.push(token);
                rest = &rest[1..];
                continue;
            }
            let op = OPERATORS
                .iter()
                .copied()
                .find(|op| rest.starts_with(*op))
                .ok_or_else(|| fail(format!("unexpected character '{}'", c)))?;
            tokens.push(Token::Op(op));
            rest = &rest[op.len()..];
        }
    }

    Ok(tokens)
}

fn lex_number(s: &str) -> Result<(Token, usize)> {
    let bytes = s.as_bytes();
    let mut len = 0;
    let mut is_float = false;

    while len < bytes.len() && bytes[len].is_ascii_digit() {
        len += 1;
    }
    if len < bytes.len() && bytes[len] == b'.' {
        is_float = true;
        len += 1;
        while len < bytes.len() && bytes[len].is_ascii_digit() {
            len += 1;
        }
    }
    if len < bytes.len() && (bytes[len] == b'e' || bytes[len] == b'E') {
        let mut end = len + 1;
        if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
            end += 1;
        }
        if end < bytes.len() && bytes[end].is_ascii_digit() {
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            is_float = true;
            len = end;
        }
    }

    let literal = &s[..len];
    let token = if is_float {
        Token::Float(literal.parse().map_err(|_| fail(format!("invalid number '{}'", literal)))?)
    } else {
        Token::Int(literal.parse().map_err(|_| fail(format!("integer '{}' out of range", literal)))?)
    };
    Ok((token, len))
}

/// Evaluate `text` with the non-object entries of `variables` in scope.
pub fn evaluate(text: &str, variables: &HashMap<String, Value>) -> Result<Value> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        variables,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(token) => Err(fail(format!("unexpected {:?} in '{}'", token, text))),
    }
}

/// Recursive-descent evaluator; each rule returns the value of what it parsed.
struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    variables: &'a HashMap<String, Value>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if matches!(self.peek(), Some(Token::Op(o)) if *o == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => Err(fail(format!("expected {:?}, found {:?}", expected, other))),
        }
    }

    fn expr(&mut self) -> Result<Value> {
        self.or()
    }

    // `a or b` yields the first truthy operand, or the last one.
    fn or(&mut self) -> Result<Value> {
        let mut left = self.and()?;
        while self.eat_keyword("or") {
            let right = self.and()?;
            if !left.to_bool() {
                left = right;
            }
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Value> {
        let mut left = self.not()?;
        while self.eat_keyword("and") {
            let right = self.not()?;
            if left.to_bool() {
                left = right;
            }
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Value> {
        if self.eat_keyword("not") {
            let operand = self.not()?;
            return Ok(Value::Boolean(!operand.to_bool()));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Value> {
        let mut left = self.additive()?;
        let mut result: Option<bool> = None;

        while let Some(op) = self.peek_compare_op() {
            self.pos += 1;
            let right = self.additive()?;
            let holds = compare(&left, op, &right)?;
            result = Some(result.unwrap_or(true) && holds);
            left = right;
        }

        Ok(match result {
            Some(b) => Value::Boolean(b),
            None => left,
        })
    }

    fn peek_compare_op(&self) -> Option<CompareOp> {
        match self.peek() {
            Some(Token::Op(op)) => CompareOp::parse_prefix(op).filter(|c| c.symbol() == *op),
            _ => None,
        }
    }

    fn additive(&mut self) -> Result<Value> {
        let mut left = self.term()?;
        loop {
            if self.eat_op("+") {
                let right = self.term()?;
                left = add(&left, &right)?;
            } else if self.eat_op("-") {
                let right = self.term()?;
                left = numeric(&left, &right, "-", i64::checked_sub, |a, b| a - b)?;
            } else {
                return Ok(left);
            }
        }
    }

    fn term(&mut self) -> Result<Value> {
        let mut left = self.unary()?;
        loop {
            if self.eat_op("*") {
                let right = self.unary()?;
                left = multiply(&left, &right)?;
            } else if self.eat_op("//") {
                let right = self.unary()?;
                left = floor_div(&left, &right)?;
            } else if self.eat_op("/") {
                let right = self.unary()?;
                left = divide(&left, &right)?;
            } else if self.eat_op("%") {
                let right = self.unary()?;
                left = modulo(&left, &right)?;
            } else {
                return Ok(left);
            }
        }
    }

    fn unary(&mut self) -> Result<Value> {
        if self.eat_op("-") {
            let operand = self.unary()?;
            return match operand {
                Value::Integer(n) => n
                    .checked_neg()
                    .map(Value::Integer)
                    .ok_or_else(|| fail("integer overflow")),
                Value::Boolean(b) => Ok(Value::Integer(-(b as i64))),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(Error::type_error(format!(
                    "bad operand type for unary -: {}",
                    other.type_name()
                ))),
            };
        }
        if self.eat_op("+") {
            let operand = self.unary()?;
            return match operand {
                Value::Integer(_) | Value::Float(_) => Ok(operand),
                Value::Boolean(b) => Ok(Value::Integer(b as i64)),
                other => Err(Error::type_error(format!(
                    "bad operand type for unary +: {}",
                    other.type_name()
                ))),
            };
        }
        self.power()
    }

    fn power(&mut self) -> Result<Value> {
        let base = self.call()?;
        if self.eat_op("**") {
            let exponent = self.unary()?;
            return power(&base, &exponent);
        }
        Ok(base)
    }

    fn call(&mut self) -> Result<Value> {
        match self.next() {
            Some(Token::Int(n)) => Ok(Value::Integer(n)),
            Some(Token::Float(f)) => Ok(Value::Float(f)),
            Some(Token::Str(s)) => Ok(Value::String(s)),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => self.name(name),
            other => Err(fail(format!("unexpected {:?}", other))),
        }
    }

    fn name(&mut self, name: String) -> Result<Value> {
        match name.as_str() {
            "true" | "True" => return Ok(Value::Boolean(true)),
            "false" | "False" => return Ok(Value::Boolean(false)),
            "null" | "None" => return Ok(Value::Null),
            _ => {}
        }

        let mut qualified = name;
        if matches!(qualified.as_str(), "math" | "random") && self.peek() == Some(&Token::Dot) {
            self.pos += 1;
            match self.next() {
                Some(Token::Ident(member)) => qualified = format!("{}.{}", qualified, member),
                other => return Err(fail(format!("expected a name after '.', found {:?}", other))),
            }
        }

        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let args = self.arguments()?;
            return call_builtin(&qualified, &args);
        }

        match qualified.as_str() {
            "math.pi" => return Ok(Value::Float(consts::PI)),
            "math.e" => return Ok(Value::Float(consts::E)),
            "math.tau" => return Ok(Value::Float(consts::TAU)),
            "math.inf" => return Ok(Value::Float(f64::INFINITY)),
            _ => {}
        }

        match self.variables.get(&qualified) {
            Some(Value::Object(_)) | None => {
                Err(Error::name(format!("name '{}' is not defined", qualified)))
            }
            Some(value) => Ok(value.clone()),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Value>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                other => return Err(fail(format!("expected ',' or ')', found {:?}", other))),
            }
        }
    }
}

fn type_mismatch(op: &str, left: &Value, right: &Value) -> Error {
    Error::type_error(format!(
        "unsupported operand types for {}: {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}

/// Integer view of an integer or boolean.
fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(n) => Some(*n),
        Value::Boolean(b) => Some(*b as i64),
        _ => None,
    }
}

fn numeric(
    left: &Value,
    right: &Value,
    op: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    if let (Some(a), Some(b)) = (as_int(left), as_int(right)) {
        return int_op(a, b)
            .map(Value::Integer)
            .ok_or_else(|| fail("integer overflow"));
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
        _ => Err(type_mismatch(op, left, right)),
    }
}

fn add(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => {
            if a.len() + b.len() > MAX_STRING_LEN {
                return Err(fail("concatenated string is too long"));
            }
            Ok(Value::String(format!("{}{}", a, b)))
        }
        _ => numeric(left, right, "+", i64::checked_add, |a, b| a + b),
    }
}

fn multiply(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::String(s), Value::Integer(n)) | (Value::Integer(n), Value::String(s)) => {
            let times = usize::try_from(*n).unwrap_or(0);
            match s.len().checked_mul(times) {
                Some(len) if len <= MAX_STRING_LEN => {}
                _ => return Err(fail("repeated string is too long")),
            }
            Ok(Value::String(s.repeat(times)))
        }
        _ => numeric(left, right, "*", i64::checked_mul, |a, b| a * b),
    }
}

fn divide(left: &Value, right: &Value) -> Result<Value> {
    match (left.as_f64(), right.as_f64()) {
        (Some(_), Some(b)) if b == 0.0 => Err(fail("division by zero")),
        (Some(a), Some(b)) => Ok(Value::Float(a / b)),
        _ => Err(type_mismatch("/", left, right)),
    }
}

fn floor_div(left: &Value, right: &Value) -> Result<Value> {
    if let (Some(a), Some(b)) = (as_int(left), as_int(right)) {
        if b == 0 {
            return Err(fail("integer division by zero"));
        }
        let q = a.checked_div(b).ok_or_else(|| fail("integer overflow"))?;
        let floored = if a % b != 0 && ((a < 0) != (b < 0)) { q - 1 } else { q };
        return Ok(Value::Integer(floored));
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(_), Some(b)) if b == 0.0 => Err(fail("float floor division by zero")),
        (Some(a), Some(b)) => Ok(Value::Float((a / b).floor())),
        _ => Err(type_mismatch("//", left, right)),
    }
}

fn modulo(left: &Value, right: &Value) -> Result<Value> {
    if let (Some(a), Some(b)) = (as_int(left), as_int(right)) {
        if b == 0 {
            return Err(fail("integer modulo by zero"));
        }
        let r = a.checked_rem(b).ok_or_else(|| fail("integer overflow"))?;
        let result = if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r };
        return Ok(Value::Integer(result));
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(_), Some(b)) if b == 0.0 => Err(fail("float modulo by zero")),
        (Some(a), Some(b)) => {
            let r = a % b;
            Ok(Value::Float(if r != 0.0 && ((r < 0.0) != (b < 0.0)) { r + b } else { r }))
        }
        _ => Err(type_mismatch("%", left, right)),
    }
}

fn power(base: &Value, exponent: &Value) -> Result<Value> {
    if let (Some(a), Some(b)) = (as_int(base), as_int(exponent)) {
        if b >= 0 {
            let exp = u32::try_from(b).map_err(|_| fail("exponent too large"))?;
            return a
                .checked_pow(exp)
                .map(Value::Integer)
                .ok_or_else(|| fail("integer overflow"));
        }
    }
    match (base.as_f64(), exponent.as_f64()) {
        (Some(a), Some(b)) => Ok(Value::Float(a.powf(b))),
        _ => Err(type_mismatch("**", base, exponent)),
    }
}

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(Error::type_error(format!(
            "{}() takes {} argument(s), {} given",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn number_arg(name: &str, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        Error::type_error(format!("{}() expects a number, got {}", name, value.type_name()))
    })
}

fn int_arg(name: &str, value: &Value) -> Result<i64> {
    as_int(value).ok_or_else(|| {
        Error::type_error(format!("{}() expects an integer, got {}", name, value.type_name()))
    })
}

/// Convert a float to an integer, truncating toward zero.
fn float_to_int(f: f64) -> Result<i64> {
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f.trunc() as i64)
    } else {
        Err(Error::value(format!("cannot convert {} to integer", f)))
    }
}

fn call_builtin(name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "len" => {
            arity(name, args, 1, 1)?;
            match &args[0] {
                Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
                Value::Object(map) => Ok(Value::Integer(map.len() as i64)),
                other => Err(Error::type_error(format!(
                    "object of type {} has no len()",
                    other.type_name()
                ))),
            }
        }
        "str" => {
            arity(name, args, 1, 1)?;
            Ok(Value::String(args[0].to_string_value()))
        }
        "int" => {
            arity(name, args, 1, 1)?;
            match &args[0] {
                Value::Integer(n) => Ok(Value::Integer(*n)),
                Value::Boolean(b) => Ok(Value::Integer(*b as i64)),
                Value::Float(f) => float_to_int(*f).map(Value::Integer),
                Value::String(s) => s.trim().parse().map(Value::Integer).map_err(|_| {
                    Error::value(format!("invalid literal for int(): '{}'", s))
                }),
                other => Err(Error::type_error(format!(
                    "int() argument must be a string or a number, not {}",
                    other.type_name()
                ))),
            }
        }
        "float" => {
            arity(name, args, 1, 1)?;
            match &args[0] {
                Value::String(s) => s.trim().parse().map(Value::Float).map_err(|_| {
                    Error::value(format!("could not convert string to float: '{}'", s))
                }),
                other => number_arg(name, other).map(Value::Float),
            }
        }
        "bool" => {
            arity(name, args, 1, 1)?;
            Ok(Value::Boolean(args[0].to_bool()))
        }
        "abs" => {
            arity(name, args, 1, 1)?;
            match &args[0] {
                Value::Integer(n) => n
                    .checked_abs()
                    .map(Value::Integer)
                    .ok_or_else(|| fail("integer overflow")),
                other => number_arg(name, other).map(|f| Value::Float(f.abs())),
            }
        }
        "round" => {
            arity(name, args, 1, 2)?;
            let x = number_arg(name, &args[0])?;
            match args.get(1) {
                None => match &args[0] {
                    Value::Integer(n) => Ok(Value::Integer(*n)),
                    _ => float_to_int(x.round_ties_even()).map(Value::Integer),
                },
                Some(digits) => {
                    let factor = 10f64.powi(int_arg(name, digits)?.clamp(-308, 308) as i32);
                    Ok(Value::Float((x * factor).round_ties_even() / factor))
                }
            }
        }
        "min" | "max" => {
            if args.is_empty() {
                return Err(Error::type_error(format!("{}() expects at least 1 argument", name)));
            }
            let wanted = if name == "min" { CompareOp::Lt } else { CompareOp::Gt };
            let mut best = &args[0];
            for candidate in &args[1..] {
                if compare(candidate, wanted, best)? {
                    best = candidate;
                }
            }
            Ok(best.clone())
        }

        "math.sqrt" => {
            arity(name, args, 1, 1)?;
            let x = number_arg(name, &args[0])?;
            if x < 0.0 {
                return Err(Error::value("math domain error"));
            }
            Ok(Value::Float(x.sqrt()))
        }
        "math.pow" => {
            arity(name, args, 2, 2)?;
            let (x, y) = (number_arg(name, &args[0])?, number_arg(name, &args[1])?);
            Ok(Value::Float(x.powf(y)))
        }
        "math.floor" | "math.ceil" => {
            arity(name, args, 1, 1)?;
            if let Value::Integer(n) = &args[0] {
                return Ok(Value::Integer(*n));
            }
            let x = number_arg(name, &args[0])?;
            let rounded = if name == "math.floor" { x.floor() } else { x.ceil() };
            float_to_int(rounded).map(Value::Integer)
        }
        "math.fabs" => {
            arity(name, args, 1, 1)?;
            Ok(Value::Float(number_arg(name, &args[0])?.abs()))
        }
        "math.exp" => {
            arity(name, args, 1, 1)?;
            Ok(Value::Float(number_arg(name, &args[0])?.exp()))
        }
        "math.log" => {
            arity(name, args, 1, 2)?;
            let x = number_arg(name, &args[0])?;
            if x <= 0.0 {
                return Err(Error::value("math domain error"));
            }
            match args.get(1) {
                None => Ok(Value::Float(x.ln())),
                Some(base) => Ok(Value::Float(x.log(number_arg(name, base)?))),
            }
        }
        "math.log10" | "math.log2" => {
            arity(name, args, 1, 1)?;
            let x = number_arg(name, &args[0])?;
            if x <= 0.0 {
                return Err(Error::value("math domain error"));
            }
            Ok(Value::Float(if name == "math.log10" { x.log10() } else { x.log2() }))
        }
        "math.sin" | "math.cos" | "math.tan" => {
            arity(name, args, 1, 1)?;
            let x = number_arg(name, &args[0])?;
            Ok(Value::Float(match name {
                "math.sin" => x.sin(),
                "math.cos" => x.cos(),
                _ => x.tan(),
            }))
        }

        "random.random" => {
            arity(name, args, 0, 0)?;
            Ok(Value::Float(rand::thread_rng().gen::<f64>()))
        }
        "random.randint" => {
            arity(name, args, 2, 2)?;
            let (low, high) = (int_arg(name, &args[0])?, int_arg(name, &args[1])?);
            if low > high {
                return Err(Error::value(format!("empty range for randint({}, {})", low, high)));
            }
            Ok(Value::Integer(rand::thread_rng().gen_range(low..=high)))
        }
        "random.uniform" => {
            arity(name, args, 2, 2)?;
            let (a, b) = (number_arg(name, &args[0])?, number_arg(name, &args[1])?);
            let t: f64 = rand::thread_rng().gen();
            Ok(Value::Float(a + (b - a) * t))
        }

        _ => Err(Error::name(format!("name '{}' is not defined", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str) -> Result<Value> {
        evaluate(text, &HashMap::new())
    }

    fn eval_with(text: &str, vars: &[(&str, Value)]) -> Result<Value> {
        let variables = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        evaluate(text, &variables)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2 - 3 * 4").unwrap(), Value::Integer(-10));
        assert_eq!(eval("(2 - 3) * 4").unwrap(), Value::Integer(-4));
        assert_eq!(eval("-2 ** 2").unwrap(), Value::Integer(-4));
        assert_eq!(eval("2 ** 3 ** 2").unwrap(), Value::Integer(512));
    }

    #[test]
    fn test_division_kinds() {
        assert_eq!(eval("7 / 2").unwrap(), Value::Float(3.5));
        assert_eq!(eval("7 // 2").unwrap(), Value::Integer(3));
        assert_eq!(eval("-7 // 2").unwrap(), Value::Integer(-4));
        assert_eq!(eval("-7 % 3").unwrap(), Value::Integer(2));
        assert_eq!(eval("7.5 // 2").unwrap(), Value::Float(3.0));
        assert!(eval("1 / 0").is_err());
        assert!(eval("1 % 0").is_err());
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(eval("9223372036854775807 * 2").is_err());
        assert!(eval("2 ** 64").is_err());
    }

    #[test]
    fn test_oversized_string_repetition_is_an_error() {
        let err = eval("\"ab\" * 99999999999999").unwrap_err();
        assert!(err.to_string().contains("too long"));
        assert!(eval("9223372036854775807 * \"x\"").is_err());

        let limit = MAX_STRING_LEN as i64;
        assert_eq!(eval(&format!("len(\"a\" * {})", limit)).unwrap(), Value::Integer(limit));
        assert!(eval(&format!("\"a\" * {}", limit + 1)).is_err());
        assert_eq!(eval("\"ab\" * 0").unwrap(), Value::from(""));
        assert_eq!(eval("\"ab\" * -3").unwrap(), Value::from(""));
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(eval("1 < 2 < 3").unwrap(), Value::Boolean(true));
        assert_eq!(eval("1 < 3 < 2").unwrap(), Value::Boolean(false));
        assert_eq!(eval("1 and 0").unwrap(), Value::Integer(0));
        assert_eq!(eval("0 or 5").unwrap(), Value::Integer(5));
        assert_eq!(eval("not 0").unwrap(), Value::Boolean(true));
        assert_eq!(eval("True and None").unwrap(), Value::Null);
    }

    #[test]
    fn test_variables_are_bound() {
        let result = eval_with("x * 2 - y", &[("x", Value::Integer(5)), ("y", Value::Float(0.5))]);
        assert_eq!(result.unwrap(), Value::Float(9.5));
    }

    #[test]
    fn test_objects_are_hidden() {
        let obj = Value::from_json(r#"{"a": 1}"#).unwrap();
        let err = eval_with("len(o)", &[("o", obj)]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Name);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(eval("int(\"42\")").unwrap(), Value::Integer(42));
        assert_eq!(eval("int(3.9)").unwrap(), Value::Integer(3));
        assert_eq!(eval("float(2)").unwrap(), Value::Float(2.0));
        assert_eq!(eval("str(7) * 2").unwrap(), Value::from("77"));
        assert_eq!(eval("bool(\"\")").unwrap(), Value::Boolean(false));
        assert_eq!(eval("len('hello')").unwrap(), Value::Integer(5));
        assert_eq!(eval("round(2.5)").unwrap(), Value::Integer(2));
        assert_eq!(eval("max(3, 9, 4)").unwrap(), Value::Integer(9));
        assert_eq!(eval("min(3, 1.5)").unwrap(), Value::Float(1.5));
        assert!(eval("int(\"x\")").is_err());
    }

    #[test]
    fn test_math_namespace() {
        assert_eq!(eval("math.sqrt(16)").unwrap(), Value::Float(4.0));
        assert_eq!(eval("math.floor(2.7)").unwrap(), Value::Integer(2));
        assert_eq!(eval("math.ceil(2.1)").unwrap(), Value::Integer(3));
        assert_eq!(eval("math.pi").unwrap(), Value::Float(std::f64::consts::PI));
        assert!(eval("math.sqrt(-1)").is_err());
        assert!(eval("math.system(1)").is_err());
    }

    #[test]
    fn test_random_namespace_stays_in_range() {
        for _ in 0..50 {
            match eval("random.randint(1, 3)").unwrap() {
                Value::Integer(n) => assert!((1..=3).contains(&n)),
                other => panic!("Expected Integer, got {:?}", other),
            }
            match eval("random.random()").unwrap() {
                Value::Float(f) => assert!((0.0..1.0).contains(&f)),
                other => panic!("Expected Float, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unknown_names_and_garbage_fail() {
        assert!(eval("undefined_thing").is_err());
        assert!(eval("open(\"x\")").is_err());
        assert!(eval("1 +").is_err());
        assert!(eval("(1").is_err());
        assert!(eval("hello world").is_err());
        assert!(eval("").is_err());
    }
}
