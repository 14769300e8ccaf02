//! Argument literals.
//!
//! | Input            | Value        |
//! |------------------|--------------|
//! | `null`           | `Null`       |
//! | `true`, `false`  | `Bool`       |
//! | `42`, `-7`       | `I32`        |
//! | `42i64`          | `I64`        |
//! | `1.5`, `2e3`     | `F64`        |
//! | `'c'`            | `Char`       |
//! | `"text"`, `text` | `Str`        |

use mirror::value::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiteralError {
    #[error("integer literal '{0}' does not fit in i32 (add an i64 suffix)")]
    OutOfRange(String),

    #[error("invalid i64 literal '{0}'")]
    InvalidI64(String),

    #[error("invalid char literal {0}: expected exactly one character")]
    InvalidChar(String),

    #[error("unterminated string literal {0}")]
    Unterminated(String),
}

fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float(s: &str) -> bool {
    let looks_numeric = s
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_digit() || b == b'-' || b == b'.');
    looks_numeric && s.parse::<f64>().is_ok()
}

/// Parse one command-line argument into a value.
pub fn parse_literal(s: &str) -> Result<Value, LiteralError> {
    match s {
        "null" => return Ok(Value::Null),
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }

    if let Some(body) = s.strip_prefix('\'') {
        let inner = body
            .strip_suffix('\'')
            .ok_or_else(|| LiteralError::Unterminated(s.to_string()))?;
        let mut chars = inner.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Value::Char(c)),
            _ => Err(LiteralError::InvalidChar(s.to_string())),
        };
    }

    if let Some(body) = s.strip_prefix('"') {
        let inner = body
            .strip_suffix('"')
            .ok_or_else(|| LiteralError::Unterminated(s.to_string()))?;
        return Ok(Value::str(inner));
    }

    if let Some(digits) = s.strip_suffix("i64") {
        if is_integer(digits) {
            return digits
                .parse::<i64>()
                .map(Value::I64)
                .map_err(|_| LiteralError::InvalidI64(s.to_string()));
        }
    }

    if is_integer(s) {
        return s
            .parse::<i32>()
            .map(Value::I32)
            .map_err(|_| LiteralError::OutOfRange(s.to_string()));
    }

    if is_float(s) {
        if let Ok(v) = s.parse::<f64>() {
            return Ok(Value::F64(v));
        }
    }

    Ok(Value::str(s))
}

/// Parse every argument, stopping at the first invalid one.
pub fn parse_all(args: &[String]) -> Result<Vec<Value>, LiteralError> {
    args.iter().map(|a| parse_literal(a)).collect()
}
