//! Type names.
//!
//! ```text
//! type := name ( '<' type ( ',' type )* '>' )?
//! ```
//!
//! A generic definition named without arguments (`Box`) denotes the open
//! definition; with arguments (`Box<i32>`) it is closed.

use mirror::host::Registry;
use mirror::ty::Type;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeNameError {
    #[error("unknown type '{0}'")]
    Unknown(String),

    #[error("type '{name}' expects {expected} type argument(s), got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("malformed type name '{input}' at offset {offset}")]
    Syntax { input: String, offset: usize },
}

fn primitive(name: &str) -> Option<Type> {
    Some(match name {
        "bool" => Type::bool(),
        "i32" => Type::i32(),
        "i64" => Type::i64(),
        "f64" => Type::f64(),
        "char" => Type::char(),
        "str" => Type::str(),
        "unit" => Type::unit(),
        "object" => Type::object(),
        _ => return None,
    })
}

struct Cursor<'s> {
    input: &'s str,
    pos: usize,
}

impl<'s> Cursor<'s> {
    fn skip_ws(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.input[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<&'s str> {
        self.skip_ws();
        let rest = &self.input[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    fn error(&self) -> TypeNameError {
        TypeNameError::Syntax {
            input: self.input.to_string(),
            offset: self.pos,
        }
    }
}

fn parse_in(reg: &Registry, cur: &mut Cursor<'_>) -> Result<Type, TypeNameError> {
    let name = cur.ident().ok_or_else(|| cur.error())?;

    let mut args = Vec::new();
    if cur.eat('<') {
        loop {
            args.push(parse_in(reg, cur)?);
            if cur.eat(',') {
                continue;
            }
            if cur.eat('>') {
                break;
            }
            return Err(cur.error());
        }
    }

    if let Some(ty) = primitive(name) {
        if !args.is_empty() {
            return Err(TypeNameError::ArgumentCount {
                name: name.to_string(),
                expected: 0,
                found: args.len(),
            });
        }
        return Ok(ty);
    }

    let def = reg
        .find(name)
        .ok_or_else(|| TypeNameError::Unknown(name.to_string()))?;
    if args.is_empty() {
        return Ok(def.open_type());
    }
    if args.len() != def.generic_params.len() {
        return Err(TypeNameError::ArgumentCount {
            name: name.to_string(),
            expected: def.generic_params.len(),
            found: args.len(),
        });
    }
    Ok(Type::adt(def.id, args))
}

/// Parse a type name against the types registered in `reg`.
pub fn parse_type(reg: &Registry, input: &str) -> Result<Type, TypeNameError> {
    let mut cur = Cursor { input, pos: 0 };
    let ty = parse_in(reg, &mut cur)?;
    cur.skip_ws();
    if cur.pos != input.len() {
        return Err(cur.error());
    }
    Ok(ty)
}
