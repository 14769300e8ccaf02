//! Probe output, rendered as text or JSON.

use std::fmt;

use mirror::host::{signature, DefKind, Registry, TypeDef, TypeHost};
use mirror::member::{Member, MemberKind};
use mirror::value::Value;
use mirror::Config;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeReport {
    pub name: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    pub members: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberReport {
    pub kind: &'static str,
    pub signature: String,
    /// Declaring type, as seen from the listed type.
    pub declared_in: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueReport {
    /// Runtime type; `null` for a null value.
    #[serde(rename = "type")]
    pub ty: String,
    pub value: String,
}

/// Result of one probe command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    Config { config: Config },
    Types { types: Vec<TypeReport> },
    Members { ty: String, members: Vec<MemberReport> },
    Value(ValueReport),
}

fn def_kind(kind: DefKind) -> &'static str {
    match kind {
        DefKind::Class => "class",
        DefKind::Struct => "struct",
        DefKind::Interface => "interface",
    }
}

fn member_kind(kind: MemberKind) -> &'static str {
    match kind {
        MemberKind::Constructor => "constructor",
        MemberKind::Method => "method",
        MemberKind::Field => "field",
        MemberKind::Property => "property",
        MemberKind::Event => "event",
    }
}

pub fn type_report(reg: &Registry, def: &TypeDef) -> TypeReport {
    TypeReport {
        name: reg.type_name(&def.open_type()),
        kind: def_kind(def.kind),
        base: def.base.as_ref().map(|b| reg.type_name(b)),
        members: def.members.len(),
    }
}

pub fn member_report(reg: &Registry, member: &Member) -> MemberReport {
    MemberReport {
        kind: member_kind(member.kind),
        signature: signature(reg, member),
        declared_in: reg.type_name(&member.declaring),
    }
}

pub fn value_report(host: &dyn TypeHost, value: &Value) -> ValueReport {
    ValueReport {
        ty: value
            .type_of()
            .map(|t| host.type_name(&t))
            .unwrap_or_else(|| "null".to_string()),
        value: format!("{value:?}"),
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Config { config } => {
                let text = toml::to_string_pretty(config).map_err(|_| fmt::Error)?;
                write!(f, "{}", text.trim_end())
            }
            Report::Types { types } => {
                let width = types.iter().map(|t| t.name.len()).max().unwrap_or(0);
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{:<width$}  {:<9}  {} member(s)", t.name, t.kind, t.members)?;
                    if let Some(base) = &t.base {
                        write!(f, "  : {base}")?;
                    }
                }
                Ok(())
            }
            Report::Members { ty, members } => {
                write!(f, "{ty}")?;
                for m in members {
                    write!(f, "\n  {:<11}  {}", m.kind, m.signature)?;
                    if &m.declared_in != ty {
                        write!(f, "  (from {})", m.declared_in)?;
                    }
                }
                Ok(())
            }
            Report::Value(v) => write!(f, "{}: {}", v.value, v.ty),
        }
    }
}
