//! Command-line probe for the mirror resolution engine.
//!
//! Every command runs against the [`sample`] registry: list its types,
//! list a type's members, construct a type from literal arguments, or
//! invoke a member by name and let the engine pick the overload.

pub mod literal;
pub mod report;
pub mod sample;
pub mod typename;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use indexmap::IndexSet;
use mirror::host::{Registry, TypeHost};
use mirror::member::MemberKind;
use mirror::ty::{Type, TypeKind};
use mirror::value::Value;
use mirror::{Config, Invoker, ReflectError};
use tracing::debug;

use crate::literal::parse_all;
use crate::report::{member_report, type_report, value_report, Report};
use crate::typename::parse_type;

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Print the effective configuration
    Config,
    /// List the registered types
    Types,
    /// List the members of a type, inherited ones included
    Members {
        /// Type name, e.g. `Box<i32>`
        ty: String,
    },
    /// Construct a type; generic arguments are inferred when omitted
    Construct {
        ty: String,
        /// Argument literals
        args: Vec<String>,
    },
    /// Invoke a method, read a field or property, or raise an event
    Invoke {
        ty: String,
        member: String,
        /// Argument literals
        args: Vec<String>,
    },
}

/// `ty` followed by its base classes.
fn base_chain(reg: &Registry, ty: &Type) -> Vec<Type> {
    let mut chain = vec![ty.clone()];
    let mut current = ty.clone();
    while let Some(base) = reg.base_type(&current) {
        chain.push(base.clone());
        current = base;
    }
    chain
}

/// Member names visible on `ty`, own members first.
fn member_names(reg: &Registry, ty: &Type) -> IndexSet<String> {
    base_chain(reg, ty)
        .iter()
        .filter_map(|t| match t.kind() {
            TypeKind::Adt { def, .. } => Some(reg.def(*def)),
            _ => None,
        })
        .flat_map(|def| def.members.iter())
        .filter(|m| m.kind != MemberKind::Constructor)
        .map(|m| m.name.clone())
        .collect()
}

fn list_members(reg: &Registry, config: &Config, ty: &Type) -> Report {
    let flags = config.flags();
    let ctors = reg.constructors(ty, flags);
    let others = member_names(reg, ty)
        .into_iter()
        .flat_map(|name| reg.members(ty, &name, flags));
    Report::Members {
        ty: reg.type_name(ty),
        members: ctors
            .into_iter()
            .chain(others)
            .map(|m| member_report(reg, &m))
            .collect(),
    }
}

fn invoke(
    reg: &Registry,
    invoker: &Invoker<'_>,
    ty: &Type,
    name: &str,
    args: &[Value],
) -> Result<Value> {
    let members = reg.members(ty, name, invoker.resolver().flags());
    let Some(first) = members.first() else {
        return Err(ReflectError::MissingMember {
            type_name: reg.type_name(ty),
            member: name.to_string(),
        }
        .into());
    };
    // An event shares its name with the private field holding its handlers.
    let kind = [MemberKind::Method, MemberKind::Event]
        .into_iter()
        .find(|k| members.iter().any(|m| m.kind == *k))
        .unwrap_or(first.kind);
    debug!(member = name, ?kind, "probe invoke");

    let instance = || -> Result<Value> {
        invoker
            .create_default(ty)
            .with_context(|| format!("'{}' needs an instance", reg.type_name(ty)))
    };

    let value = match kind {
        MemberKind::Method => {
            let all_static = members
                .iter()
                .filter(|m| m.kind == MemberKind::Method)
                .all(|m| m.is_static);
            if all_static {
                invoker.invoke_static(ty, name, args)?
            } else {
                let target = instance()?;
                invoker.invoke_method(Some(&target), name, args)?
            }
        }
        MemberKind::Field | MemberKind::Property => {
            let target = if first.is_static { None } else { Some(instance()?) };
            invoker.get_value(first, target.as_ref(), args)?
        }
        MemberKind::Event => {
            let target = instance()?;
            invoker.raise_event(Some(&target), name, args)?;
            Value::Unit
        }
        MemberKind::Constructor => bail!("use `construct` to call constructors"),
    };
    Ok(value)
}

/// Run one probe command.
pub fn execute(reg: &Registry, config: &Config, command: &Command) -> Result<Report> {
    let invoker = Invoker::with_config(reg, config);
    match command {
        Command::Config => Ok(Report::Config {
            config: config.clone(),
        }),
        Command::Types => Ok(Report::Types {
            types: reg.types().map(|def| type_report(reg, def)).collect(),
        }),
        Command::Members { ty } => {
            let ty = parse_type(reg, ty)?;
            Ok(list_members(reg, config, &ty))
        }
        Command::Construct { ty, args } => {
            let ty = parse_type(reg, ty)?;
            let args = parse_all(args)?;
            let value = invoker.construct(&ty, &args)?;
            Ok(Report::Value(value_report(reg, &value)))
        }
        Command::Invoke { ty, member, args } => {
            let ty = parse_type(reg, ty)?;
            let args = parse_all(args)?;
            let value = invoke(reg, &invoker, &ty, member, &args)?;
            Ok(Report::Value(value_report(reg, &value)))
        }
    }
}
