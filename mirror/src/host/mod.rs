//! The type-introspection surface the engine runs against.
//!
//! The engine never inspects type definitions directly. Everything it needs
//! (member enumeration, assignability, closing open types and methods,
//! executing members) goes through [`TypeHost`]. [`Registry`] is the
//! in-crate implementation: a table of type definitions built once and
//! shared across calls.

mod builder;
mod registry;

use std::sync::Arc;

pub use builder::{MemberBuilder, TypeBuilder};
pub use registry::{DefKind, Registry, TypeDef};

use crate::error::ReflectResult;
use crate::member::{BindingFlags, Member, MemberKind};
use crate::ty::{DefId, Type};
use crate::value::Value;

/// A request to execute a closed member.
#[derive(Debug)]
pub enum Call<'a> {
    Construct {
        ctor: &'a Member,
        args: &'a [Value],
    },
    Invoke {
        method: &'a Member,
        target: Option<&'a Value>,
        args: &'a [Value],
    },
    Get {
        member: &'a Member,
        target: Option<&'a Value>,
        index: &'a [Value],
    },
    Set {
        member: &'a Member,
        target: Option<&'a Value>,
        value: Value,
        index: &'a [Value],
    },
}

/// Type introspection and execution.
///
/// Read operations must be safe to call concurrently. [`TypeHost::call`]
/// reports a failure raised by a member body as
/// [`ReflectError::TargetInvocation`](crate::error::ReflectError::TargetInvocation),
/// one wrapper layer around the body's [`Fault`](crate::error::Fault).
pub trait TypeHost: Send + Sync {
    /// Display name, with generic arguments.
    fn type_name(&self, ty: &Type) -> String;

    /// Value types cannot hold null.
    fn is_value_type(&self, ty: &Type) -> bool;

    /// Direct base class, substituted for `ty`'s arguments.
    fn base_type(&self, ty: &Type) -> Option<Type>;

    /// Whether a value of type `actual` may be stored where `declared` is
    /// expected.
    fn is_assignable(&self, actual: &Type, declared: &Type) -> bool;

    /// Arguments of the instantiation of generic definition `def` found in
    /// `actual` itself, its base chain or its interfaces.
    fn find_instantiation(&self, actual: &Type, def: DefId) -> Option<Vec<Type>>;

    /// Non-constructor members named `name`, own members first, then
    /// inherited ones, each in declaration order.
    fn members(&self, ty: &Type, name: &str, flags: BindingFlags) -> Vec<Arc<Member>>;

    /// Constructors declared on `ty`, in declaration order.
    fn constructors(&self, ty: &Type, flags: BindingFlags) -> Vec<Arc<Member>>;

    /// Construct `def` with the given arguments.
    fn close_type(&self, def: DefId, args: &[Type]) -> ReflectResult<Type>;

    /// Look a member up on `ty` by kind, name and exact parameter types.
    fn find_member(
        &self,
        ty: &Type,
        kind: MemberKind,
        name: &str,
        params: &[Type],
    ) -> Option<Arc<Member>>;

    /// Close a generic method definition.
    fn close_method(&self, member: &Member, args: &[Type]) -> ReflectResult<Arc<Member>>;

    /// Execute a closed member.
    fn call(&self, call: Call<'_>) -> ReflectResult<Value>;
}

/// `Type.Member` as used in messages and fault traces.
pub fn member_path(host: &dyn TypeHost, member: &Member) -> String {
    format!("{}.{}", host.type_name(&member.declaring), member.name)
}

/// Human-readable member signature.
pub fn signature(host: &dyn TypeHost, member: &Member) -> String {
    let list = |tys: &[Type]| {
        tys.iter()
            .map(|t| host.type_name(t))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let generics = if member.method_args.is_empty() && !member.generic_params.is_empty() {
        let names: Vec<&str> = member.generic_params.iter().map(|p| &*p.name).collect();
        format!("<{}>", names.join(", "))
    } else if !member.method_args.is_empty() {
        format!("<{}>", list(&member.method_args))
    } else {
        String::new()
    };
    let prefix = if member.is_static { "static " } else { "" };
    match member.kind {
        MemberKind::Constructor => format!("new({})", list(&member.params)),
        MemberKind::Method => format!(
            "{prefix}{}{generics}({}) -> {}",
            member.name,
            list(&member.params),
            host.type_name(&member.ty)
        ),
        MemberKind::Field => format!("{prefix}{}: {}", member.name, host.type_name(&member.ty)),
        MemberKind::Property if member.params.is_empty() => {
            format!("{prefix}{}: {}", member.name, host.type_name(&member.ty))
        }
        MemberKind::Property => format!(
            "{prefix}{}[{}]: {}",
            member.name,
            list(&member.params),
            host.type_name(&member.ty)
        ),
        MemberKind::Event => format!("event {}", member.name),
    }
}
