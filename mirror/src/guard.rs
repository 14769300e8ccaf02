//! Precondition checks used at public entry points.

use crate::error::{ReflectError, ReflectResult};

/// Return the value, or `ArgumentNull(name)` when it is absent.
pub fn confirm_not_null<T>(value: Option<T>, name: &'static str) -> ReflectResult<T> {
    value.ok_or(ReflectError::ArgumentNull(name))
}

/// Return the value, or `MemberAccess(member)` when it is absent.
pub fn access_not_null<T>(value: Option<T>, member: &str) -> ReflectResult<T> {
    value.ok_or_else(|| ReflectError::MemberAccess(member.to_string()))
}

/// Reject an empty member name.
pub fn confirm_name<'a>(name: &'a str, param: &'static str) -> ReflectResult<&'a str> {
    if name.is_empty() {
        return Err(ReflectError::ArgumentNull(param));
    }
    Ok(name)
}
