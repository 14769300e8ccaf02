//! Generic argument inference and member resolution.
//!
//! [`Compat`] checks one declared type against one actual type, [`Unifier`]
//! checks a whole member signature against a call site, and
//! [`MemberResolver`] searches a type's members for the first one that
//! unifies and closes it.

pub mod compat;
pub mod dispatch;
pub mod result;
pub mod unify;

pub use compat::Compat;
pub use dispatch::{arg_types, MemberResolver};
pub use result::{
    DispatchResult, Match, MatchFailure, MatchResult, Mismatch, NoMatchError, Resolved, Selected,
};
pub use unify::{Substitution, Unifier};
