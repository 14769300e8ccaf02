//! Match and dispatch result types.

use std::sync::Arc;

use crate::error::ReflectError;
use crate::member::{Member, MemberKind};
use crate::ty::{DefId, GenericParam, Type};

/// Why a declared type rejected an actual type.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// Plain assignability failed (in the direction requested).
    NotAssignable { declared: Type, actual: Type },
    /// The actual type is not an instance of the generic definition.
    NotInstanceOf { def: DefId, actual: Type },
    /// A parameter was already bound to a type the new actual type is not
    /// assignable to.
    Conflict {
        param: GenericParam,
        bound: Type,
        found: Type,
    },
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchFailure {
    Arity { expected: usize, found: usize },
    Receiver(Mismatch),
    ReturnType(Mismatch),
    Argument { position: usize, mismatch: Mismatch },
    /// `null` supplied for a value-type parameter.
    NullToValueType { position: usize },
    /// No argument position constrained this parameter.
    Unbound(GenericParam),
}

/// A successful match: everything needed to close the candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Concrete arguments of the declaring type, in declaration order.
    pub type_args: Vec<Type>,
    /// Concrete method-level arguments, in declaration order.
    pub method_args: Vec<Type>,
    /// Parameter types as declared on the closed declaring type. Method
    /// level parameters are left in place.
    pub param_types: Vec<Type>,
}

/// Outcome of unifying one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Matched(Match),
    Failed(MatchFailure),
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched(_))
    }

    pub fn failure(&self) -> Option<&MatchFailure> {
        match self {
            MatchResult::Failed(f) => Some(f),
            MatchResult::Matched(_) => None,
        }
    }
}

/// The first candidate compatible with a call site.
#[derive(Debug, Clone)]
pub struct Selected {
    pub candidate: Arc<Member>,
    pub matched: Match,
}

/// A resolved and closed member.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The closed member, ready to execute.
    pub member: Arc<Member>,
    /// The candidate as enumerated, before closing.
    pub candidate: Arc<Member>,
    pub matched: Match,
}

/// Result of dispatch resolution.
#[derive(Debug)]
pub enum DispatchResult {
    /// The first compatible candidate.
    Resolved(Selected),
    /// No candidate unified with the arguments.
    NoMatch(NoMatchError),
}

/// Error when no member matches the arguments.
#[derive(Debug)]
pub struct NoMatchError {
    /// Display name of the searched type.
    pub type_name: String,
    /// The member name that was requested.
    pub member_name: String,
    pub kind: MemberKind,
    /// The argument types provided; `None` marks a null argument.
    pub arg_types: Vec<Option<Type>>,
    /// Every candidate considered, with the reason it was rejected.
    pub rejected: Vec<(Arc<Member>, MatchFailure)>,
}

impl From<NoMatchError> for ReflectError {
    fn from(err: NoMatchError) -> Self {
        if err.kind.is_callable() {
            ReflectError::MissingMethod {
                type_name: err.type_name,
                member: err.member_name,
            }
        } else {
            ReflectError::MissingMember {
                type_name: err.type_name,
                member: err.member_name,
            }
        }
    }
}
