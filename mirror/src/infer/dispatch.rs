//! Member resolution by name and runtime argument types.
//!
//! # Algorithm Overview
//!
//! 1. **Collect candidates**: every member of the requested kind and name on
//!    the type, own members first, then inherited ones up the base chain
//! 2. **Unify in order**: run the [`Unifier`] on each candidate
//! 3. **First match wins**: the first compatible candidate is selected, with
//!    no specificity ranking and no ambiguity error
//! 4. **Close**: bind the inferred arguments into the declaring type and
//!    the method, yielding an executable member

use std::sync::Arc;

use tracing::{debug, trace};

use super::result::{DispatchResult, Match, MatchResult, NoMatchError, Resolved, Selected};
use super::unify::Unifier;
use crate::error::{ReflectError, ReflectResult};
use crate::host::{member_path, TypeHost};
use crate::member::{BindingFlags, Member, MemberKind};
use crate::ty::Type;
use crate::value::Value;

/// Runtime argument types; `None` marks a null argument.
pub fn arg_types(args: &[Value]) -> Vec<Option<Type>> {
    args.iter().map(Value::type_of).collect()
}

/// Dispatch resolution context.
pub struct MemberResolver<'a> {
    host: &'a dyn TypeHost,
    flags: BindingFlags,
}

impl<'a> MemberResolver<'a> {
    /// Create a resolver that admits every member.
    pub fn new(host: &'a dyn TypeHost) -> Self {
        Self::with_flags(host, BindingFlags::ALL)
    }

    pub fn with_flags(host: &'a dyn TypeHost, flags: BindingFlags) -> Self {
        Self { host, flags }
    }

    pub fn host(&self) -> &'a dyn TypeHost {
        self.host
    }

    pub fn flags(&self) -> BindingFlags {
        self.flags
    }

    pub fn unifier(&self) -> Unifier<'a> {
        Unifier::new(self.host)
    }

    /// Candidates of `kind` named `name`, in resolution order.
    pub fn candidates(&self, ty: &Type, name: &str, kind: MemberKind) -> Vec<Arc<Member>> {
        if kind == MemberKind::Constructor {
            return self.host.constructors(ty, self.flags);
        }
        self.host
            .members(ty, name, self.flags)
            .into_iter()
            .filter(|m| m.kind == kind)
            .collect()
    }

    /// Find the first member of `ty` compatible with the call site.
    ///
    /// `target` is the receiver's runtime type for instance members;
    /// `expected` the type the result is consumed as.
    pub fn resolve(
        &self,
        ty: &Type,
        name: &str,
        kind: MemberKind,
        target: Option<&Type>,
        args: &[Option<Type>],
        expected: Option<&Type>,
    ) -> DispatchResult {
        let unifier = self.unifier();
        let mut rejected = Vec::new();

        for candidate in self.candidates(ty, name, kind) {
            match unifier.unify(&candidate, target, args, expected) {
                MatchResult::Matched(matched) => {
                    debug!(
                        member = %member_path(self.host, &candidate),
                        rejected = rejected.len(),
                        "resolved member"
                    );
                    return DispatchResult::Resolved(Selected { candidate, matched });
                }
                MatchResult::Failed(failure) => {
                    trace!(
                        member = %member_path(self.host, &candidate),
                        ?failure,
                        "candidate rejected"
                    );
                    rejected.push((candidate, failure));
                }
            }
        }

        debug!(
            ty = %self.host.type_name(ty),
            name,
            candidates = rejected.len(),
            "no compatible member"
        );
        DispatchResult::NoMatch(NoMatchError {
            type_name: self.host.type_name(ty),
            member_name: name.to_string(),
            kind,
            arg_types: args.to_vec(),
            rejected,
        })
    }

    /// [`resolve`](Self::resolve) and [`close`](Self::close), reporting
    /// exhaustion as an error.
    pub fn resolve_member(
        &self,
        ty: &Type,
        name: &str,
        kind: MemberKind,
        target: Option<&Type>,
        args: &[Option<Type>],
        expected: Option<&Type>,
    ) -> ReflectResult<Resolved> {
        match self.resolve(ty, name, kind, target, args, expected) {
            DispatchResult::Resolved(Selected { candidate, matched }) => Ok(Resolved {
                member: self.close(&candidate, &matched)?,
                candidate,
                matched,
            }),
            DispatchResult::NoMatch(err) => Err(err.into()),
        }
    }

    /// Close a matched candidate.
    ///
    /// An open declaring type is closed with the inferred type arguments and
    /// the member re-queried there by kind, name and parameter types;
    /// method-level parameters are then closed with the method arguments.
    pub fn close(&self, member: &Member, matched: &Match) -> ReflectResult<Arc<Member>> {
        let mut closed = if member.declaring.contains_params() {
            let def = member
                .declaring
                .def_id()
                .ok_or_else(|| ReflectError::CannotInfer {
                    member: member_path(self.host, member),
                })?;
            let ty = self.host.close_type(def, &matched.type_args)?;
            self.host
                .find_member(&ty, member.kind, &member.name, &matched.param_types)
                .ok_or_else(|| ReflectError::MissingMember {
                    type_name: self.host.type_name(&ty),
                    member: member.name.clone(),
                })?
        } else {
            Arc::new(member.clone())
        };
        if closed.has_open_method_params() {
            closed = self.host.close_method(&closed, &matched.method_args)?;
        }
        Ok(closed)
    }

    /// The property an override ultimately overrides: the root-most
    /// ancestor property with the same name and index parameter types.
    pub fn base_definition(&self, property: &Member) -> Arc<Member> {
        let mut current = Arc::new(property.clone());
        let mut ty = self.host.base_type(&property.declaring);
        while current.is_override {
            let Some(base) = ty else {
                break;
            };
            match self.host.find_member(&base, current.kind, &current.name, &current.params) {
                Some(found) => {
                    ty = self.host.base_type(&found.declaring);
                    current = found;
                }
                None => break,
            }
        }
        current
    }
}
