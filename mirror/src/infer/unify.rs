//! Signature unification.
//!
//! Unifies one candidate member against the runtime types of a call site:
//! receiver, arguments and (optionally) the expected result type. Every
//! generic parameter of the candidate must end up bound.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::compat::Compat;
use super::result::{Match, MatchFailure, MatchResult};
use crate::host::TypeHost;
use crate::member::{Member, MemberKind};
use crate::ty::{GenericParam, Type};

/// Bindings from generic parameters to concrete types.
///
/// Seeded parameters start unbound. The first binding of a parameter wins;
/// later occurrences are checked against it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution {
    bindings: IndexMap<GenericParam, Option<Type>>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `param` as a placeholder that must be bound.
    pub fn seed(&mut self, param: GenericParam) {
        self.bindings.entry(param).or_insert(None);
    }

    pub fn bound(&self, param: &GenericParam) -> Option<&Type> {
        self.bindings.get(param).and_then(Option::as_ref)
    }

    pub fn bind(&mut self, param: GenericParam, ty: Type) {
        self.bindings.insert(param, Some(ty));
    }

    /// The first placeholder still unbound.
    pub fn first_unbound(&self) -> Option<&GenericParam> {
        self.bindings
            .iter()
            .find(|(_, ty)| ty.is_none())
            .map(|(param, _)| param)
    }

    /// Bound types for `params`, in order; `None` if any is unbound.
    pub fn resolve(&self, params: &[GenericParam]) -> Option<Vec<Type>> {
        params.iter().map(|p| self.bound(p).cloned()).collect()
    }

    /// Bound type-level parameters as a substitution map.
    pub fn type_level(&self) -> FxHashMap<GenericParam, Type> {
        self.to_map(|param| !param.is_method_param())
    }

    /// Every bound parameter, method slots included.
    pub fn all(&self) -> FxHashMap<GenericParam, Type> {
        self.to_map(|_| true)
    }

    fn to_map(&self, keep: impl Fn(&GenericParam) -> bool) -> FxHashMap<GenericParam, Type> {
        self.bindings
            .iter()
            .filter(|(param, _)| keep(param))
            .filter_map(|(param, ty)| ty.clone().map(|ty| (param.clone(), ty)))
            .collect()
    }
}

/// What a member access expects of the member's type.
#[derive(Debug, Clone, Copy)]
enum Expect<'t> {
    /// No constraint.
    Any,
    /// The result is consumed as this type.
    Returns(&'t Type),
    /// A value of this type (`None` for null) is assigned to the member.
    Accepts(Option<&'t Type>),
}

/// Unifies candidates against call-site types.
pub struct Unifier<'a> {
    host: &'a dyn TypeHost,
}

impl<'a> Unifier<'a> {
    pub fn new(host: &'a dyn TypeHost) -> Self {
        Self { host }
    }

    /// Unify `candidate` with a receiver type, argument types (`None` for
    /// null arguments) and an expected result type. An `Object` expected
    /// type places no constraint.
    pub fn unify(
        &self,
        candidate: &Member,
        target: Option<&Type>,
        args: &[Option<Type>],
        expected_return: Option<&Type>,
    ) -> MatchResult {
        let expect = match expected_return {
            Some(ret) if !ret.is_object() => Expect::Returns(ret),
            _ => Expect::Any,
        };
        self.unify_with(candidate, target, args, expect)
    }

    /// Unify a field or property about to be assigned `value`, with index
    /// argument types for indexed properties.
    pub fn unify_assignment(
        &self,
        candidate: &Member,
        target: Option<&Type>,
        index: &[Option<Type>],
        value: Option<&Type>,
    ) -> MatchResult {
        self.unify_with(candidate, target, index, Expect::Accepts(value))
    }

    fn unify_with(
        &self,
        candidate: &Member,
        target: Option<&Type>,
        args: &[Option<Type>],
        expect: Expect<'_>,
    ) -> MatchResult {
        match self.try_unify(candidate, target, args, expect) {
            Ok(matched) => MatchResult::Matched(matched),
            Err(failure) => MatchResult::Failed(failure),
        }
    }

    fn try_unify(
        &self,
        candidate: &Member,
        target: Option<&Type>,
        args: &[Option<Type>],
        expect: Expect<'_>,
    ) -> Result<Match, MatchFailure> {
        if candidate.params.len() != args.len() {
            return Err(MatchFailure::Arity {
                expected: candidate.params.len(),
                found: args.len(),
            });
        }

        let compat = Compat::new(self.host);
        let mut subst = Substitution::new();
        let mut type_params = Vec::new();
        candidate.declaring.collect_params(&mut type_params);
        for param in type_params {
            subst.seed(param);
        }
        let method_params: &[GenericParam] = if candidate.has_open_method_params() {
            &candidate.generic_params
        } else {
            &[]
        };
        for param in method_params {
            subst.seed(param.clone());
        }

        if let Some(target) = target {
            if !candidate.is_static && candidate.kind != MemberKind::Constructor {
                compat
                    .matches(&candidate.declaring, target, false, &mut subst)
                    .map_err(MatchFailure::Receiver)?;
            }
        }

        let has_value = matches!(candidate.kind, MemberKind::Method | MemberKind::Property)
            || (candidate.kind == MemberKind::Field && matches!(expect, Expect::Accepts(_)));
        if has_value {
            match expect {
                Expect::Any => {}
                Expect::Returns(ret) => {
                    compat
                        .matches(&candidate.ty, ret, true, &mut subst)
                        .map_err(MatchFailure::ReturnType)?;
                }
                Expect::Accepts(Some(value)) => {
                    compat
                        .matches(&candidate.ty, value, false, &mut subst)
                        .map_err(MatchFailure::ReturnType)?;
                }
                Expect::Accepts(None) => {
                    if self.host.is_value_type(&candidate.ty) {
                        return Err(MatchFailure::NullToValueType {
                            position: args.len(),
                        });
                    }
                }
            }
        }

        // Null positions whose declared type may still be bound to a value
        // type by a later position.
        let mut nulls: Vec<(usize, &Type)> = Vec::new();
        if has_value && matches!(expect, Expect::Accepts(None)) && candidate.ty.contains_params() {
            nulls.push((args.len(), &candidate.ty));
        }

        let mut param_types = Vec::with_capacity(args.len());
        for (position, (declared, actual)) in candidate.params.iter().zip(args).enumerate() {
            match actual {
                None if self.host.is_value_type(declared) => {
                    return Err(MatchFailure::NullToValueType { position });
                }
                None => {
                    if declared.contains_params() {
                        nulls.push((position, declared));
                    }
                    param_types.push(declared.clone());
                }
                Some(actual) => {
                    let resolved = compat
                        .matches(declared, actual, false, &mut subst)
                        .map_err(|mismatch| MatchFailure::Argument { position, mismatch })?;
                    param_types.push(resolved);
                }
            }
        }

        if let Some(param) = subst.first_unbound() {
            return Err(MatchFailure::Unbound(param.clone()));
        }
        if !nulls.is_empty() {
            let all = subst.all();
            if let Some((position, _)) = nulls
                .iter()
                .find(|(_, declared)| self.host.is_value_type(&declared.substitute(&all)))
            {
                return Err(MatchFailure::NullToValueType {
                    position: *position,
                });
            }
        }

        let type_level = subst.type_level();
        let method_args = subst.resolve(method_params).unwrap_or_default();
        Ok(Match {
            type_args: candidate
                .declaring
                .generic_args()
                .iter()
                .map(|a| a.substitute(&type_level))
                .collect(),
            method_args,
            param_types: param_types
                .iter()
                .map(|p| p.substitute(&type_level))
                .collect(),
        })
    }
}
