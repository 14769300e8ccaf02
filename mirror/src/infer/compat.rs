//! Type compatibility with generic parameter binding.
//!
//! Decides whether an actual type can be supplied where a declared type is
//! expected, binding the declared type's generic parameters along the way:
//!
//! ```text
//! matches(T,         i32)        => T = i32, resolved i32
//! matches(List<T>,   IntList)    => IntList : List<i32>, T = i32, resolved List<i32>
//! matches(T,         str) [T=i32] => conflict
//! matches(Animal,    Dog)        => Dog <: Animal, resolved Animal
//! matches(Dog,       Animal) [contravariant] => Dog <: Animal, resolved Dog
//! matches(List<T>,   List<Dog>) [T=Animal] => conflict
//! ```
//!
//! Type arguments of a constructed generic are invariant: nested positions
//! must match their binding exactly.

use super::result::Mismatch;
use super::unify::Substitution;
use crate::host::TypeHost;
use crate::ty::{Type, TypeKind};

/// Compatibility checks against a host's type lattice.
pub struct Compat<'a> {
    host: &'a dyn TypeHost,
}

impl<'a> Compat<'a> {
    pub fn new(host: &'a dyn TypeHost) -> Self {
        Self { host }
    }

    /// Check `actual` against `declared`, returning the resolved declared
    /// type.
    ///
    /// `contravariant` reverses the assignability direction for declared
    /// types without generic parameters; it is used for return types.
    pub fn matches(
        &self,
        declared: &Type,
        actual: &Type,
        contravariant: bool,
        subst: &mut Substitution,
    ) -> Result<Type, Mismatch> {
        if declared.contains_params() {
            return self.map_generic(declared, actual, false, subst);
        }
        let ok = if contravariant {
            self.host.is_assignable(declared, actual)
        } else {
            self.host.is_assignable(actual, declared)
        };
        if ok {
            Ok(declared.clone())
        } else {
            Err(Mismatch::NotAssignable {
                declared: declared.clone(),
                actual: actual.clone(),
            })
        }
    }

    /// Like [`Compat::matches`] for a type argument of a constructed generic.
    fn matches_nested(
        &self,
        declared: &Type,
        actual: &Type,
        subst: &mut Substitution,
    ) -> Result<Type, Mismatch> {
        if declared.contains_params() {
            self.map_generic(declared, actual, true, subst)
        } else if declared == actual {
            Ok(declared.clone())
        } else {
            Err(Mismatch::NotAssignable {
                declared: declared.clone(),
                actual: actual.clone(),
            })
        }
    }

    fn map_generic(
        &self,
        declared: &Type,
        actual: &Type,
        nested: bool,
        subst: &mut Substitution,
    ) -> Result<Type, Mismatch> {
        match declared.kind() {
            TypeKind::Param(param) => {
                // Method slots stay in the signature; the method is closed
                // with its own arguments later.
                let resolved = |bound: &Type| {
                    if param.is_method_param() {
                        declared.clone()
                    } else {
                        bound.clone()
                    }
                };
                match subst.bound(param) {
                    None => {
                        subst.bind(param.clone(), actual.clone());
                        Ok(resolved(actual))
                    }
                    Some(bound) if bound == actual => Ok(resolved(bound)),
                    Some(bound) if !nested && self.host.is_assignable(actual, bound) => {
                        Ok(resolved(bound))
                    }
                    Some(bound) => Err(Mismatch::Conflict {
                        param: param.clone(),
                        bound: bound.clone(),
                        found: actual.clone(),
                    }),
                }
            }
            TypeKind::Adt { def, args } => {
                if nested && actual.def_id() != Some(*def) {
                    return Err(Mismatch::NotAssignable {
                        declared: declared.clone(),
                        actual: actual.clone(),
                    });
                }
                let actual_args = self.host.find_instantiation(actual, *def).ok_or_else(|| {
                    Mismatch::NotInstanceOf {
                        def: *def,
                        actual: actual.clone(),
                    }
                })?;
                let mut resolved = Vec::with_capacity(args.len());
                for (declared_arg, actual_arg) in args.iter().zip(&actual_args) {
                    resolved.push(self.matches_nested(declared_arg, actual_arg, subst)?);
                }
                Ok(declared.with_args(resolved))
            }
            _ => Err(Mismatch::NotAssignable {
                declared: declared.clone(),
                actual: actual.clone(),
            }),
        }
    }
}
