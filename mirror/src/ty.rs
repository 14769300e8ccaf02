//! Type descriptors.
//!
//! A [`Type`] is a cheap handle over a [`TypeKind`]. Generic definitions are
//! represented as `Adt` types whose arguments are the definition's own
//! [`GenericParam`]s; constructed types carry concrete arguments. Whether a
//! type is open or closed is therefore a structural property
//! ([`Type::contains_params`]) rather than a runtime capability.
//!
//! Assignability and value-type queries need the type definitions, so they
//! live on the host (see [`crate::host::TypeHost`]).

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::member::MemberId;

/// Identifies a type definition registered with a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId {
    pub index: u32,
}

impl DefId {
    pub fn new(index: u32) -> Self {
        Self { index }
    }
}

/// The owner of a generic parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamOwner {
    /// Declared on a generic type definition.
    Type(DefId),
    /// Declared on a generic method.
    Method(MemberId),
}

/// An unbound generic parameter.
///
/// Identity is `(owner, index)`; the name is carried for display only.
#[derive(Debug, Clone)]
pub struct GenericParam {
    pub owner: ParamOwner,
    pub index: u32,
    pub name: Arc<str>,
}

impl GenericParam {
    pub fn new(owner: ParamOwner, index: u32, name: impl Into<Arc<str>>) -> Self {
        Self {
            owner,
            index,
            name: name.into(),
        }
    }

    /// Whether this slot belongs to a method rather than a type.
    pub fn is_method_param(&self) -> bool {
        matches!(self.owner, ParamOwner::Method(_))
    }
}

impl PartialEq for GenericParam {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.index == other.index
    }
}

impl Eq for GenericParam {}

impl std::hash::Hash for GenericParam {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.index.hash(state);
    }
}

/// Built-in primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTy {
    Bool,
    I32,
    I64,
    F64,
    Char,
    Str,
    Unit,
}

impl PrimitiveTy {
    /// Everything but `str` is stored inline and cannot be null.
    pub fn is_value_type(self) -> bool {
        !matches!(self, PrimitiveTy::Str)
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveTy::Bool => "bool",
            PrimitiveTy::I32 => "i32",
            PrimitiveTy::I64 => "i64",
            PrimitiveTy::F64 => "f64",
            PrimitiveTy::Char => "char",
            PrimitiveTy::Str => "str",
            PrimitiveTy::Unit => "unit",
        }
    }
}

/// The structure of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive(PrimitiveTy),
    /// Root reference type; everything is assignable to it.
    Object,
    /// Multicast delegate values.
    Delegate,
    /// A registered class, struct or interface, possibly generic.
    Adt { def: DefId, args: Vec<Type> },
    /// An unbound generic parameter.
    Param(GenericParam),
}

/// A type descriptor.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub kind: Arc<TypeKind>,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Self { kind: Arc::new(kind) }
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn bool() -> Self {
        Self::new(TypeKind::Primitive(PrimitiveTy::Bool))
    }

    pub fn i32() -> Self {
        Self::new(TypeKind::Primitive(PrimitiveTy::I32))
    }

    pub fn i64() -> Self {
        Self::new(TypeKind::Primitive(PrimitiveTy::I64))
    }

    pub fn f64() -> Self {
        Self::new(TypeKind::Primitive(PrimitiveTy::F64))
    }

    pub fn char() -> Self {
        Self::new(TypeKind::Primitive(PrimitiveTy::Char))
    }

    pub fn str() -> Self {
        Self::new(TypeKind::Primitive(PrimitiveTy::Str))
    }

    pub fn unit() -> Self {
        Self::new(TypeKind::Primitive(PrimitiveTy::Unit))
    }

    pub fn object() -> Self {
        Self::new(TypeKind::Object)
    }

    pub fn delegate() -> Self {
        Self::new(TypeKind::Delegate)
    }

    pub fn adt(def: DefId, args: Vec<Type>) -> Self {
        Self::new(TypeKind::Adt { def, args })
    }

    pub fn param(param: GenericParam) -> Self {
        Self::new(TypeKind::Param(param))
    }

    /// Whether this is the "any" type.
    pub fn is_object(&self) -> bool {
        matches!(self.kind(), TypeKind::Object)
    }

    /// Whether this is itself an unbound generic parameter.
    pub fn is_param(&self) -> bool {
        matches!(self.kind(), TypeKind::Param(_))
    }

    pub fn as_param(&self) -> Option<&GenericParam> {
        match self.kind() {
            TypeKind::Param(p) => Some(p),
            _ => None,
        }
    }

    /// The definition of an `Adt` type.
    pub fn def_id(&self) -> Option<DefId> {
        match self.kind() {
            TypeKind::Adt { def, .. } => Some(*def),
            _ => None,
        }
    }

    /// Generic arguments of a constructed type; empty otherwise.
    pub fn generic_args(&self) -> &[Type] {
        match self.kind() {
            TypeKind::Adt { args, .. } => args,
            _ => &[],
        }
    }

    /// Whether any unbound generic parameter occurs in this type.
    pub fn contains_params(&self) -> bool {
        match self.kind() {
            TypeKind::Param(_) => true,
            TypeKind::Adt { args, .. } => args.iter().any(Type::contains_params),
            _ => false,
        }
    }

    /// Collect every generic parameter occurring in this type, in order of
    /// first appearance.
    pub fn collect_params(&self, out: &mut Vec<GenericParam>) {
        match self.kind() {
            TypeKind::Param(p) => {
                if !out.contains(p) {
                    out.push(p.clone());
                }
            }
            TypeKind::Adt { args, .. } => {
                for arg in args {
                    arg.collect_params(out);
                }
            }
            _ => {}
        }
    }

    /// Replace generic parameters that have an entry in `subst`.
    pub fn substitute(&self, subst: &FxHashMap<GenericParam, Type>) -> Type {
        if subst.is_empty() || !self.contains_params() {
            return self.clone();
        }
        match self.kind() {
            TypeKind::Param(p) => subst.get(p).cloned().unwrap_or_else(|| self.clone()),
            TypeKind::Adt { def, args } => Type::adt(
                *def,
                args.iter().map(|a| a.substitute(subst)).collect(),
            ),
            _ => self.clone(),
        }
    }

    /// Rebuild this `Adt` type with different arguments.
    pub fn with_args(&self, args: Vec<Type>) -> Type {
        match self.kind() {
            TypeKind::Adt { def, .. } => Type::adt(*def, args),
            _ => self.clone(),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.kind(), f)
    }
}

/// Build a substitution map from parallel parameter and argument lists.
pub fn substitution_of(params: &[GenericParam], args: &[Type]) -> FxHashMap<GenericParam, Type> {
    params.iter().cloned().zip(args.iter().cloned()).collect()
}
