//! Member descriptors.
//!
//! A [`Member`] describes a constructor, method, field, property or event
//! of a type. Members of a generic definition are stored open; the host
//! hands out copies substituted for a particular constructed type, and the
//! engine closes method-level parameters with [`Member::close_method`].

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::error::Fault;
use crate::host::TypeHost;
use crate::ty::{substitution_of, DefId, GenericParam, Type};
use crate::value::{ObjectRef, Value};

/// Identifies a member: its defining type and position in declaration order.
///
/// The id is shared by a member's open and closed forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId {
    pub def: DefId,
    pub index: u32,
}

/// The kind of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Constructor,
    Method,
    Field,
    Property,
    Event,
}

impl MemberKind {
    /// Methods and constructors are reported as missing methods.
    pub fn is_callable(self) -> bool {
        matches!(self, MemberKind::Constructor | MemberKind::Method)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

bitflags! {
    /// Which members an enumeration admits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindingFlags: u8 {
        const PUBLIC = 1 << 0;
        const NON_PUBLIC = 1 << 1;
        const INSTANCE = 1 << 2;
        const STATIC = 1 << 3;
        const ALL = Self::PUBLIC.bits()
            | Self::NON_PUBLIC.bits()
            | Self::INSTANCE.bits()
            | Self::STATIC.bits();
    }
}

impl Default for BindingFlags {
    fn default() -> Self {
        BindingFlags::ALL
    }
}

impl BindingFlags {
    /// Whether a member passes both the visibility and the static filter.
    pub fn admits(self, member: &Member) -> bool {
        let visible = match member.visibility {
            Visibility::Public => self.contains(BindingFlags::PUBLIC),
            Visibility::Protected | Visibility::Private => {
                self.contains(BindingFlags::NON_PUBLIC)
            }
        };
        let binding = if member.is_static {
            self.contains(BindingFlags::STATIC)
        } else {
            self.contains(BindingFlags::INSTANCE)
        };
        visible && binding
    }
}

/// Native implementation of a method, constructor or accessor.
pub type NativeFn = dyn Fn(&Frame<'_>) -> Result<Value, Fault> + Send + Sync;

/// What executing a member does.
#[derive(Clone)]
pub enum Body {
    /// Methods and constructors. Constructors receive the new object as
    /// their target.
    Native(Arc<NativeFn>),
    /// Storage slot on the object (or the type, when static).
    Field,
    /// Accessor pair; setters receive the value as their last argument.
    Property {
        getter: Option<Arc<NativeFn>>,
        setter: Option<Arc<NativeFn>>,
    },
    /// An event whose subscribers live in a delegate field.
    Event { field: String },
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Native(_) => f.write_str("Native"),
            Body::Field => f.write_str("Field"),
            Body::Property { getter, setter } => f
                .debug_struct("Property")
                .field("get", &getter.is_some())
                .field("set", &setter.is_some())
                .finish(),
            Body::Event { field } => f.debug_struct("Event").field("field", field).finish(),
        }
    }
}

/// A member descriptor.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub kind: MemberKind,
    /// Declaring type; open while it still carries its own parameters.
    pub declaring: Type,
    /// Parameters, or index parameters for properties.
    pub params: Vec<Type>,
    /// Return type of methods, value type of fields and properties.
    pub ty: Type,
    /// Method-level generic parameter slots.
    pub generic_params: Vec<GenericParam>,
    /// Method-level arguments once closed.
    pub method_args: Vec<Type>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_override: bool,
    pub body: Body,
}

impl Member {
    /// Whether method-level slots are still unbound.
    pub fn has_open_method_params(&self) -> bool {
        !self.generic_params.is_empty() && self.method_args.is_empty()
    }

    /// Whether the member still carries unbound type- or method-level
    /// parameters.
    pub fn is_open(&self) -> bool {
        self.declaring.contains_params()
            || self.has_open_method_params()
            || self.params.iter().any(Type::contains_params)
            || self.ty.contains_params()
    }

    /// Parameter types in declaration order.
    pub fn parameter_types(&self) -> &[Type] {
        &self.params
    }

    /// Index parameter types of a property; empty for other kinds.
    pub fn index_parameter_types(&self) -> &[Type] {
        match self.kind {
            MemberKind::Property => &self.params,
            _ => &[],
        }
    }

    /// Copy of this member with parameters substituted, as seen from a
    /// constructed declaring type.
    pub fn instantiate(&self, declaring: Type, subst: &FxHashMap<GenericParam, Type>) -> Member {
        Member {
            declaring,
            params: self.params.iter().map(|p| p.substitute(subst)).collect(),
            ty: self.ty.substitute(subst),
            method_args: self.method_args.iter().map(|a| a.substitute(subst)).collect(),
            ..self.clone()
        }
    }

    /// Close the method-level parameters.
    pub fn close_method(&self, args: &[Type]) -> Member {
        let subst = substitution_of(&self.generic_params, args);
        Member {
            params: self.params.iter().map(|p| p.substitute(&subst)).collect(),
            ty: self.ty.substitute(&subst),
            method_args: args.to_vec(),
            ..self.clone()
        }
    }
}

static NULL: Value = Value::Null;

/// Everything a native body can see while running.
pub struct Frame<'a> {
    pub host: &'a dyn TypeHost,
    pub member: &'a Member,
    pub target: Option<&'a Value>,
    pub args: &'a [Value],
}

impl<'a> Frame<'a> {
    /// The receiver object.
    pub fn this(&self) -> Result<&'a ObjectRef, Fault> {
        match self.target {
            Some(Value::Object(obj)) => Ok(obj),
            _ => Err(Fault::new(
                "NullReference",
                format!("'{}' requires an object target", self.member.name),
            )),
        }
    }

    /// Argument at `index`; `Null` when out of range.
    pub fn arg(&self, index: usize) -> &'a Value {
        self.args.get(index).unwrap_or(&NULL)
    }

    /// Type arguments of the closed declaring type.
    pub fn type_args(&self) -> &'a [Type] {
        self.member.declaring.generic_args()
    }

    /// Arguments of a closed generic method.
    pub fn method_args(&self) -> &'a [Type] {
        &self.member.method_args
    }
}
