//! Runtime values.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::member::Member;
use crate::ty::Type;

/// A runtime value passed to and returned from members.
#[derive(Clone)]
pub enum Value {
    Null,
    Unit,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Char(char),
    Str(Arc<str>),
    Object(ObjectRef),
    Delegate(Delegate),
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The runtime type of the value; `None` for null.
    pub fn type_of(&self) -> Option<Type> {
        Some(match self {
            Value::Null => return None,
            Value::Unit => Type::unit(),
            Value::Bool(_) => Type::bool(),
            Value::I32(_) => Type::i32(),
            Value::I64(_) => Type::i64(),
            Value::F64(_) => Type::f64(),
            Value::Char(_) => Type::char(),
            Value::Str(_) => Type::str(),
            Value::Object(obj) => obj.ty().clone(),
            Value::Delegate(_) => Type::delegate(),
        })
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Objects compare by identity, delegates by their invocation lists.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Delegate(a), Value::Delegate(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Unit => f.write_str("()"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}i64"),
            Value::F64(v) => write!(f, "{v:?}"),
            Value::Char(v) => write!(f, "{v:?}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Object(obj) => fmt::Debug::fmt(obj, f),
            Value::Delegate(d) => write!(f, "delegate[{}]", d.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v.into())
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

/// A heap object: its closed runtime type and its instance fields.
pub struct Object {
    ty: Type,
    fields: RwLock<IndexMap<String, Value>>,
}

/// Shared handle to an [`Object`].
#[derive(Clone)]
pub struct ObjectRef(Arc<Object>);

impl ObjectRef {
    pub fn new(ty: Type, fields: IndexMap<String, Value>) -> Self {
        Self(Arc::new(Object {
            ty,
            fields: RwLock::new(fields),
        }))
    }

    pub fn ty(&self) -> &Type {
        &self.0.ty
    }

    /// Read a field; `None` when the object has no such slot.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.0.fields.read().get(field).cloned()
    }

    /// Write a field, creating the slot if needed.
    pub fn set(&self, field: &str, value: Value) {
        self.0.fields.write().insert(field.to_string(), value);
    }

    /// Snapshot of all fields in declaration order.
    pub fn fields(&self) -> Vec<(String, Value)> {
        self.0
            .fields
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_map();
        for (name, value) in self.0.fields.read().iter() {
            s.entry(name, value);
        }
        s.finish()
    }
}

/// A subscribed handler: a method and the object it is bound to.
#[derive(Clone)]
pub struct Handler {
    pub target: Option<Value>,
    pub method: Arc<Member>,
}

impl Handler {
    pub fn new(target: Option<Value>, method: Arc<Member>) -> Self {
        Self { target, method }
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.method.id == other.method.id
            && self.method.method_args == other.method.method_args
            && self.target == other.target
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("method", &self.method.name)
            .field("target", &self.target)
            .finish()
    }
}

/// An immutable multicast delegate: handlers in subscription order.
#[derive(Clone, Debug, PartialEq)]
pub struct Delegate {
    handlers: Arc<[Handler]>,
}

impl Delegate {
    pub fn single(handler: Handler) -> Self {
        Self {
            handlers: Arc::from(vec![handler]),
        }
    }

    /// Append a handler, producing a new delegate.
    pub fn combine(existing: Option<&Delegate>, handler: Handler) -> Self {
        let Some(existing) = existing else {
            return Self::single(handler);
        };
        let mut handlers = existing.handlers.to_vec();
        handlers.push(handler);
        Self {
            handlers: Arc::from(handlers),
        }
    }

    /// Remove the last matching handler; `None` when nothing is left.
    pub fn remove(&self, handler: &Handler) -> Option<Self> {
        let mut handlers = self.handlers.to_vec();
        if let Some(pos) = handlers.iter().rposition(|h| h == handler) {
            handlers.remove(pos);
        }
        if handlers.is_empty() {
            None
        } else {
            Some(Self {
                handlers: Arc::from(handlers),
            })
        }
    }

    /// The invocation list.
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Rust types that can name their descriptor and be read back from a value.
///
/// Used by the typed entry points: the descriptor becomes the expected
/// result type during resolution.
pub trait Reflected: Sized {
    /// Descriptor of the expected type; `Object` accepts anything.
    fn static_type() -> Type;

    fn from_value(value: Value) -> Option<Self>;
}

impl Reflected for Value {
    fn static_type() -> Type {
        Type::object()
    }

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl Reflected for () {
    fn static_type() -> Type {
        Type::object()
    }

    fn from_value(_: Value) -> Option<Self> {
        Some(())
    }
}

impl Reflected for bool {
    fn static_type() -> Type {
        Type::bool()
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl Reflected for i32 {
    fn static_type() -> Type {
        Type::i32()
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_i32()
    }
}

impl Reflected for i64 {
    fn static_type() -> Type {
        Type::i64()
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::I64(v) => Some(v),
            _ => None,
        }
    }
}

impl Reflected for f64 {
    fn static_type() -> Type {
        Type::f64()
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::F64(v) => Some(v),
            _ => None,
        }
    }
}

impl Reflected for char {
    fn static_type() -> Type {
        Type::char()
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Char(v) => Some(v),
            _ => None,
        }
    }
}

impl Reflected for String {
    fn static_type() -> Type {
        Type::str()
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl Reflected for ObjectRef {
    fn static_type() -> Type {
        Type::object()
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

/// `None` stands for a null reference.
impl<T: Reflected> Reflected for Option<T> {
    fn static_type() -> Type {
        T::static_type()
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}
