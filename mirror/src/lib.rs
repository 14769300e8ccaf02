//! Reflective member resolution and generic argument inference.
//!
//! Given a type, a member name and a list of runtime argument values,
//! `mirror` picks the first member whose signature fits, infers the generic
//! arguments that make it fit, closes the member and invokes it. Failures
//! raised inside the invoked member reach the caller exactly as raised.
//!
//! # Architecture
//!
//! ```text
//! Invoker ──► MemberResolver ──► Unifier ──► Compat
//!    │                                          │
//!    └────────────────► TypeHost ◄──────────────┘
//!                       (Registry)
//! ```
//!
//! - [`ty`]: open and closed type descriptors
//! - [`member`]: member descriptors and binding flags
//! - [`value`]: runtime values, objects and delegates
//! - [`host`]: the introspection seam and the in-crate [`host::Registry`]
//! - [`infer`]: compatibility, unification and resolution
//! - [`invoke`]: the public entry points
//!
//! # Example
//!
//! ```
//! use mirror::host::{DefKind, Registry};
//! use mirror::invoke::Invoker;
//! use mirror::ty::Type;
//! use mirror::value::Value;
//!
//! let mut reg = Registry::new();
//! let mut boxed = reg.define("Box", DefKind::Class);
//! let t = boxed.generic("T");
//! boxed
//!     .ctor()
//!     .param(t.clone())
//!     .body(|f| {
//!         f.this()?.set("value", f.arg(0).clone());
//!         Ok(Value::Unit)
//!     })
//!     .add();
//! boxed.field("value", t).add();
//! let box_ty = boxed.open_type();
//!
//! let invoker = Invoker::new(&reg);
//! let b = invoker.construct(&box_ty, &[42.into()]).unwrap();
//! let ty = b.type_of().unwrap();
//! assert_eq!(ty.generic_args(), &[Type::i32()]);
//! assert_eq!(invoker.get_field::<i32>(Some(&b), "value").unwrap(), 42);
//! ```

pub mod config;
pub mod error;
pub mod guard;
pub mod host;
pub mod infer;
pub mod invoke;
pub mod member;
pub mod ty;
pub mod value;

pub use config::Config;
pub use error::{Fault, ReflectError, ReflectResult};
pub use host::{Registry, TypeHost};
pub use infer::MemberResolver;
pub use invoke::Invoker;
pub use member::{BindingFlags, Member, MemberKind};
pub use ty::Type;
pub use value::{Reflected, Value};
