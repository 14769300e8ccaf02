//! Builders for registering types and members.
//!
//! ```
//! use mirror::host::{DefKind, Registry};
//! use mirror::ty::Type;
//! use mirror::value::Value;
//!
//! let mut reg = Registry::new();
//! let mut calc = reg.define("Calculator", DefKind::Class);
//! calc.ctor().body(|_| Ok(Value::Unit)).add();
//! calc.method("Add")
//!     .params([Type::i32(), Type::i32()])
//!     .returns(Type::i32())
//!     .body(|f| Ok(Value::I32(f.arg(0).as_i32().unwrap_or(0) + f.arg(1).as_i32().unwrap_or(0))))
//!     .add();
//! ```

use std::sync::Arc;

use super::registry::{type_param, Registry};
use crate::error::Fault;
use crate::member::{Body, Frame, Member, MemberId, MemberKind, Visibility};
use crate::ty::{DefId, GenericParam, ParamOwner, Type};
use crate::value::Value;

/// Adds generic parameters, supertypes and members to one definition.
pub struct TypeBuilder<'r> {
    reg: &'r mut Registry,
    id: DefId,
}

impl<'r> TypeBuilder<'r> {
    pub(super) fn new(reg: &'r mut Registry, id: DefId) -> Self {
        Self { reg, id }
    }

    pub fn id(&self) -> DefId {
        self.id
    }

    /// The definition applied to its own parameters.
    pub fn open_type(&self) -> Type {
        self.reg.def(self.id).open_type()
    }

    /// Declare the next type-level generic parameter.
    pub fn generic(&mut self, name: &str) -> Type {
        let def = self.reg.def_mut(self.id);
        let param = type_param(self.id, def.generic_params.len() as u32, name);
        def.generic_params.push(param.clone());
        Type::param(param)
    }

    pub fn base(&mut self, base: Type) -> &mut Self {
        self.reg.def_mut(self.id).base = Some(base);
        self
    }

    pub fn implements(&mut self, iface: Type) -> &mut Self {
        self.reg.def_mut(self.id).interfaces.push(iface);
        self
    }

    fn member(&mut self, name: &str, kind: MemberKind, ty: Type, body: Body) -> MemberBuilder<'_, 'r> {
        let def = self.reg.def(self.id);
        let id = MemberId {
            def: self.id,
            index: def.members.len() as u32,
        };
        let member = Member {
            id,
            name: name.to_string(),
            kind,
            declaring: def.open_type(),
            params: Vec::new(),
            ty,
            generic_params: Vec::new(),
            method_args: Vec::new(),
            visibility: Visibility::Public,
            is_static: false,
            is_override: false,
            body,
        };
        MemberBuilder {
            owner: self,
            member,
        }
    }

    pub fn ctor(&mut self) -> MemberBuilder<'_, 'r> {
        self.member("new", MemberKind::Constructor, Type::unit(), Body::Field)
    }

    pub fn method(&mut self, name: &str) -> MemberBuilder<'_, 'r> {
        self.member(name, MemberKind::Method, Type::unit(), Body::Field)
    }

    pub fn field(&mut self, name: &str, ty: Type) -> MemberBuilder<'_, 'r> {
        self.member(name, MemberKind::Field, ty, Body::Field)
    }

    pub fn property(&mut self, name: &str, ty: Type) -> MemberBuilder<'_, 'r> {
        let body = Body::Property {
            getter: None,
            setter: None,
        };
        self.member(name, MemberKind::Property, ty, body)
    }

    /// An event plus the delegate field (of the same name) that stores its
    /// subscribers.
    pub fn event(&mut self, name: &str) -> MemberId {
        self.field(name, Type::delegate())
            .visibility(Visibility::Private)
            .add();
        let body = Body::Event {
            field: name.to_string(),
        };
        self.member(name, MemberKind::Event, Type::delegate(), body).add()
    }
}

/// Describes one member; [`MemberBuilder::add`] registers it.
pub struct MemberBuilder<'t, 'r> {
    owner: &'t mut TypeBuilder<'r>,
    member: Member,
}

impl MemberBuilder<'_, '_> {
    pub fn id(&self) -> MemberId {
        self.member.id
    }

    /// Declare the next method-level generic parameter.
    pub fn generic(&mut self, name: &str) -> Type {
        let index = self.member.generic_params.len() as u32;
        let param = GenericParam::new(ParamOwner::Method(self.member.id), index, name);
        self.member.generic_params.push(param.clone());
        Type::param(param)
    }

    pub fn param(&mut self, ty: Type) -> &mut Self {
        self.member.params.push(ty);
        self
    }

    pub fn params(&mut self, tys: impl IntoIterator<Item = Type>) -> &mut Self {
        self.member.params.extend(tys);
        self
    }

    pub fn returns(&mut self, ty: Type) -> &mut Self {
        self.member.ty = ty;
        self
    }

    pub fn visibility(&mut self, visibility: Visibility) -> &mut Self {
        self.member.visibility = visibility;
        self
    }

    pub fn as_static(&mut self) -> &mut Self {
        self.member.is_static = true;
        self
    }

    pub fn overrides(&mut self) -> &mut Self {
        self.member.is_override = true;
        self
    }

    /// Implementation of a method or constructor.
    pub fn body<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Frame<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        self.member.body = Body::Native(Arc::new(f));
        self
    }

    pub fn getter<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Frame<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        if let Body::Property { getter, .. } = &mut self.member.body {
            *getter = Some(Arc::new(f));
        }
        self
    }

    pub fn setter<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Frame<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        if let Body::Property { setter, .. } = &mut self.member.body {
            *setter = Some(Arc::new(f));
        }
        self
    }

    /// Register the member on its type.
    pub fn add(&mut self) -> MemberId {
        let member = self.member.clone();
        let id = member.id;
        self.owner.reg.def_mut(id.def).members.push(Arc::new(member));
        id
    }
}
