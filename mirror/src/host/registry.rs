//! In-crate type host.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use super::builder::TypeBuilder;
use super::{member_path, Call, TypeHost};
use crate::error::{ReflectError, ReflectResult};
use crate::member::{BindingFlags, Body, Frame, Member, MemberKind, NativeFn, Visibility};
use crate::ty::{substitution_of, DefId, GenericParam, ParamOwner, PrimitiveTy, Type, TypeKind};
use crate::value::Value;

/// What sort of type a definition declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    Class,
    /// Value type: never null.
    Struct,
    Interface,
}

/// A registered type definition.
#[derive(Debug)]
pub struct TypeDef {
    pub id: DefId,
    pub name: String,
    pub kind: DefKind,
    pub generic_params: Vec<GenericParam>,
    /// Base class, written in terms of this definition's parameters.
    pub base: Option<Type>,
    pub interfaces: Vec<Type>,
    /// Open members in declaration order.
    pub members: Vec<Arc<Member>>,
}

impl TypeDef {
    /// The definition applied to its own parameters.
    pub fn open_type(&self) -> Type {
        Type::adt(
            self.id,
            self.generic_params.iter().cloned().map(Type::param).collect(),
        )
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

/// A table of type definitions plus static field storage.
#[derive(Debug, Default)]
pub struct Registry {
    defs: Vec<TypeDef>,
    by_name: FxHashMap<String, DefId>,
    statics: RwLock<FxHashMap<(Type, String), Value>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new type definition and start adding to it.
    pub fn define(&mut self, name: &str, kind: DefKind) -> TypeBuilder<'_> {
        let id = DefId::new(self.defs.len() as u32);
        self.defs.push(TypeDef {
            id,
            name: name.to_string(),
            kind,
            generic_params: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            members: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        TypeBuilder::new(self, id)
    }

    /// Continue adding to an existing definition.
    pub fn edit(&mut self, id: DefId) -> TypeBuilder<'_> {
        TypeBuilder::new(self, id)
    }

    pub fn def(&self, id: DefId) -> &TypeDef {
        &self.defs[id.index as usize]
    }

    pub(crate) fn def_mut(&mut self, id: DefId) -> &mut TypeDef {
        &mut self.defs[id.index as usize]
    }

    /// Look a definition up by its (unqualified) name.
    pub fn find(&self, name: &str) -> Option<&TypeDef> {
        self.by_name.get(name).map(|id| self.def(*id))
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.defs.iter()
    }

    fn subst_for(&self, ty: &Type) -> Option<(&TypeDef, FxHashMap<GenericParam, Type>)> {
        match ty.kind() {
            TypeKind::Adt { def, args } => {
                let def = self.def(*def);
                Some((def, substitution_of(&def.generic_params, args)))
            }
            _ => None,
        }
    }

    /// `ty` followed by every base class and interface it reaches.
    fn supertypes(&self, ty: &Type) -> Vec<Type> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![ty.clone()];
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some((def, subst)) = self.subst_for(&current) {
                for iface in def.interfaces.iter().rev() {
                    stack.push(iface.substitute(&subst));
                }
                if let Some(base) = &def.base {
                    stack.push(base.substitute(&subst));
                }
            }
            out.push(current);
        }
        out
    }

    fn default_value(&self, ty: &Type) -> Value {
        match ty.kind() {
            TypeKind::Primitive(PrimitiveTy::Bool) => Value::Bool(false),
            TypeKind::Primitive(PrimitiveTy::I32) => Value::I32(0),
            TypeKind::Primitive(PrimitiveTy::I64) => Value::I64(0),
            TypeKind::Primitive(PrimitiveTy::F64) => Value::F64(0.0),
            TypeKind::Primitive(PrimitiveTy::Char) => Value::Char('\0'),
            TypeKind::Primitive(PrimitiveTy::Unit) => Value::Unit,
            _ => Value::Null,
        }
    }

    /// Instance field slots for a new object of `ty`, base fields first.
    fn field_slots(&self, ty: &Type) -> IndexMap<String, Value> {
        let mut chain = Vec::new();
        let mut current = Some(ty.clone());
        while let Some(t) = current {
            current = self.base_type(&t);
            chain.push(t);
        }
        let mut fields = IndexMap::new();
        for t in chain.iter().rev() {
            let Some((def, subst)) = self.subst_for(t) else {
                continue;
            };
            for m in &def.members {
                if m.kind == MemberKind::Field && !m.is_static {
                    fields.insert(m.name.clone(), self.default_value(&m.ty.substitute(&subst)));
                }
            }
        }
        fields
    }

    fn check_closed(&self, member: &Member) -> ReflectResult<()> {
        if member.is_open() {
            return Err(ReflectError::CannotInfer {
                member: member_path(self, member),
            });
        }
        Ok(())
    }

    fn check_args(&self, member: &Member, args: &[Value]) -> ReflectResult<()> {
        if member.params.len() != args.len() {
            return Err(ReflectError::ArgumentCount {
                member: member_path(self, member),
                expected: member.params.len(),
                found: args.len(),
            });
        }
        for (param, arg) in member.params.iter().zip(args) {
            self.check_value(param, arg)?;
        }
        Ok(())
    }

    fn check_value(&self, declared: &Type, value: &Value) -> ReflectResult<()> {
        let ok = match value.type_of() {
            None => !self.is_value_type(declared),
            Some(actual) => self.is_assignable(&actual, declared),
        };
        if ok {
            return Ok(());
        }
        Err(ReflectError::InvalidCast {
            expected: self.type_name(declared),
            found: value
                .type_of()
                .map(|t| self.type_name(&t))
                .unwrap_or_else(|| "null".to_string()),
        })
    }

    /// Validate the receiver for an instance member.
    fn check_target<'v>(
        &self,
        member: &Member,
        target: Option<&'v Value>,
    ) -> ReflectResult<Option<&'v Value>> {
        if member.is_static {
            return Ok(None);
        }
        let target = match target {
            Some(v) if !v.is_null() => v,
            _ => return Err(ReflectError::MemberAccess(member_path(self, member))),
        };
        let actual = target.type_of().unwrap_or_else(Type::object);
        if !self.is_assignable(&actual, &member.declaring) {
            return Err(ReflectError::TargetMismatch {
                expected: self.type_name(&member.declaring),
                found: self.type_name(&actual),
            });
        }
        Ok(Some(target))
    }

    /// Run a native body, wrapping any fault in one invocation layer.
    fn run(
        &self,
        body: &NativeFn,
        member: &Member,
        target: Option<&Value>,
        args: &[Value],
    ) -> ReflectResult<Value> {
        let frame = Frame {
            host: self,
            member,
            target,
            args,
        };
        body(&frame).map_err(|mut fault| {
            let path = member_path(self, member);
            fault.push_frame(path.clone());
            trace!(member = %path, fault = %fault, "member body failed");
            ReflectError::TargetInvocation { member: path, fault }
        })
    }

    fn static_key(&self, member: &Member) -> (Type, String) {
        (member.declaring.clone(), member.name.clone())
    }

    fn read_field(&self, member: &Member, target: Option<&Value>) -> ReflectResult<Value> {
        if member.is_static {
            let key = self.static_key(member);
            let value = self.statics.read().get(&key).cloned();
            return Ok(value.unwrap_or_else(|| self.default_value(&member.ty)));
        }
        let obj = target
            .and_then(Value::as_object)
            .ok_or_else(|| ReflectError::MemberAccess(member_path(self, member)))?;
        Ok(obj
            .get(&member.name)
            .unwrap_or_else(|| self.default_value(&member.ty)))
    }

    fn write_field(&self, member: &Member, target: Option<&Value>, value: Value) -> ReflectResult<()> {
        self.check_value(&member.ty, &value)?;
        if member.is_static {
            self.statics.write().insert(self.static_key(member), value);
            return Ok(());
        }
        let obj = target
            .and_then(Value::as_object)
            .ok_or_else(|| ReflectError::MemberAccess(member_path(self, member)))?;
        obj.set(&member.name, value);
        Ok(())
    }
}

impl TypeHost for Registry {
    fn type_name(&self, ty: &Type) -> String {
        match ty.kind() {
            TypeKind::Primitive(p) => p.name().to_string(),
            TypeKind::Object => "object".to_string(),
            TypeKind::Delegate => "delegate".to_string(),
            TypeKind::Param(p) => p.name.to_string(),
            TypeKind::Adt { def, args } => {
                let name = &self.def(*def).name;
                if args.is_empty() {
                    name.clone()
                } else {
                    let args: Vec<String> = args.iter().map(|a| self.type_name(a)).collect();
                    format!("{}<{}>", name, args.join(", "))
                }
            }
        }
    }

    fn is_value_type(&self, ty: &Type) -> bool {
        match ty.kind() {
            TypeKind::Primitive(p) => p.is_value_type(),
            TypeKind::Adt { def, .. } => self.def(*def).kind == DefKind::Struct,
            TypeKind::Object | TypeKind::Delegate | TypeKind::Param(_) => false,
        }
    }

    fn base_type(&self, ty: &Type) -> Option<Type> {
        let (def, subst) = self.subst_for(ty)?;
        def.base.as_ref().map(|b| b.substitute(&subst))
    }

    fn is_assignable(&self, actual: &Type, declared: &Type) -> bool {
        if actual == declared || declared.is_object() {
            return true;
        }
        match declared.kind() {
            TypeKind::Adt { .. } => self.supertypes(actual).iter().any(|t| t == declared),
            _ => false,
        }
    }

    fn find_instantiation(&self, actual: &Type, def: DefId) -> Option<Vec<Type>> {
        self.supertypes(actual)
            .into_iter()
            .find(|t| t.def_id() == Some(def))
            .map(|t| t.generic_args().to_vec())
    }

    fn members(&self, ty: &Type, name: &str, flags: BindingFlags) -> Vec<Arc<Member>> {
        let mut out = Vec::new();
        let mut current = Some(ty.clone());
        let mut own = true;
        while let Some(t) = current {
            let Some((def, subst)) = self.subst_for(&t) else {
                break;
            };
            for m in &def.members {
                if m.name != name || m.kind == MemberKind::Constructor || !flags.admits(m) {
                    continue;
                }
                if !own && m.visibility == Visibility::Private {
                    continue;
                }
                out.push(Arc::new(m.instantiate(t.clone(), &subst)));
            }
            own = false;
            current = self.base_type(&t);
        }
        out
    }

    fn constructors(&self, ty: &Type, flags: BindingFlags) -> Vec<Arc<Member>> {
        let Some((def, subst)) = self.subst_for(ty) else {
            return Vec::new();
        };
        def.members
            .iter()
            .filter(|m| m.kind == MemberKind::Constructor && flags.admits(m))
            .map(|m| Arc::new(m.instantiate(ty.clone(), &subst)))
            .collect()
    }

    fn close_type(&self, def: DefId, args: &[Type]) -> ReflectResult<Type> {
        let d = self.def(def);
        if d.generic_params.len() != args.len() {
            return Err(ReflectError::TypeArgumentCount {
                type_name: d.name.clone(),
                expected: d.generic_params.len(),
                found: args.len(),
            });
        }
        Ok(Type::adt(def, args.to_vec()))
    }

    fn find_member(
        &self,
        ty: &Type,
        kind: MemberKind,
        name: &str,
        params: &[Type],
    ) -> Option<Arc<Member>> {
        let candidates = if kind == MemberKind::Constructor {
            self.constructors(ty, BindingFlags::ALL)
        } else {
            self.members(ty, name, BindingFlags::ALL)
        };
        candidates
            .into_iter()
            .find(|m| m.kind == kind && m.params.as_slice() == params)
    }

    fn close_method(&self, member: &Member, args: &[Type]) -> ReflectResult<Arc<Member>> {
        if member.generic_params.len() != args.len() {
            return Err(ReflectError::TypeArgumentCount {
                type_name: member_path(self, member),
                expected: member.generic_params.len(),
                found: args.len(),
            });
        }
        Ok(Arc::new(member.close_method(args)))
    }

    fn call(&self, call: Call<'_>) -> ReflectResult<Value> {
        match call {
            Call::Construct { ctor, args } => {
                self.check_closed(ctor)?;
                self.check_args(ctor, args)?;
                let Body::Native(body) = &ctor.body else {
                    return Err(ReflectError::CannotInfer {
                        member: member_path(self, ctor),
                    });
                };
                let obj = crate::value::ObjectRef::new(
                    ctor.declaring.clone(),
                    self.field_slots(&ctor.declaring),
                );
                let this = Value::Object(obj);
                self.run(&**body, ctor, Some(&this), args)?;
                Ok(this)
            }
            Call::Invoke {
                method,
                target,
                args,
            } => {
                self.check_closed(method)?;
                let target = self.check_target(method, target)?;
                self.check_args(method, args)?;
                match &method.body {
                    Body::Native(body) => self.run(&**body, method, target, args),
                    _ => Err(ReflectError::MissingMethod {
                        type_name: self.type_name(&method.declaring),
                        member: method.name.clone(),
                    }),
                }
            }
            Call::Get {
                member,
                target,
                index,
            } => {
                self.check_closed(member)?;
                let target = self.check_target(member, target)?;
                match &member.body {
                    Body::Field => self.read_field(member, target),
                    Body::Property { getter: Some(getter), .. } => {
                        self.check_args(member, index)?;
                        self.run(&**getter, member, target, index)
                    }
                    _ => Err(ReflectError::NoAccessor(member_path(self, member))),
                }
            }
            Call::Set {
                member,
                target,
                value,
                index,
            } => {
                self.check_closed(member)?;
                let target = self.check_target(member, target)?;
                match &member.body {
                    Body::Field => {
                        self.write_field(member, target, value)?;
                        Ok(Value::Unit)
                    }
                    Body::Property { setter: Some(setter), .. } => {
                        self.check_args(member, index)?;
                        self.check_value(&member.ty, &value)?;
                        let mut args = index.to_vec();
                        args.push(value);
                        self.run(&**setter, member, target, &args)?;
                        Ok(Value::Unit)
                    }
                    _ => Err(ReflectError::NoAccessor(member_path(self, member))),
                }
            }
        }
    }
}

/// Parameter slot `index` of definition `def`.
pub(crate) fn type_param(def: DefId, index: u32, name: &str) -> GenericParam {
    GenericParam::new(ParamOwner::Type(def), index, name)
}
