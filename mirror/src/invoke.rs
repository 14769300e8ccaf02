//! Reflective invocation.
//!
//! [`Invoker`] is the public face of the engine: it resolves members from
//! runtime argument types, closes open generic members, executes them
//! through the host and re-raises callee faults unwrapped.
//!
//! Every operation strips exactly one
//! [`TargetInvocation`](ReflectError::TargetInvocation) layer: a fault
//! raised by a member body reaches the caller as
//! [`ReflectError::Rethrown`] carrying the original fault, trace included.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::Config;
use crate::error::{ReflectError, ReflectResult};
use crate::guard;
use crate::host::{member_path, Call, TypeHost};
use crate::infer::{arg_types, DispatchResult, MatchResult, MemberResolver};
use crate::member::{BindingFlags, Body, Member, MemberKind};
use crate::ty::Type;
use crate::value::{Delegate, Handler, Reflected, Value};

/// How an explicitly supplied member is about to be used.
#[derive(Clone, Copy)]
enum Access<'v> {
    /// Called or read; the result is consumed as the given type.
    Read(Option<&'v Type>),
    /// Assigned the given value.
    Write(&'v Value),
}

/// Resolves and invokes members against a [`TypeHost`].
pub struct Invoker<'a> {
    resolver: MemberResolver<'a>,
}

impl<'a> Invoker<'a> {
    pub fn new(host: &'a dyn TypeHost) -> Self {
        Self {
            resolver: MemberResolver::new(host),
        }
    }

    pub fn with_flags(host: &'a dyn TypeHost, flags: BindingFlags) -> Self {
        Self {
            resolver: MemberResolver::with_flags(host, flags),
        }
    }

    pub fn with_config(host: &'a dyn TypeHost, config: &Config) -> Self {
        Self::with_flags(host, config.flags())
    }

    pub fn host(&self) -> &'a dyn TypeHost {
        self.resolver.host()
    }

    pub fn resolver(&self) -> &MemberResolver<'a> {
        &self.resolver
    }

    fn execute(&self, call: Call<'_>) -> ReflectResult<Value> {
        self.host().call(call).map_err(ReflectError::unwrap_invocation)
    }

    fn cast<T: Reflected>(&self, value: Value) -> ReflectResult<T> {
        let found = value
            .type_of()
            .map(|t| self.host().type_name(&t))
            .unwrap_or_else(|| "null".to_string());
        T::from_value(value).ok_or_else(|| ReflectError::InvalidCast {
            expected: self.host().type_name(&T::static_type()),
            found,
        })
    }

    /// `None` when the expected type places no constraint.
    fn expected<T: Reflected>() -> Option<Type> {
        Some(T::static_type()).filter(|t| !t.is_object())
    }

    fn require_target(&self, member: &Member, target: Option<&Value>) -> ReflectResult<()> {
        if member.is_static || member.kind == MemberKind::Constructor {
            return Ok(());
        }
        guard::access_not_null(
            target.filter(|v| !v.is_null()),
            &member_path(self.host(), member),
        )?;
        Ok(())
    }

    /// Close `member` from the call site when it still carries generic
    /// parameters.
    fn close_for(
        &self,
        member: &Member,
        target: Option<&Value>,
        args: &[Value],
        access: Access<'_>,
    ) -> ReflectResult<Arc<Member>> {
        if !member.is_open() {
            return Ok(Arc::new(member.clone()));
        }
        let target_ty = target.and_then(Value::type_of);
        let unifier = self.resolver.unifier();
        let result = match access {
            Access::Read(expected) => {
                unifier.unify(member, target_ty.as_ref(), &arg_types(args), expected)
            }
            Access::Write(value) => unifier.unify_assignment(
                member,
                target_ty.as_ref(),
                &arg_types(args),
                value.type_of().as_ref(),
            ),
        };
        match result {
            MatchResult::Matched(matched) => self.resolver.close(member, &matched),
            MatchResult::Failed(failure) => {
                let path = member_path(self.host(), member);
                trace!(member = %path, ?failure, "cannot close member");
                Err(ReflectError::CannotInfer { member: path })
            }
        }
    }

    /// Construct `ty` with the first constructor the arguments fit.
    ///
    /// An open generic type is closed with the arguments inferred from the
    /// constructor's parameters: `Box<T>` constructed with `42` yields a
    /// `Box<i32>`.
    pub fn construct(&self, ty: &Type, args: &[Value]) -> ReflectResult<Value> {
        let ty_name = self.host().type_name(ty);
        debug!(ty = %ty_name, args = args.len(), "construct");
        let types = arg_types(args);
        let selected =
            match self
                .resolver
                .resolve(ty, "new", MemberKind::Constructor, None, &types, None)
            {
                DispatchResult::Resolved(selected) => selected,
                DispatchResult::NoMatch(_) => {
                    return Err(ReflectError::CannotInfer {
                        member: format!("{ty_name}.new"),
                    })
                }
            };
        let ctor = self.resolver.close(&selected.candidate, &selected.matched)?;
        self.execute(Call::Construct { ctor: &ctor, args })
    }

    /// [`construct`](Self::construct), read back as `T`.
    pub fn create_instance<T: Reflected>(&self, ty: &Type, args: &[Value]) -> ReflectResult<T> {
        let value = self.construct(ty, args)?;
        self.cast(value)
    }

    /// Construct `ty` with its parameterless constructor.
    pub fn create_default(&self, ty: &Type) -> ReflectResult<Value> {
        self.construct(ty, &[])
    }

    /// Read a field or property. `index` holds index arguments for indexed
    /// properties.
    pub fn get_value(
        &self,
        member: &Member,
        target: Option<&Value>,
        index: &[Value],
    ) -> ReflectResult<Value> {
        self.get(member, target, index, None)
    }

    /// [`get_value`](Self::get_value), read back as `T`. An open generic
    /// property is closed against `T` as well as the target.
    pub fn get_value_as<T: Reflected>(
        &self,
        member: &Member,
        target: Option<&Value>,
        index: &[Value],
    ) -> ReflectResult<T> {
        let expected = Self::expected::<T>();
        let value = self.get(member, target, index, expected.as_ref())?;
        self.cast(value)
    }

    fn get(
        &self,
        member: &Member,
        target: Option<&Value>,
        index: &[Value],
        expected: Option<&Type>,
    ) -> ReflectResult<Value> {
        self.require_target(member, target)?;
        let closed = self.close_for(member, target, index, Access::Read(expected))?;
        debug!(member = %member_path(self.host(), &closed), "get");
        self.execute(Call::Get {
            member: &closed,
            target,
            index,
        })
    }

    /// Write a field or property.
    pub fn set_value(
        &self,
        member: &Member,
        target: Option<&Value>,
        value: Value,
        index: &[Value],
    ) -> ReflectResult<()> {
        self.require_target(member, target)?;
        let closed = self.close_for(member, target, index, Access::Write(&value))?;
        debug!(member = %member_path(self.host(), &closed), "set");
        self.execute(Call::Set {
            member: &closed,
            target,
            value,
            index,
        })?;
        Ok(())
    }

    fn field(&self, target: &Value, name: &str) -> ReflectResult<Arc<Member>> {
        let ty = target.type_of().unwrap_or_else(Type::object);
        self.host()
            .members(&ty, name, self.resolver.flags())
            .into_iter()
            .find(|m| m.kind == MemberKind::Field)
            .ok_or_else(|| ReflectError::MissingMember {
                type_name: self.host().type_name(&ty),
                member: name.to_string(),
            })
    }

    /// Read the field `name` of `target`'s runtime type as `T`.
    pub fn get_field<T: Reflected>(&self, target: Option<&Value>, name: &str) -> ReflectResult<T> {
        let target = guard::confirm_not_null(target.filter(|v| !v.is_null()), "target")?;
        let name = guard::confirm_name(name, "name")?;
        let field = self.field(target, name)?;
        let value = self.get(&field, Some(target), &[], None)?;
        self.cast(value)
    }

    /// Write the field `name` of `target`'s runtime type.
    pub fn set_field(
        &self,
        target: Option<&Value>,
        name: &str,
        value: impl Into<Value>,
    ) -> ReflectResult<()> {
        let target = guard::confirm_not_null(target.filter(|v| !v.is_null()), "target")?;
        let name = guard::confirm_name(name, "name")?;
        let field = self.field(target, name)?;
        self.set_value(&field, Some(target), value.into(), &[])
    }

    /// Invoke a method or constructor descriptor. Open generic members are
    /// closed from the target and arguments first.
    pub fn invoke(
        &self,
        member: &Member,
        target: Option<&Value>,
        args: &[Value],
    ) -> ReflectResult<Value> {
        self.invoke_expecting(member, target, args, None)
    }

    /// [`invoke`](Self::invoke), read back as `T`.
    pub fn invoke_as<T: Reflected>(
        &self,
        member: &Member,
        target: Option<&Value>,
        args: &[Value],
    ) -> ReflectResult<T> {
        let expected = Self::expected::<T>();
        let value = self.invoke_expecting(member, target, args, expected.as_ref())?;
        self.cast(value)
    }

    fn invoke_expecting(
        &self,
        member: &Member,
        target: Option<&Value>,
        args: &[Value],
        expected: Option<&Type>,
    ) -> ReflectResult<Value> {
        self.require_target(member, target)?;
        let closed = self.close_for(member, target, args, Access::Read(expected))?;
        debug!(member = %member_path(self.host(), &closed), args = args.len(), "invoke");
        if closed.kind == MemberKind::Constructor {
            return self.execute(Call::Construct { ctor: &closed, args });
        }
        self.execute(Call::Invoke {
            method: &closed,
            target,
            args,
        })
    }

    /// Invoke the method `name` on `target`, chosen by the arguments'
    /// runtime types.
    pub fn invoke_method(
        &self,
        target: Option<&Value>,
        name: &str,
        args: &[Value],
    ) -> ReflectResult<Value> {
        self.invoke_method_expecting(target, name, args, None)
    }

    /// [`invoke_method`](Self::invoke_method), read back as `T`. `T` also
    /// takes part in resolution: only methods whose return type can be
    /// consumed as `T` are candidates.
    pub fn invoke_method_as<T: Reflected>(
        &self,
        target: Option<&Value>,
        name: &str,
        args: &[Value],
    ) -> ReflectResult<T> {
        let expected = Self::expected::<T>();
        let value = self.invoke_method_expecting(target, name, args, expected.as_ref())?;
        self.cast(value)
    }

    fn invoke_method_expecting(
        &self,
        target: Option<&Value>,
        name: &str,
        args: &[Value],
        expected: Option<&Type>,
    ) -> ReflectResult<Value> {
        let target = guard::confirm_not_null(target.filter(|v| !v.is_null()), "target")?;
        let name = guard::confirm_name(name, "name")?;
        let ty = target.type_of().unwrap_or_else(Type::object);
        let resolved = self.resolver.resolve_member(
            &ty,
            name,
            MemberKind::Method,
            Some(&ty),
            &arg_types(args),
            expected,
        )?;
        debug!(member = %member_path(self.host(), &resolved.member), "invoke method");
        self.execute(Call::Invoke {
            method: &resolved.member,
            target: Some(target),
            args,
        })
    }

    /// Invoke the static method `name` of `ty`.
    pub fn invoke_static(&self, ty: &Type, name: &str, args: &[Value]) -> ReflectResult<Value> {
        let name = guard::confirm_name(name, "name")?;
        let statics = MemberResolver::with_flags(
            self.host(),
            self.resolver.flags().difference(BindingFlags::INSTANCE),
        );
        let resolved =
            statics.resolve_member(ty, name, MemberKind::Method, None, &arg_types(args), None)?;
        debug!(member = %member_path(self.host(), &resolved.member), "invoke static");
        self.execute(Call::Invoke {
            method: &resolved.member,
            target: None,
            args,
        })
    }

    /// The event `name` on `target`'s type and the field holding its
    /// subscribers.
    fn event_field(&self, target: &Value, name: &str) -> ReflectResult<Arc<Member>> {
        let ty = target.type_of().unwrap_or_else(Type::object);
        let missing = |member: &str| ReflectError::MissingMember {
            type_name: self.host().type_name(&ty),
            member: member.to_string(),
        };
        let event = self
            .host()
            .members(&ty, name, self.resolver.flags())
            .into_iter()
            .find(|m| m.kind == MemberKind::Event)
            .ok_or_else(|| missing(name))?;
        let Body::Event { field } = &event.body else {
            return Err(missing(name));
        };
        self.host()
            .members(&event.declaring, field, BindingFlags::ALL)
            .into_iter()
            .find(|m| m.kind == MemberKind::Field)
            .ok_or_else(|| missing(field))
    }

    fn subscribers(&self, field: &Member, target: &Value) -> ReflectResult<Option<Delegate>> {
        match self.execute(Call::Get {
            member: field,
            target: Some(target),
            index: &[],
        })? {
            Value::Delegate(delegate) => Ok(Some(delegate)),
            Value::Null => Ok(None),
            other => Err(ReflectError::InvalidCast {
                expected: "delegate".to_string(),
                found: other
                    .type_of()
                    .map(|t| self.host().type_name(&t))
                    .unwrap_or_else(|| "null".to_string()),
            }),
        }
    }

    fn store_subscribers(
        &self,
        field: &Member,
        target: &Value,
        delegate: Option<Delegate>,
    ) -> ReflectResult<()> {
        let value = delegate.map(Value::Delegate).unwrap_or(Value::Null);
        self.execute(Call::Set {
            member: field,
            target: Some(target),
            value,
            index: &[],
        })?;
        Ok(())
    }

    /// Raise the event `name` on `target`.
    ///
    /// Handlers run in subscription order. The first failing handler's fault
    /// propagates and the remaining handlers do not run. An event nobody
    /// subscribed to is a no-op.
    pub fn raise_event(
        &self,
        target: Option<&Value>,
        name: &str,
        args: &[Value],
    ) -> ReflectResult<()> {
        let target = guard::confirm_not_null(target.filter(|v| !v.is_null()), "target")?;
        let name = guard::confirm_name(name, "name")?;
        let field = self.event_field(target, name)?;
        let Some(delegate) = self.subscribers(&field, target)? else {
            debug!(event = name, "no subscribers");
            return Ok(());
        };
        debug!(event = name, handlers = delegate.len(), "raise event");
        for handler in delegate.handlers() {
            self.invoke(&handler.method, handler.target.as_ref(), args)?;
        }
        Ok(())
    }

    /// Append `handler` to the subscribers of event `name`.
    pub fn subscribe(&self, target: Option<&Value>, name: &str, handler: Handler) -> ReflectResult<()> {
        let target = guard::confirm_not_null(target.filter(|v| !v.is_null()), "target")?;
        let name = guard::confirm_name(name, "name")?;
        let field = self.event_field(target, name)?;
        let current = self.subscribers(&field, target)?;
        let combined = Delegate::combine(current.as_ref(), handler);
        self.store_subscribers(&field, target, Some(combined))
    }

    /// Remove the last subscription equal to `handler`.
    pub fn unsubscribe(
        &self,
        target: Option<&Value>,
        name: &str,
        handler: &Handler,
    ) -> ReflectResult<()> {
        let target = guard::confirm_not_null(target.filter(|v| !v.is_null()), "target")?;
        let name = guard::confirm_name(name, "name")?;
        let field = self.event_field(target, name)?;
        let Some(current) = self.subscribers(&field, target)? else {
            return Ok(());
        };
        self.store_subscribers(&field, target, current.remove(handler))
    }

    /// See [`MemberResolver::base_definition`].
    pub fn base_definition(&self, property: &Member) -> Arc<Member> {
        self.resolver.base_definition(property)
    }
}
