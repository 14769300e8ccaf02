//! End-to-end tests for reflective invocation.
//!
//! These tests drive the public [`Invoker`] entry points against a shared
//! registry and check the values returned and the errors raised.

mod common;

use std::sync::Arc;

use mirror::error::{Fault, ReflectError};
use mirror::host::{DefKind, Registry, TypeHost};
use mirror::invoke::Invoker;
use mirror::member::{BindingFlags, Member, MemberKind};
use mirror::ty::{DefId, Type};
use mirror::value::{Handler, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use common::{world, World};

fn member(w: &World, ty: &Type, name: &str, kind: MemberKind) -> Arc<Member> {
    w.reg
        .members(ty, name, BindingFlags::ALL)
        .into_iter()
        .find(|m| m.kind == kind)
        .unwrap_or_else(|| panic!("no {kind:?} named {name}"))
}

fn handler(w: &World, target: &Value, name: &str) -> Handler {
    let method = member(w, &w.recorder, name, MemberKind::Method);
    Handler::new(Some(target.clone()), method)
}

#[test]
fn test_overloads_resolve_by_runtime_types() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let calc = invoker.create_default(&w.calculator).unwrap();

    let sum: i32 = invoker
        .invoke_method_as(Some(&calc), "Add", &[3.into(), 4.into()])
        .unwrap();
    assert_eq!(sum, 7);

    let joined: String = invoker
        .invoke_method_as(Some(&calc), "Add", &["a".into(), "b".into()])
        .unwrap();
    assert_eq!(joined, "ab");
}

#[test]
fn test_no_compatible_overload() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let calc = invoker.create_default(&w.calculator).unwrap();

    let err = invoker
        .invoke_method(Some(&calc), "Add", &[3.into(), "b".into()])
        .unwrap_err();
    assert!(matches!(
        &err,
        ReflectError::MissingMethod { type_name, member }
            if type_name == "Calculator" && member == "Add"
    ));

    let err = invoker
        .invoke_method(Some(&calc), "Subtract", &[3.into(), 4.into()])
        .unwrap_err();
    assert!(err.is_missing());
}

#[test]
fn test_construct_infers_type_arguments() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let box_def = w.boxed.def_id().unwrap();

    let ints = invoker.construct(&w.boxed, &[42.into()]).unwrap();
    assert_eq!(ints.type_of(), Some(Type::adt(box_def, vec![Type::i32()])));
    assert_eq!(invoker.get_field::<i32>(Some(&ints), "value").unwrap(), 42);

    let strs = invoker.construct(&w.boxed, &["x".into()]).unwrap();
    assert_eq!(strs.type_of(), Some(Type::adt(box_def, vec![Type::str()])));
    assert_eq!(invoker.get_field::<String>(Some(&strs), "value").unwrap(), "x");
    assert_eq!(w.reg.type_name(&strs.type_of().unwrap()), "Box<str>");
}

#[test]
fn test_construct_without_matching_constructor() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let err = invoker.construct(&w.boxed, &[]).unwrap_err();
    assert!(matches!(err, ReflectError::CannotInfer { .. }));

    // null cannot pin down `T`.
    let err = invoker.construct(&w.boxed, &[Value::Null]).unwrap_err();
    assert!(matches!(err, ReflectError::CannotInfer { .. }));
}

#[test]
fn test_construct_value_type() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let p = invoker.construct(&w.point, &[3.into(), (-4).into()]).unwrap();
    assert_eq!(w.reg.type_name(&p.type_of().unwrap()), "Point");
    let norm = invoker.invoke_static(&w.util, "Norm", &[p]).unwrap();
    assert_eq!(norm, Value::I32(7));

    // A value type never accepts null.
    let err = invoker.invoke_static(&w.util, "Norm", &[Value::Null]).unwrap_err();
    assert!(err.is_missing());
}

#[test]
fn test_callee_fault_is_rethrown_unchanged() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let calc = invoker.create_default(&w.calculator).unwrap();

    let err = invoker
        .invoke_method(Some(&calc), "Divide", &[1.into(), 0.into()])
        .unwrap_err();

    let mut expected = Fault::new("DivideByZero", "attempted to divide by zero");
    expected.push_frame("Calculator.Divide");
    assert_eq!(err.fault(), Some(&expected));
    assert_eq!(err.to_string(), "DivideByZero: attempted to divide by zero");
    assert!(std::error::Error::source(&err).is_none());
    assert!(matches!(err, ReflectError::Rethrown(_)));
}

#[test]
fn test_descriptor_invocation_rethrows_too() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let calc = invoker.create_default(&w.calculator).unwrap();
    let divide = member(&w, &w.calculator, "Divide", MemberKind::Method);

    let ok = invoker.invoke(&divide, Some(&calc), &[9.into(), 3.into()]).unwrap();
    assert_eq!(ok, Value::I32(3));

    let err = invoker
        .invoke(&divide, Some(&calc), &[9.into(), 0.into()])
        .unwrap_err();
    assert_eq!(err.fault().map(|f| f.kind.as_str()), Some("DivideByZero"));
    assert!(matches!(err, ReflectError::Rethrown(_)));
}

#[test]
fn test_host_errors_pass_through() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let divide = member(&w, &w.calculator, "Divide", MemberKind::Method);

    let err = invoker.invoke(&divide, None, &[1.into(), 1.into()]).unwrap_err();
    assert!(matches!(err, ReflectError::MemberAccess(path) if path == "Calculator.Divide"));

    let calc = invoker.create_default(&w.calculator).unwrap();
    let err = invoker.invoke(&divide, Some(&calc), &[1.into()]).unwrap_err();
    assert!(matches!(
        err,
        ReflectError::ArgumentCount { expected: 2, found: 1, .. }
    ));

    let recorder = invoker.create_default(&w.recorder).unwrap();
    let err = invoker
        .invoke(&divide, Some(&recorder), &[1.into(), 1.into()])
        .unwrap_err();
    assert!(matches!(err, ReflectError::TargetMismatch { .. }));
}

#[test]
fn test_open_member_closes_from_target() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let list_def = w.list.def_id().unwrap();
    let strs = invoker
        .create_default(&Type::adt(list_def, vec![Type::str()]))
        .unwrap();
    let add = member(&w, &w.list, "Add", MemberKind::Method);
    assert!(add.is_open());

    invoker.invoke(&add, Some(&strs), &["first".into()]).unwrap();
    invoker.invoke(&add, Some(&strs), &["second".into()]).unwrap();
    let last: String = invoker.invoke_method_as(Some(&strs), "Last", &[]).unwrap();
    assert_eq!(last, "second");

    let err = invoker.invoke(&add, Some(&strs), &[1.into()]).unwrap_err();
    assert!(matches!(err, ReflectError::CannotInfer { .. }));
}

#[test]
fn test_open_property_get_and_set() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let value = member(&w, &w.boxed, "Value", MemberKind::Property);
    let b = invoker.construct(&w.boxed, &["start".into()]).unwrap();

    let current: String = invoker.get_value_as(&value, Some(&b), &[]).unwrap();
    assert_eq!(current, "start");

    invoker.set_value(&value, Some(&b), "next".into(), &[]).unwrap();
    assert_eq!(invoker.get_value(&value, Some(&b), &[]).unwrap(), Value::str("next"));

    let err = invoker.set_value(&value, Some(&b), 5.into(), &[]).unwrap_err();
    assert!(matches!(err, ReflectError::CannotInfer { .. }));

    let err = invoker.get_value_as::<i32>(&value, Some(&b), &[]).unwrap_err();
    assert!(matches!(err, ReflectError::CannotInfer { .. }));
}

#[test]
fn test_inherited_members() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let ints = invoker.create_default(&w.int_list).unwrap();

    invoker.invoke_method(Some(&ints), "Add", &[5.into()]).unwrap();
    invoker.invoke_method(Some(&ints), "Add", &[6.into()]).unwrap();
    let count = member(&w, &w.int_list, "Count", MemberKind::Property);
    assert_eq!(invoker.get_value_as::<i32>(&count, Some(&ints), &[]).unwrap(), 2);

    let err = invoker
        .invoke_method(Some(&ints), "Add", &["x".into()])
        .unwrap_err();
    assert!(err.is_missing());
}

#[test]
fn test_static_methods() {
    let w = world();
    let invoker = Invoker::new(&w.reg);

    let name = invoker.invoke_static(&w.util, "TypeOf", &[1.5.into()]).unwrap();
    assert_eq!(name, Value::str("f64"));

    let err = invoker.invoke_static(&w.calculator, "Add", &[1.into(), 2.into()]).unwrap_err();
    assert!(err.is_missing());
}

/// `Chooser` whose generic overloads are declared before `object` fallbacks:
/// `Pick<T>(T, T)`, `Pick(object, object)`, `Both<T>(T, List<T>)`,
/// `Both(object, object)`. Each returns which overload ran.
fn chooser() -> (Registry, Type, Type, Type, DefId) {
    let mut reg = Registry::new();
    let mut a = reg.define("Animal", DefKind::Class);
    a.ctor().body(|_| Ok(Value::Unit)).add();
    let animal = a.open_type();
    let mut d = reg.define("Dog", DefKind::Class);
    d.base(animal.clone());
    d.ctor().body(|_| Ok(Value::Unit)).add();
    let dog = d.open_type();
    let mut l = reg.define("List", DefKind::Class);
    l.generic("T");
    l.ctor().body(|_| Ok(Value::Unit)).add();
    let list = l.id();

    let mut c = reg.define("Chooser", DefKind::Class);
    for name in ["Pick", "Both"] {
        let mut m = c.method(name);
        let t = m.generic("T");
        let second = match name {
            "Pick" => t.clone(),
            _ => Type::adt(list, vec![t.clone()]),
        };
        m.params([t, second])
            .returns(Type::str())
            .as_static()
            .body(|_| Ok(Value::str("generic")))
            .add();
        c.method(name)
            .params([Type::object(), Type::object()])
            .returns(Type::str())
            .as_static()
            .body(|_| Ok(Value::str("object")))
            .add();
    }
    let chooser = c.open_type();
    (reg, chooser, animal, dog, list)
}

#[test]
fn test_null_skips_generic_bound_to_value_type() {
    let (reg, chooser, ..) = chooser();
    let invoker = Invoker::new(&reg);

    let picked = invoker
        .invoke_static(&chooser, "Pick", &[Value::Null, 5.into()])
        .unwrap();
    assert_eq!(picked, Value::str("object"));
    let picked = invoker
        .invoke_static(&chooser, "Pick", &[5.into(), Value::Null])
        .unwrap();
    assert_eq!(picked, Value::str("object"));

    let picked = invoker
        .invoke_static(&chooser, "Pick", &[Value::Null, "a".into()])
        .unwrap();
    assert_eq!(picked, Value::str("generic"));
}

#[test]
fn test_nested_type_arguments_are_invariant() {
    let (reg, chooser, animal, dog, list) = chooser();
    let invoker = Invoker::new(&reg);
    let an_animal = invoker.create_default(&animal).unwrap();
    let a_dog = invoker.create_default(&dog).unwrap();
    let dogs = invoker
        .create_default(&Type::adt(list, vec![dog.clone()]))
        .unwrap();

    let picked = invoker
        .invoke_static(&chooser, "Both", &[an_animal, dogs.clone()])
        .unwrap();
    assert_eq!(picked, Value::str("object"));

    let picked = invoker
        .invoke_static(&chooser, "Both", &[a_dog, dogs])
        .unwrap();
    assert_eq!(picked, Value::str("generic"));
}

#[test]
fn test_event_handlers_stop_at_first_failure() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let counter = invoker.create_default(&w.counter).unwrap();
    let first = invoker.create_default(&w.recorder).unwrap();
    let second = invoker.create_default(&w.recorder).unwrap();
    let third = invoker.create_default(&w.recorder).unwrap();

    invoker
        .subscribe(Some(&counter), "Changed", handler(&w, &first, "Hit"))
        .unwrap();
    invoker
        .subscribe(Some(&counter), "Changed", handler(&w, &second, "Fail"))
        .unwrap();
    invoker
        .subscribe(Some(&counter), "Changed", handler(&w, &third, "Hit"))
        .unwrap();

    let err = invoker
        .raise_event(Some(&counter), "Changed", &["tick".into()])
        .unwrap_err();
    let ReflectError::Rethrown(fault) = err else {
        panic!("expected the handler's fault, got {err:?}");
    };
    assert_eq!(fault.kind, "HandlerFailed");
    assert_eq!(fault.message, "handler rejected 'tick'");
    assert_eq!(fault.trace, vec!["Recorder.Fail".to_string()]);

    assert_eq!(invoker.get_field::<i32>(Some(&first), "hits").unwrap(), 1);
    assert_eq!(invoker.get_field::<i32>(Some(&third), "hits").unwrap(), 0);
}

#[test]
fn test_event_subscription_lifecycle() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let counter = invoker.create_default(&w.counter).unwrap();
    let rec = invoker.create_default(&w.recorder).unwrap();

    // Nobody subscribed yet.
    invoker.raise_event(Some(&counter), "Changed", &["a".into()]).unwrap();

    let hit = handler(&w, &rec, "Hit");
    invoker.subscribe(Some(&counter), "Changed", hit.clone()).unwrap();
    invoker.subscribe(Some(&counter), "Changed", hit.clone()).unwrap();
    invoker.raise_event(Some(&counter), "Changed", &["b".into()]).unwrap();
    assert_eq!(invoker.get_field::<i32>(Some(&rec), "hits").unwrap(), 2);

    invoker.unsubscribe(Some(&counter), "Changed", &hit).unwrap();
    invoker.raise_event(Some(&counter), "Changed", &["c".into()]).unwrap();
    assert_eq!(invoker.get_field::<i32>(Some(&rec), "hits").unwrap(), 3);

    invoker.unsubscribe(Some(&counter), "Changed", &hit).unwrap();
    invoker.raise_event(Some(&counter), "Changed", &["d".into()]).unwrap();
    assert_eq!(invoker.get_field::<i32>(Some(&rec), "hits").unwrap(), 3);
}

#[test]
fn test_missing_event() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let counter = invoker.create_default(&w.counter).unwrap();

    let err = invoker.raise_event(Some(&counter), "Closed", &[]).unwrap_err();
    assert!(matches!(err, ReflectError::MissingMember { member, .. } if member == "Closed"));

    let err = invoker.raise_event(None, "Changed", &[]).unwrap_err();
    assert!(matches!(err, ReflectError::ArgumentNull("target")));
}

#[test]
fn test_binding_flags_restrict_resolution() {
    let w = world();
    let instance_only = BindingFlags::PUBLIC | BindingFlags::NON_PUBLIC | BindingFlags::INSTANCE;
    let invoker = Invoker::with_flags(&w.reg, instance_only);
    let calc = invoker.create_default(&w.calculator).unwrap();

    assert!(invoker
        .invoke_method(Some(&calc), "Add", &[1.into(), 2.into()])
        .is_ok());
    let err = invoker.invoke_static(&w.util, "Check", &[1.into()]).unwrap_err();
    assert!(err.is_missing());
}

proptest! {
    #[test]
    fn prop_add_matches_native(a in any::<i32>(), b in any::<i32>()) {
        let w = world();
        let invoker = Invoker::new(&w.reg);
        let calc = invoker.create_default(&w.calculator).unwrap();
        let sum: i32 = invoker
            .invoke_method_as(Some(&calc), "Add", &[a.into(), b.into()])
            .unwrap();
        prop_assert_eq!(sum, a.wrapping_add(b));
    }

    #[test]
    fn prop_add_concatenates(a in ".{0,12}", b in ".{0,12}") {
        let w = world();
        let invoker = Invoker::new(&w.reg);
        let calc = invoker.create_default(&w.calculator).unwrap();
        let joined: String = invoker
            .invoke_method_as(Some(&calc), "Add", &[a.as_str().into(), b.as_str().into()])
            .unwrap();
        prop_assert_eq!(joined, format!("{a}{b}"));
    }
}
