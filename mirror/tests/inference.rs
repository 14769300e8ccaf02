//! Generic argument inference through the resolver.

mod common;

use mirror::host::{signature, DefKind, Registry, TypeHost};
use mirror::infer::{arg_types, DispatchResult, MatchFailure, MemberResolver};
use mirror::invoke::Invoker;
use mirror::member::MemberKind;
use mirror::ty::Type;
use mirror::value::Value;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use common::world;

fn resolve_static(
    resolver: &MemberResolver<'_>,
    ty: &Type,
    name: &str,
    args: &[Option<Type>],
    expected: Option<&Type>,
) -> DispatchResult {
    resolver.resolve(ty, name, MemberKind::Method, None, args, expected)
}

#[test]
fn test_repeated_parameter_must_agree() {
    let w = world();
    let resolver = MemberResolver::new(&w.reg);

    let same = resolver
        .resolve_member(
            &w.util,
            "Pair",
            MemberKind::Method,
            None,
            &[Some(Type::i32()), Some(Type::i32())],
            None,
        )
        .unwrap();
    assert_eq!(same.member.method_args, vec![Type::i32()]);
    assert_eq!(same.member.params, vec![Type::i32(), Type::i32()]);

    let mixed = resolve_static(
        &resolver,
        &w.util,
        "Pair",
        &[Some(Type::i32()), Some(Type::str())],
        None,
    );
    let DispatchResult::NoMatch(err) = mixed else {
        panic!("Pair(i32, str) must not resolve");
    };
    assert!(matches!(
        err.rejected[0].1,
        MatchFailure::Argument { position: 1, .. }
    ));
}

#[test]
fn test_null_selects_reference_overload() {
    let w = world();
    let invoker = Invoker::new(&w.reg);

    assert_eq!(
        invoker.invoke_static(&w.util, "Check", &[1.into()]).unwrap(),
        Value::str("i32")
    );
    assert_eq!(
        invoker.invoke_static(&w.util, "Check", &[Value::Null]).unwrap(),
        Value::str("str")
    );
    assert_eq!(
        invoker.invoke_static(&w.util, "Describe", &[Value::Null]).unwrap(),
        Value::str("null")
    );
}

#[test]
fn test_generic_argument_from_base_class() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let ints = invoker.create_default(&w.int_list).unwrap();
    invoker.invoke_method(Some(&ints), "Add", &[7.into()]).unwrap();

    let resolved = invoker
        .resolver()
        .resolve_member(
            &w.util,
            "Last",
            MemberKind::Method,
            None,
            &arg_types(&[ints.clone()]),
            None,
        )
        .unwrap();
    assert_eq!(resolved.member.method_args, vec![Type::i32()]);
    assert_eq!(resolved.member.ty, Type::i32());

    let last = invoker.invoke_static(&w.util, "Last", &[ints]).unwrap();
    assert_eq!(last, Value::I32(7));
}

#[test]
fn test_unconstrained_parameter_needs_expected_type() {
    let w = world();
    let resolver = MemberResolver::new(&w.reg);
    let args = [Some(Type::i32())];

    let DispatchResult::NoMatch(err) = resolve_static(&resolver, &w.util, "Convert", &args, None)
    else {
        panic!("Convert<T, R> must not resolve without an expected type");
    };
    let MatchFailure::Unbound(param) = &err.rejected[0].1 else {
        panic!("expected unbound R, got {:?}", err.rejected[0].1);
    };
    assert_eq!(&*param.name, "R");

    let resolved = resolver
        .resolve_member(
            &w.util,
            "Convert",
            MemberKind::Method,
            None,
            &args,
            Some(&Type::str()),
        )
        .unwrap();
    assert_eq!(resolved.member.method_args, vec![Type::i32(), Type::str()]);
    assert_eq!(
        signature(&w.reg, &resolved.member),
        "static Convert<i32, str>(i32) -> str"
    );
}

#[test]
fn test_expected_type_is_matched_contravariantly() {
    let w = world();
    let resolver = MemberResolver::new(&w.reg);
    let args = [Some(Type::i32())];
    let describe = |expected: Type| {
        matches!(
            resolve_static(&resolver, &w.util, "Describe", &args, Some(&expected)),
            DispatchResult::Resolved(_)
        )
    };

    assert!(describe(Type::str()));
    assert!(describe(Type::object()));
    assert!(!describe(Type::i32()));
}

#[test]
fn test_first_match_wins() {
    let mut reg = Registry::new();
    let mut shown = reg.define("Shown", DefKind::Class);
    shown
        .method("Show")
        .param(Type::object())
        .returns(Type::str())
        .as_static()
        .body(|_| Ok(Value::str("object")))
        .add();
    shown
        .method("Show")
        .param(Type::str())
        .returns(Type::str())
        .as_static()
        .body(|_| Ok(Value::str("str")))
        .add();
    let ty = shown.open_type();

    // No specificity ranking: the earlier declaration wins even though the
    // later one fits more closely.
    let out = Invoker::new(&reg).invoke_static(&ty, "Show", &["x".into()]).unwrap();
    assert_eq!(out, Value::str("object"));
}

#[test]
fn test_member_signatures() {
    let w = world();
    let util = w.reg.def(w.util.def_id().unwrap());
    let rendered: Vec<String> = util
        .members
        .iter()
        .map(|m| signature(&w.reg, m))
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    static Pair<T>(T, T) -> T
    static Last<T>(List<T>) -> T
    static Convert<T, R>(T) -> R
    static TypeOf<T>(T) -> str
    static Check(i32) -> str
    static Check(str) -> str
    static Norm(Point) -> i32
    static Describe(object) -> str
    ");

    let boxed = w.reg.def(w.boxed.def_id().unwrap());
    let rendered: Vec<String> = boxed
        .members
        .iter()
        .map(|m| signature(&w.reg, m))
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    new(T)
    value: T
    Value: T
    ");
}

#[test]
fn test_closed_generic_type_names() {
    let w = world();
    let invoker = Invoker::new(&w.reg);
    let inner = invoker.construct(&w.boxed, &[3.into()]).unwrap();
    let outer = invoker.construct(&w.boxed, &[inner]).unwrap();
    let ty = outer.type_of().unwrap();
    assert_eq!(w.reg.type_name(&ty), "Box<Box<i32>>");
}

fn primitive() -> impl Strategy<Value = Type> {
    prop::sample::select(vec![
        Type::bool(),
        Type::i32(),
        Type::i64(),
        Type::f64(),
        Type::char(),
        Type::str(),
    ])
}

proptest! {
    #[test]
    fn prop_pair_resolves_iff_types_agree(a in primitive(), b in primitive()) {
        let w = world();
        let resolver = MemberResolver::new(&w.reg);
        let result = resolve_static(
            &resolver,
            &w.util,
            "Pair",
            &[Some(a.clone()), Some(b.clone())],
            None,
        );
        match result {
            DispatchResult::Resolved(selected) => {
                prop_assert_eq!(&a, &b);
                prop_assert_eq!(selected.matched.method_args, vec![a]);
            }
            DispatchResult::NoMatch(_) => prop_assert_ne!(a, b),
        }
    }

    #[test]
    fn prop_box_infers_argument_type(n in any::<i64>()) {
        let w = world();
        let invoker = Invoker::new(&w.reg);
        let b = invoker.construct(&w.boxed, &[n.into()]).unwrap();
        let ty = b.type_of().unwrap();
        prop_assert_eq!(ty.generic_args(), &[Type::i64()][..]);
        prop_assert_eq!(invoker.get_field::<i64>(Some(&b), "value").unwrap(), n);
    }
}
