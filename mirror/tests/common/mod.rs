//! Shared type registry for the integration tests.

#![allow(dead_code)]

use mirror::error::Fault;
use mirror::host::{DefKind, Registry};
use mirror::ty::Type;
use mirror::value::Value;

/// A registry with a handful of types covering overloads, generic
/// definitions, inheritance and events.
pub struct World {
    pub reg: Registry,
    /// `Add(i32, i32) -> i32`, `Add(str, str) -> str`, `Divide(i32, i32)`.
    pub calculator: Type,
    /// `Box<T>` with `new(T)`, field `value: T`, property `Value: T`.
    pub boxed: Type,
    /// `List<T>` with `new()`, `Add(T)`, `Last() -> T`, `Count: i32`.
    pub list: Type,
    /// `IntList : List<i32>`.
    pub int_list: Type,
    /// Static helpers.
    pub util: Type,
    /// `Point` value type.
    pub point: Type,
    /// Event source with `Changed`.
    pub counter: Type,
    /// Event handlers: `Hit(str)` counts, `Fail(str)` faults.
    pub recorder: Type,
}

fn int(v: &Value) -> i32 {
    v.as_i32().unwrap_or(0)
}

pub fn world() -> World {
    let mut reg = Registry::new();

    let mut calc = reg.define("Calculator", DefKind::Class);
    calc.ctor().body(|_| Ok(Value::Unit)).add();
    calc.method("Add")
        .params([Type::i32(), Type::i32()])
        .returns(Type::i32())
        .body(|f| Ok(Value::I32(int(f.arg(0)).wrapping_add(int(f.arg(1))))))
        .add();
    calc.method("Add")
        .params([Type::str(), Type::str()])
        .returns(Type::str())
        .body(|f| {
            let a = f.arg(0).as_str().unwrap_or_default();
            let b = f.arg(1).as_str().unwrap_or_default();
            Ok(Value::str(format!("{a}{b}")))
        })
        .add();
    calc.method("Divide")
        .params([Type::i32(), Type::i32()])
        .returns(Type::i32())
        .body(|f| match int(f.arg(1)) {
            0 => Err(Fault::new("DivideByZero", "attempted to divide by zero")),
            d => Ok(Value::I32(int(f.arg(0)) / d)),
        })
        .add();
    let calculator = calc.open_type();

    let mut b = reg.define("Box", DefKind::Class);
    let t = b.generic("T");
    b.ctor()
        .param(t.clone())
        .body(|f| {
            f.this()?.set("value", f.arg(0).clone());
            Ok(Value::Unit)
        })
        .add();
    b.field("value", t.clone()).add();
    b.property("Value", t)
        .getter(|f| Ok(f.this()?.get("value").unwrap_or(Value::Null)))
        .setter(|f| {
            f.this()?.set("value", f.arg(0).clone());
            Ok(Value::Unit)
        })
        .add();
    let boxed = b.open_type();

    let mut l = reg.define("List", DefKind::Class);
    let t = l.generic("T");
    l.ctor().body(|_| Ok(Value::Unit)).add();
    l.field("count", Type::i32()).add();
    l.field("last", t.clone()).add();
    l.method("Add")
        .param(t.clone())
        .body(|f| {
            let this = f.this()?;
            let count = this.get("count").map(|v| int(&v)).unwrap_or(0);
            this.set("count", Value::I32(count + 1));
            this.set("last", f.arg(0).clone());
            Ok(Value::Unit)
        })
        .add();
    l.method("Last")
        .returns(t)
        .body(|f| Ok(f.this()?.get("last").unwrap_or(Value::Null)))
        .add();
    l.property("Count", Type::i32())
        .getter(|f| Ok(f.this()?.get("count").unwrap_or(Value::I32(0))))
        .add();
    let list = l.open_type();
    let list_def = l.id();

    let mut il = reg.define("IntList", DefKind::Class);
    il.base(Type::adt(list_def, vec![Type::i32()]));
    il.ctor().body(|_| Ok(Value::Unit)).add();
    let int_list = il.open_type();

    let mut p = reg.define("Point", DefKind::Struct);
    p.ctor()
        .params([Type::i32(), Type::i32()])
        .body(|f| {
            let this = f.this()?;
            this.set("x", f.arg(0).clone());
            this.set("y", f.arg(1).clone());
            Ok(Value::Unit)
        })
        .add();
    p.field("x", Type::i32()).add();
    p.field("y", Type::i32()).add();
    let point = p.open_type();

    let mut u = reg.define("Util", DefKind::Class);
    {
        let mut m = u.method("Pair");
        let t = m.generic("T");
        m.params([t.clone(), t.clone()])
            .returns(t)
            .as_static()
            .body(|f| Ok(f.arg(0).clone()))
            .add();
    }
    {
        let mut m = u.method("Last");
        let t = m.generic("T");
        m.param(Type::adt(list_def, vec![t.clone()]))
            .returns(t)
            .as_static()
            .body(|f| {
                let list = f.arg(0).as_object().ok_or_else(|| {
                    Fault::new("NullReference", "list is null")
                })?;
                Ok(list.get("last").unwrap_or(Value::Null))
            })
            .add();
    }
    {
        let mut m = u.method("Convert");
        let t = m.generic("T");
        let r = m.generic("R");
        m.param(t)
            .returns(r)
            .as_static()
            .body(|f| Ok(f.arg(0).clone()))
            .add();
    }
    {
        let mut m = u.method("TypeOf");
        let t = m.generic("T");
        m.param(t)
            .returns(Type::str())
            .as_static()
            .body(|f| {
                let name = f.method_args().first().map(|t| f.host.type_name(t));
                Ok(Value::str(name.unwrap_or_default()))
            })
            .add();
    }
    u.method("Check")
        .param(Type::i32())
        .returns(Type::str())
        .as_static()
        .body(|_| Ok(Value::str("i32")))
        .add();
    u.method("Check")
        .param(Type::str())
        .returns(Type::str())
        .as_static()
        .body(|_| Ok(Value::str("str")))
        .add();
    u.method("Norm")
        .param(point.clone())
        .returns(Type::i32())
        .as_static()
        .body(|f| {
            let p = f.arg(0).as_object().ok_or_else(|| Fault::new("Null", "no point"))?;
            let x = p.get("x").map(|v| int(&v)).unwrap_or(0);
            let y = p.get("y").map(|v| int(&v)).unwrap_or(0);
            Ok(Value::I32(x.abs() + y.abs()))
        })
        .add();
    u.method("Describe")
        .param(Type::object())
        .returns(Type::str())
        .as_static()
        .body(|f| Ok(Value::str(format!("{:?}", f.arg(0)))))
        .add();
    let util = u.open_type();

    let mut c = reg.define("Counter", DefKind::Class);
    c.ctor().body(|_| Ok(Value::Unit)).add();
    c.event("Changed");
    let counter = c.open_type();

    let mut r = reg.define("Recorder", DefKind::Class);
    r.ctor().body(|_| Ok(Value::Unit)).add();
    r.field("hits", Type::i32()).add();
    r.method("Hit")
        .param(Type::str())
        .body(|f| {
            let this = f.this()?;
            let hits = this.get("hits").map(|v| int(&v)).unwrap_or(0);
            this.set("hits", Value::I32(hits + 1));
            Ok(Value::Unit)
        })
        .add();
    r.method("Fail")
        .param(Type::str())
        .body(|f| {
            let reason = f.arg(0).as_str().unwrap_or_default();
            Err(Fault::new("HandlerFailed", format!("handler rejected '{reason}'")))
        })
        .add();
    let recorder = r.open_type();

    World {
        reg,
        calculator,
        boxed,
        list,
        int_list,
        util,
        point,
        counter,
        recorder,
    }
}
