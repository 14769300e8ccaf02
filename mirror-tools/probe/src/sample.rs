//! The sample registry the probe runs against.

use mirror::error::Fault;
use mirror::host::{DefKind, Registry};
use mirror::ty::Type;
use mirror::value::Value;

fn int(v: &Value) -> i32 {
    v.as_i32().unwrap_or(0)
}

/// Types registered:
///
/// - `Calculator`: `Add` overloads on `i32` and `str`, `Divide` (faults on
///   zero)
/// - `Box<T>`: `new(T)`, property `Value: T`
/// - `List<T>` and `IntList : List<i32>`: `Add(T)`, property `Count`
/// - `Util`: static `Identity<T>(T) -> T`, `Describe(object)`,
///   `Repeat(str, i32)`
/// - `Counter`: event `Changed`, `Increment() -> i32`
pub fn registry() -> Registry {
    let mut reg = Registry::new();

    let mut calc = reg.define("Calculator", DefKind::Class);
    calc.ctor().body(|_| Ok(Value::Unit)).add();
    calc.method("Add")
        .params([Type::i32(), Type::i32()])
        .returns(Type::i32())
        .body(|f| {
            int(f.arg(0))
                .checked_add(int(f.arg(1)))
                .map(Value::I32)
                .ok_or_else(|| Fault::new("Overflow", "arithmetic operation overflowed"))
        })
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
        .body(|f| {
            int(f.arg(0))
                .checked_div(int(f.arg(1)))
                .map(Value::I32)
                .ok_or_else(|| Fault::new("DivideByZero", "attempted to divide by zero"))
        })
        .add();

    let mut b = reg.define("Box", DefKind::Class);
    let t = b.generic("T");
    b.ctor()
        .param(t.clone())
        .body(|f| {
            f.this()?.set("value", f.arg(0).clone());
            Ok(Value::Unit)
        })
        .add();
    b.field("value", t.clone())
        .visibility(mirror::member::Visibility::Private)
        .add();
    b.property("Value", t)
        .getter(|f| Ok(f.this()?.get("value").unwrap_or(Value::Null)))
        .setter(|f| {
            f.this()?.set("value", f.arg(0).clone());
            Ok(Value::Unit)
        })
        .add();

    let mut l = reg.define("List", DefKind::Class);
    let t = l.generic("T");
    l.ctor().body(|_| Ok(Value::Unit)).add();
    l.field("count", Type::i32()).add();
    l.method("Add")
        .param(t)
        .body(|f| {
            let this = f.this()?;
            let count = this.get("count").map(|v| int(&v)).unwrap_or(0);
            this.set("count", Value::I32(count + 1));
            Ok(Value::Unit)
        })
        .add();
    l.property("Count", Type::i32())
        .getter(|f| Ok(f.this()?.get("count").unwrap_or(Value::I32(0))))
        .add();
    let list = l.id();

    let mut il = reg.define("IntList", DefKind::Class);
    il.base(Type::adt(list, vec![Type::i32()]));
    il.ctor().body(|_| Ok(Value::Unit)).add();

    let mut u = reg.define("Util", DefKind::Class);
    {
        let mut m = u.method("Identity");
        let t = m.generic("T");
        m.param(t.clone())
            .returns(t)
            .as_static()
            .body(|f| Ok(f.arg(0).clone()))
            .add();
    }
    u.method("Describe")
        .param(Type::object())
        .returns(Type::str())
        .as_static()
        .body(|f| {
            let ty = f.arg(0).type_of();
            let name = ty.map(|t| f.host.type_name(&t)).unwrap_or_else(|| "null".to_string());
            Ok(Value::str(format!("{:?}: {name}", f.arg(0))))
        })
        .add();
    u.method("Repeat")
        .params([Type::str(), Type::i32()])
        .returns(Type::str())
        .as_static()
        .body(|f| {
            let times = usize::try_from(int(f.arg(1)))
                .map_err(|_| Fault::new("ArgumentOutOfRange", "count must not be negative"))?;
            Ok(Value::str(f.arg(0).as_str().unwrap_or_default().repeat(times)))
        })
        .add();

    let mut c = reg.define("Counter", DefKind::Class);
    c.ctor().body(|_| Ok(Value::Unit)).add();
    c.field("count", Type::i32()).add();
    c.event("Changed");
    c.method("Increment")
        .returns(Type::i32())
        .body(|f| {
            let this = f.this()?;
            let count = this.get("count").map(|v| int(&v)).unwrap_or(0) + 1;
            this.set("count", Value::I32(count));
            Ok(Value::I32(count))
        })
        .add();

    reg
}
