//! `arith`: a single module of functions that never raise on the int
//! gauntlet.

use fyzz_core::runtime::{FunctionObject, ModuleObject, Param, Registry, Value};

pub const MODULE: &str = "arith";

pub fn register(registry: &mut Registry) {
    registry.register(
        ModuleObject::module(MODULE)
            .function(
                // Non-int operands count as zero.
                FunctionObject::new("add", |args| {
                    let a = args.value("a").as_int().unwrap_or(0);
                    let b = args.value("b").as_int().unwrap_or(0);
                    Ok(Value::Int(a.saturating_add(b)))
                })
                .param(Param::typed("a", "int"))
                .param(Param::typed("b", "int"))
                .returns("int")
                .with_source("def add(a: int, b: int) -> int:\n    return _as_int(a) + _as_int(b)\n"),
            )
            .function(
                FunctionObject::new("subtract", |args| {
                    match (args.value("x").as_int(), args.value("y").as_int()) {
                        (Some(x), Some(y)) => Ok(Value::Int(x.saturating_sub(y))),
                        _ => Ok(Value::None),
                    }
                })
                .param(Param::typed("x", "int"))
                .param(Param::typed("y", "int"))
                .returns("int")
                .with_source(
                    "def subtract(x: int, y: int) -> int:\n    \
                     if not isinstance(x, int) or not isinstance(y, int):\n        \
                     return None\n    return x - y\n",
                ),
            ),
    );
}
