//! `pyfyzzexample`: a package whose `domath` submodule holds `ExampleMath`.
//!
//! `example_add` trusts its inputs; `example_subtract` checks them and
//! returns null on anything that is not an int.

use fyzz_core::runtime::{ClassObject, MethodObject, ModuleObject, Param, Registry, Value};

pub const PACKAGE: &str = "pyfyzzexample";
pub const DOMATH: &str = "pyfyzzexample.domath";

#[derive(Debug, Default)]
pub struct ExampleMath;

pub fn register(registry: &mut Registry) {
    let example_math = ClassObject::new::<ExampleMath>("ExampleMath", DOMATH)
        .method(
            MethodObject::new::<ExampleMath, _>("__init__", |_, _| Ok(Value::None))
                .returns("None")
                .with_source("def __init__(self) -> None:\n    pass\n"),
        )
        .method(
            MethodObject::new::<ExampleMath, _>("example_add", |_, args| {
                Ok(Value::Int(args.int("a")? + args.int("b")?))
            })
            .param(Param::typed("a", "int"))
            .param(Param::typed("b", "int"))
            .returns("int")
            .with_source("def example_add(self, a: int, b: int) -> int:\n    return int(a + b)\n"),
        )
        .method(
            MethodObject::new::<ExampleMath, _>("example_subtract", |_, args| {
                match (args.value("x").as_int(), args.value("y").as_int()) {
                    (Some(x), Some(y)) => Ok(Value::Int(x - y)),
                    _ => Ok(Value::None),
                }
            })
            .param(Param::typed("x", "int"))
            .param(Param::typed("y", "int"))
            .returns("int")
            .with_source(
                "def example_subtract(self, x: int, y: int) -> int:\n    \
                 if not isinstance(x, int) or not isinstance(y, int):\n        \
                 return None\n    return int(x - y)\n",
            ),
        );

    registry
        .register(ModuleObject::package(PACKAGE))
        .register(ModuleObject::module(DOMATH).class(example_math));
}
