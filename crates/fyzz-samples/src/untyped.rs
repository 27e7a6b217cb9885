//! `untyped`: nothing carries a declared type.

use fyzz_core::runtime::{ClassObject, FunctionObject, MethodObject, ModuleObject, Param, Registry, Value};

pub const MODULE: &str = "untyped";

#[derive(Debug, Default)]
pub struct Bag;

pub fn register(registry: &mut Registry) {
    let bag = ClassObject::new::<Bag>("Bag", MODULE).method(
        MethodObject::new::<Bag, _>("put", |_, args| Ok(args.value("item").clone()))
            .param(Param::untyped("item")),
    );

    registry.register(
        ModuleObject::module(MODULE)
            .class(bag)
            .function(
                FunctionObject::new("echo", |args| Ok(args.value("value").clone()))
                    .param(Param::untyped("value")),
            )
            .function(
                FunctionObject::new("combine", |args| {
                    Ok(Value::List(vec![
                        args.value("a").clone(),
                        args.value("b").clone(),
                    ]))
                })
                .param(Param::untyped("a"))
                .param(Param::untyped("b")),
            ),
    );
}
