//! `textkit`: a small text utility package with every shape the harness
//! has to cope with.
//!
//! - `textkit.strings`: string helpers raising built-in and `TextkitError`
//!   errors, plus a private helper.
//! - `textkit.collections`: list/dict/float/bool helpers and one function
//!   that panics on out-of-range input.
//! - `textkit.shapes`: an abstract class, a class whose constructor needs an
//!   argument, and a plain `Counter`.
//! - `textkit.reexport`: imports `Counter` without declaring anything.

use std::sync::Arc;

use fyzz_core::runtime::{
    Args, ClassObject, FunctionObject, MethodObject, ModuleObject, Param, Raised, Registry, Value,
};

pub const PACKAGE: &str = "textkit";
pub const STRINGS: &str = "textkit.strings";
pub const COLLECTIONS: &str = "textkit.collections";
pub const SHAPES: &str = "textkit.shapes";
pub const REEXPORT: &str = "textkit.reexport";

/// The package's own error type.
pub const TEXTKIT_ERROR: &str = "TextkitError";

const SLOTS: [i64; 3] = [10, 20, 30];

fn textkit_error(message: impl Into<String>) -> Raised {
    Raised::custom(TEXTKIT_ERROR, message)
}

pub fn register(registry: &mut Registry) {
    let counter = Arc::new(counter_class());
    registry
        .register(ModuleObject::package(PACKAGE))
        .register(strings())
        .register(collections())
        .register(
            ModuleObject::module(SHAPES)
                .class(shape_class())
                .class(tokenizer_class())
                .import_class(Arc::clone(&counter)),
        )
        .register(ModuleObject::module(REEXPORT).import_class(counter));
}

// ============================================================================
// textkit.strings
// ============================================================================

fn strings() -> ModuleObject {
    ModuleObject::module(STRINGS)
        .function(
            FunctionObject::new("shout", |args| {
                Ok(Value::from(format!("{}!", args.str("text")?.to_uppercase())))
            })
            .param(Param::typed("text", "str"))
            .returns("str")
            .with_source("def shout(text: str) -> str:\n    return text.upper() + \"!\"\n"),
        )
        .function(
            FunctionObject::new("initials", |args| {
                let name = args.str("name")?;
                let letters: String = name
                    .split_whitespace()
                    .filter_map(|word| word.chars().next())
                    .collect();
                if letters.is_empty() {
                    return Err(textkit_error("name has no words"));
                }
                Ok(Value::from(letters.to_uppercase()))
            })
            .param(Param::typed("name", "str"))
            .returns("str"),
        )
        .function(
            FunctionObject::new("repeat", |args| {
                let text = args.str("text")?;
                let times = args.int("times")?;
                if times < 0 {
                    return Err(Raised::value_error("times must be non-negative"));
                }
                if times.saturating_mul(text.len() as i128) > 1 << 20 {
                    return Err(Raised::overflow_error("repeated string is too long"));
                }
                Ok(Value::from(text.repeat(times as usize)))
            })
            .param(Param::typed("text", "str"))
            .param(Param::typed("times", "int"))
            .returns("str"),
        )
        .function(
            FunctionObject::new("_normalize", |args| {
                Ok(Value::from(args.str("text")?.trim().to_lowercase()))
            })
            .param(Param::typed("text", "str"))
            .returns("str"),
        )
}

// ============================================================================
// textkit.collections
// ============================================================================

fn collections() -> ModuleObject {
    ModuleObject::module(COLLECTIONS)
        .function(
            FunctionObject::new("head", |args| {
                args.list("items")?
                    .first()
                    .cloned()
                    .ok_or_else(|| Raised::index_error("list index out of range"))
            })
            .param(Param::typed("items", "list")),
        )
        .function(
            FunctionObject::new("lookup", |args| {
                let table = args.dict("table")?;
                let key = Value::from(args.str("key")?);
                table
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| Raised::key_error(format!("'{}'", key.key_string())))
            })
            .param(Param::typed("table", "dict"))
            .param(Param::typed("key", "str")),
        )
        .function(
            FunctionObject::new("ratio", |args| {
                let x = args.float("x")?;
                let y = args.float("y")?;
                if y == 0.0 {
                    return Err(Raised::zero_division("float division by zero"));
                }
                Ok(Value::Float(x / y))
            })
            .param(Param::typed("x", "float"))
            .param(Param::typed("y", "float"))
            .returns("float"),
        )
        .function(
            FunctionObject::new("toggle", |args| Ok(Value::Bool(!args.bool("flag")?)))
                .param(Param::typed("flag", "bool"))
                .returns("bool"),
        )
        .function(
            // Indexes without a bounds check.
            FunctionObject::new("slot", |args| {
                let index = usize::try_from(args.int("index")?).unwrap_or(usize::MAX);
                Ok(Value::from(SLOTS[index]))
            })
            .param(Param::typed("index", "int"))
            .returns("int"),
        )
        .function(FunctionObject::new("_scratch", |_: &Args| Ok(Value::None)))
}

// ============================================================================
// textkit.shapes
// ============================================================================

#[derive(Debug, Default)]
pub struct Shape;

#[derive(Debug, Default)]
pub struct Tokenizer {
    vocabulary: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Counter;

fn shape_class() -> ClassObject {
    ClassObject::new::<Shape>("Shape", SHAPES)
        .abstract_method("area", vec![])
        .method(
            MethodObject::new::<Shape, _>("describe", |_, args| {
                Ok(Value::from(format!("shape {}", args.str("label")?)))
            })
            .param(Param::typed("label", "str")),
        )
}

fn tokenizer_class() -> ClassObject {
    ClassObject::new::<Tokenizer>("Tokenizer", SHAPES)
        .init_param(Param::typed("vocabulary", "list"))
        .method(
            MethodObject::new::<Tokenizer, _>("tokenize", |this, args| {
                let words = args
                    .str("text")?
                    .split_whitespace()
                    .filter(|w| this.vocabulary.iter().any(|v| v == w))
                    .map(Value::from)
                    .collect();
                Ok(Value::List(words))
            })
            .param(Param::typed("text", "str"))
            .returns("list"),
        )
}

fn counter_class() -> ClassObject {
    ClassObject::new::<Counter>("Counter", SHAPES)
        .method(
            MethodObject::new::<Counter, _>("count", |_, args| {
                let text = args.str("text")?;
                let needle = args.str("needle")?;
                if needle.is_empty() {
                    return Err(textkit_error("needle must not be empty"));
                }
                Ok(Value::from(text.matches(needle).count() as i64))
            })
            .param(Param::typed("text", "str"))
            .param(Param::typed("needle", "str"))
            .returns("int")
            .with_source(
                "def count(self, text: str, needle: str) -> int:\n    \
                 if not needle:\n        raise TextkitError(\"needle must not be empty\")\n    \
                 return text.count(needle)\n",
            ),
        )
        .method(MethodObject::new::<Counter, _>("_reset", |_, _| Ok(Value::None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fyzz_core::runtime::{Member, Reflector};

    fn module(name: &str) -> Arc<ModuleObject> {
        let mut registry = Registry::new();
        register(&mut registry);
        registry.import_module(name).unwrap()
    }

    fn call(module_name: &str, function: &str, args: Args) -> Result<Value, Raised> {
        match module(module_name).attribute(function) {
            Some(Member::Function(f)) => f.call(&args),
            _ => panic!("{}.{} not registered", module_name, function),
        }
    }

    #[test]
    fn builtin_and_custom_raises() {
        let err = call(STRINGS, "shout", Args::new().with("text", 5i64)).unwrap_err();
        assert_eq!(err.type_name(), "TypeError");
        let err = call(STRINGS, "initials", Args::new().with("name", " ")).unwrap_err();
        assert_eq!(err.type_name(), TEXTKIT_ERROR);
        assert!(!err.is_standard());
    }

    #[test]
    fn collections_behave() {
        assert_eq!(
            call(COLLECTIONS, "toggle", Args::new().with("flag", true)).unwrap(),
            Value::Bool(false)
        );
        let err = call(
            COLLECTIONS,
            "ratio",
            Args::new().with("x", 1.0).with("y", 0.0),
        )
        .unwrap_err();
        assert_eq!(err.type_name(), "ZeroDivisionError");
        assert_eq!(
            call(COLLECTIONS, "slot", Args::new().with("index", 1i64)).unwrap(),
            Value::Int(20)
        );
    }

    #[test]
    fn counter_is_declared_in_shapes_only() {
        let reexport = module(REEXPORT);
        match reexport.attribute("Counter") {
            Some(Member::Class(class)) => assert_eq!(class.module(), SHAPES),
            _ => panic!("Counter not visible in reexport"),
        }
    }
}
