//! Fixed adversarial inputs per declared parameter type.
//!
//! Each gauntlet is a deterministic, ordered table: a type-confusion value,
//! boundaries, overflow probes, empties and null. Unknown type names
//! (including `Any`) get a single null.

use fyzz_core::runtime::{Value, MAX_INT, MIN_INT};

/// Length of the long-string probe.
pub const LONG_STRING_LEN: usize = 10_000;

/// The gauntlet for a declared type name.
pub fn fuzz(type_name: &str) -> Vec<Value> {
    match type_name {
        "int" => integers(),
        "str" => strings(),
        "bool" => booleans(),
        "list" => lists(),
        "dict" => dicts(),
        "float" => floats(),
        _ => vec![Value::None],
    }
}

pub fn integers() -> Vec<Value> {
    vec![
        Value::from("not_an_int"),
        Value::Int(MAX_INT),
        Value::Int(MIN_INT),
        Value::Int(0),
        Value::Int(-1),
        Value::Int(1),
        Value::Int(MAX_INT + 1),
        Value::Int(MIN_INT - 1),
    ]
}

pub fn strings() -> Vec<Value> {
    vec![
        Value::Int(12345),
        Value::from(""),
        Value::from("\n"),
        Value::from("\t"),
        Value::from("\0"),
        Value::Str("A".repeat(LONG_STRING_LEN)),
        Value::from("!@#$%^&*()"),
        Value::None,
    ]
}

pub fn booleans() -> Vec<Value> {
    vec![
        Value::from("not_a_bool"),
        Value::Bool(true),
        Value::Bool(false),
        Value::Int(0),
        Value::Int(1),
        Value::None,
    ]
}

pub fn lists() -> Vec<Value> {
    vec![
        Value::List(vec![]),
        Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        Value::List(vec![Value::from("a"), Value::Int(1), Value::Float(2.5)]),
        Value::None,
    ]
}

pub fn dicts() -> Vec<Value> {
    vec![
        Value::Dict(vec![]),
        Value::dict([(Value::from("key"), Value::from("value"))]),
        Value::dict([(Value::from("key"), Value::None)]),
        Value::dict([
            (Value::Int(1), Value::from("one")),
            (Value::Int(2), Value::from("two")),
        ]),
        Value::None,
    ]
}

pub fn floats() -> Vec<Value> {
    vec![
        Value::from("not_a_float"),
        Value::Float(f64::MAX),
        Value::Float(-f64::MAX),
        Value::Float(0.0),
        Value::Float(-1.0),
        Value::Float(1.0),
        Value::Float(f64::MAX * 2.0),
        Value::Float(-f64::MAX * 2.0),
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauntlet_sizes() {
        assert_eq!(fuzz("int").len(), 8);
        assert_eq!(fuzz("str").len(), 8);
        assert_eq!(fuzz("bool").len(), 6);
        assert_eq!(fuzz("list").len(), 4);
        assert_eq!(fuzz("dict").len(), 5);
        assert_eq!(fuzz("float").len(), 8);
    }

    #[test]
    fn unknown_types_get_single_null() {
        assert_eq!(fuzz("Any"), vec![Value::None]);
        assert_eq!(fuzz("Widget"), vec![Value::None]);
        assert_eq!(fuzz("Int"), vec![Value::None]);
    }

    #[test]
    fn int_probes_cross_the_64_bit_range() {
        let values = integers();
        assert_eq!(values[0].type_name(), "str");
        assert_eq!(values[1], Value::Int(i64::MAX as i128));
        assert_eq!(values[6], Value::Int(i64::MAX as i128 + 1));
        assert_eq!(values[7], Value::Int(i64::MIN as i128 - 1));
    }

    #[test]
    fn float_overflow_probes_are_infinite() {
        let values = floats();
        assert_eq!(values[6], Value::Float(f64::INFINITY));
        assert_eq!(values[7], Value::Float(f64::NEG_INFINITY));
    }

    #[test]
    fn dicts_include_non_string_keys() {
        let values = dicts();
        let keys = values[3].as_dict().unwrap();
        assert_eq!(keys[0].0, Value::Int(1));
    }

    #[test]
    fn long_string_probe() {
        assert_eq!(strings()[5].as_str().map(str::len), Some(LONG_STRING_LEN));
    }

    #[test]
    fn deterministic() {
        for ty in ["int", "str", "bool", "list", "dict", "float", "Any"] {
            assert_eq!(fuzz(ty), fuzz(ty), "gauntlet for {} changed", ty);
        }
    }
}
