//! Dynamic values exchanged with callables under test.
//!
//! The fuzz gauntlets deliberately hand callables values of the "wrong" type,
//! so arguments and return values travel as a dynamically typed [`Value`]
//! rather than as Rust types fixed at compile time.
//!
//! ## Integer width
//!
//! `Value::Int` holds an `i128`. The host's native integer is `i64`
//! ([`MAX_INT`] / [`MIN_INT`]); the extra width lets the overflow and
//! underflow probes (`MAX_INT + 1`, `MIN_INT - 1`) exist as values.
//!
//! ## Serialization
//!
//! Values serialize to the JSON data model with a few lossy edges:
//! - integers outside the `i64`/`u64` range serialize as decimal strings
//! - non-finite floats serialize as `"Infinity"`, `"-Infinity"`, `"NaN"`
//! - dictionary keys are stringified (`1` -> `"1"`, `None` -> `"null"`)
//! - stringified keys can collide: a dict holding both `1` and `"1"` emits
//!   the key `"1"` twice, and readers keep only one of the entries

use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Largest native host integer.
pub const MAX_INT: i128 = i64::MAX as i128;

/// Smallest native host integer.
pub const MIN_INT: i128 = i64::MIN as i128;

// ============================================================================
// Value
// ============================================================================

/// A dynamically typed host value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The null value.
    #[default]
    None,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Insertion-ordered key/value pairs. Keys may be any value.
    Dict(Vec<(Value, Value)>),
}

impl Value {
    /// Host type name of this value (`NoneType`, `bool`, `int`, ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Dict(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Build a dictionary from key/value pairs.
    pub fn dict<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Value
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Dict(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// String form used when a value appears as a serialized mapping key.
    pub fn key_string(&self) -> String {
        match self {
            Value::None => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i as i128)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i128)
    }
}

impl From<i128> for Value {
    fn from(i: i128) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::None)
    }
}

// ============================================================================
// Display (host repr)
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", float_repr(*x)),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Float repr that always reads back as a float (`1.0`, `inf`, `1.5e308`).
fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = x.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        return format!("{:e}", x);
    }
    let s = x.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{}.0", s)
    }
}

// ============================================================================
// Serialization
// ============================================================================

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::None => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => {
                if let Ok(small) = i64::try_from(*i) {
                    serializer.serialize_i64(small)
                } else if let Ok(big) = u64::try_from(*i) {
                    serializer.serialize_u64(big)
                } else {
                    serializer.serialize_str(&i.to_string())
                }
            }
            Value::Float(x) if x.is_nan() => serializer.serialize_str("NaN"),
            Value::Float(x) if x.is_infinite() => {
                serializer.serialize_str(if *x > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(&k.key_string(), v)?;
                }
                map.end()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
