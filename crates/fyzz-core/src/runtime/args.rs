//! Keyword argument mappings passed to callables.
//!
//! [`Args`] is an ordered `name -> Value` mapping. The engine builds one per
//! fuzz case with every declared parameter present; callables read their
//! parameters through the typed accessors, which raise `TypeError` the way a
//! host builtin would when handed a value of the wrong type.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::raised::Raised;
use super::value::Value;

static NONE: Value = Value::None;

/// Ordered keyword arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    entries: Vec<(String, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Args::default()
    }

    /// Mapping with every name bound to `None`.
    pub fn nulled<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Args {
            entries: names
                .into_iter()
                .map(|name| (name.into(), Value::None))
                .collect(),
        }
    }

    /// Bind `name` to `value`, replacing an existing binding in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder form of [`Args::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// The bound value, or `None` when the name is absent.
    pub fn value(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&NONE)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names whose bound value is not `None`.
    pub fn non_null_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, v)| !v.is_none())
            .map(|(n, _)| n.as_str())
            .collect()
    }

    // ------------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------------

    pub fn int(&self, name: &str) -> Result<i128, Raised> {
        let value = self.value(name);
        value.as_int().ok_or_else(|| expected(name, "int", value))
    }

    pub fn float(&self, name: &str) -> Result<f64, Raised> {
        match self.value(name) {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(expected(name, "float", other)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, Raised> {
        let value = self.value(name);
        value.as_bool().ok_or_else(|| expected(name, "bool", value))
    }

    pub fn str(&self, name: &str) -> Result<&str, Raised> {
        let value = self.value(name);
        value.as_str().ok_or_else(|| expected(name, "str", value))
    }

    pub fn list(&self, name: &str) -> Result<&[Value], Raised> {
        let value = self.value(name);
        value.as_list().ok_or_else(|| expected(name, "list", value))
    }

    pub fn dict(&self, name: &str) -> Result<&[(Value, Value)], Raised> {
        let value = self.value(name);
        value.as_dict().ok_or_else(|| expected(name, "dict", value))
    }
}

fn expected(name: &str, type_name: &str, got: &Value) -> Raised {
    Raised::type_error(format!(
        "argument '{}' must be {}, not {}",
        name,
        type_name,
        got.type_name()
    ))
}

impl Serialize for Args {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut args = Args::new();
        for (name, value) in iter {
            args.set(name, value);
        }
        args
    }
}

// ============================================================================
// Tests
// ============================================================================
