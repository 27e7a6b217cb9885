//! Flattening the structural model into fuzz targets.
//!
//! Each callable becomes one [`TestEntry`], keyed by a [`CallableKey`] whose
//! dotted form is `module.Class.method` or `module.function`. The key keeps
//! the module/class/name split structurally, so resolution never re-parses
//! the dotted string.
//!
//! Within a module the structural model cannot produce two callables with
//! the same key. If it ever did, the later entry replaces the earlier one in
//! place (last write wins).

use std::fmt;

use fyzz_core::types::{PackageInfo, ParameterInfo};

/// Structural identity of one callable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallableKey {
    pub module: String,
    pub class: Option<String>,
    pub name: String,
}

impl CallableKey {
    pub fn function(module: impl Into<String>, name: impl Into<String>) -> Self {
        CallableKey {
            module: module.into(),
            class: None,
            name: name.into(),
        }
    }

    pub fn method(
        module: impl Into<String>,
        class: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        CallableKey {
            module: module.into(),
            class: Some(class.into()),
            name: name.into(),
        }
    }

    /// `module.Class.method` or `module.function`.
    pub fn dotted(&self) -> String {
        self.to_string()
    }

    /// `module::Class::method`, with `None` standing in for a missing class.
    pub fn code_path(&self) -> String {
        format!(
            "{}::{}::{}",
            self.module,
            self.class.as_deref().unwrap_or("None"),
            self.name
        )
    }
}

impl fmt::Display for CallableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class {
            Some(class) => write!(f, "{}.{}.{}", self.module, class, self.name),
            None => write!(f, "{}.{}", self.module, self.name),
        }
    }
}

/// One callable and its parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct TestEntry {
    pub key: CallableKey,
    pub parameters: Vec<ParameterInfo>,
}

impl TestEntry {
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }
}

/// Ordered fuzz targets for one package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestMap {
    package: String,
    entries: Vec<TestEntry>,
}

impl TestMap {
    pub fn new(package: impl Into<String>) -> Self {
        TestMap {
            package: package.into(),
            entries: Vec::new(),
        }
    }

    /// One entry per callable, in discovery order.
    pub fn build(package: &PackageInfo) -> Self {
        let mut map = TestMap::new(&package.name);
        for (module_name, module) in &package.modules {
            for (class, method) in module.callables() {
                let key = match class {
                    Some(class) => CallableKey::method(module_name, class, &method.name),
                    None => CallableKey::function(module_name, &method.name),
                };
                map.insert(key, method.parameters.clone());
            }
        }
        map
    }

    /// Add an entry; an existing entry with the same key is replaced in
    /// place.
    pub fn insert(&mut self, key: CallableKey, parameters: Vec<ParameterInfo>) {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.parameters = parameters,
            None => self.entries.push(TestEntry { key, parameters }),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn get(&self, dotted: &str) -> Option<&TestEntry> {
        self.entries.iter().find(|e| e.key.dotted() == dotted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True iff any parameter of any entry carries a declared type.
    pub fn has_typed_parameters(&self) -> bool {
        self.entries
            .iter()
            .flat_map(|e| e.parameters.iter())
            .any(ParameterInfo::is_typed)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fyzz_core::types::{MethodInfo, ModuleInfo, ParamKind, ANY_TYPE};

    fn param(name: &str, ty: &str) -> ParameterInfo {
        ParameterInfo {
            name: name.to_string(),
            kind: ParamKind::PositionalOrKeyword,
            default: None,
            param_type: ty.to_string(),
        }
    }

    fn method(name: &str, params: Vec<ParameterInfo>) -> MethodInfo {
        MethodInfo {
            name: name.to_string(),
            parameters: params,
            return_type: "None".to_string(),
            source_file: None,
        }
    }

    fn package() -> PackageInfo {
        let mut module = ModuleInfo::new("pkg.domath");
        module
            .classes
            .entry("ExampleMath".into())
            .or_default()
            .insert("add".into(), method("add", vec![param("a", "int")]));
        module
            .functions
            .insert("helper".into(), method("helper", vec![param("x", ANY_TYPE)]));
        let mut package = PackageInfo::new("pkg", None);
        package.modules.insert(module.name.clone(), module);
        package
    }

    mod keys {
        use super::*;

        #[test]
        fn dotted_forms() {
            assert_eq!(
                CallableKey::method("pkg.domath", "ExampleMath", "add").dotted(),
                "pkg.domath.ExampleMath.add"
            );
            assert_eq!(CallableKey::function("arith", "add").dotted(), "arith.add");
        }

        #[test]
        fn code_path_uses_none_for_functions() {
            assert_eq!(
                CallableKey::function("arith", "add").code_path(),
                "arith::None::add"
            );
            assert_eq!(
                CallableKey::method("m", "C", "f").code_path(),
                "m::C::f"
            );
        }
    }

    mod build {
        use super::*;

        #[test]
        fn one_entry_per_callable() {
            let map = TestMap::build(&package());
            assert_eq!(map.len(), 2);
            assert_eq!(map.package(), "pkg");
            let keys: Vec<_> = map.iter().map(|e| e.key.dotted()).collect();
            assert_eq!(keys, vec!["pkg.domath.ExampleMath.add", "pkg.domath.helper"]);
        }

        #[test]
        fn entries_carry_parameters() {
            let map = TestMap::build(&package());
            let entry = map.get("pkg.domath.ExampleMath.add").unwrap();
            assert_eq!(entry.parameter_names().collect::<Vec<_>>(), vec!["a"]);
        }

        #[test]
        fn duplicate_key_replaces_in_place() {
            let mut map = TestMap::build(&package());
            map.insert(
                CallableKey::method("pkg.domath", "ExampleMath", "add"),
                vec![param("b", "str")],
            );
            assert_eq!(map.len(), 2);
            let first = map.iter().next().unwrap();
            assert_eq!(first.parameters[0].name, "b");
        }
    }

    mod typed_parameters {
        use super::*;

        #[test]
        fn detects_any_typed_parameter() {
            assert!(TestMap::build(&package()).has_typed_parameters());
        }

        #[test]
        fn all_any_is_untyped() {
            let mut map = TestMap::new("u");
            map.insert(CallableKey::function("u", "f"), vec![param("x", ANY_TYPE)]);
            map.insert(CallableKey::function("u", "g"), vec![]);
            assert!(!map.has_typed_parameters());
        }

        #[test]
        fn empty_map_is_untyped() {
            assert!(!TestMap::new("empty").has_typed_parameters());
        }
    }
}
