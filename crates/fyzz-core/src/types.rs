//! Data model shared by the analyzer, engine and exporters.
//!
//! Two families of types live here:
//! - **Structure**: [`ParameterInfo`], [`MethodInfo`], [`ModuleInfo`],
//!   [`PackageInfo`]. Built once per analysis, read-only afterwards.
//! - **Results**: [`FuzzCase`], [`MethodResult`], [`FuzzResult`] and the
//!   [`ExceptionTally`]. Produced by one fuzzing run, then handed to
//!   exporters.
//!
//! Maps are `BTreeMap` so iteration (and therefore discovery order and
//! serialized output) is deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::runtime::{Args, Value};

/// Declared type name recorded for an unannotated parameter.
pub const ANY_TYPE: &str = "Any";

/// Return type recorded for an unannotated callable.
pub const NONE_TYPE: &str = "None";

// ============================================================================
// Structure
// ============================================================================

/// How a parameter binds to call arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

impl ParamKind {
    /// `*args` or `**kwargs`.
    pub fn is_variadic(self) -> bool {
        matches!(self, ParamKind::VarPositional | ParamKind::VarKeyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::PositionalOnly => "POSITIONAL_ONLY",
            ParamKind::PositionalOrKeyword => "POSITIONAL_OR_KEYWORD",
            ParamKind::VarPositional => "VAR_POSITIONAL",
            ParamKind::KeywordOnly => "KEYWORD_ONLY",
            ParamKind::VarKeyword => "VAR_KEYWORD",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analyzed parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    pub kind: ParamKind,
    /// Declared default, if any.
    pub default: Option<Value>,
    /// Declared type name, [`ANY_TYPE`] when unannotated.
    pub param_type: String,
}

impl ParameterInfo {
    /// True iff the parameter carries a declared type.
    pub fn is_typed(&self) -> bool {
        self.param_type != ANY_TYPE
    }
}

/// One analyzed function or instance method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodInfo {
    pub name: String,
    #[serde(rename = "params")]
    pub parameters: Vec<ParameterInfo>,
    /// Declared return type name, [`NONE_TYPE`] when unannotated.
    pub return_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl MethodInfo {
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }
}

/// Classes and functions declared in one module.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    /// class name -> method name -> method.
    pub classes: BTreeMap<String, BTreeMap<String, MethodInfo>>,
    /// Module-level functions, unparented.
    pub functions: BTreeMap<String, MethodInfo>,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleInfo {
            name: name.into(),
            ..ModuleInfo::default()
        }
    }

    /// Every callable in discovery order: class methods first (by class,
    /// then method name), then functions. Functions carry no class.
    pub fn callables(&self) -> impl Iterator<Item = (Option<&str>, &MethodInfo)> {
        let methods = self.classes.iter().flat_map(|(class, methods)| {
            methods
                .values()
                .map(move |method| (Some(class.as_str()), method))
        });
        let functions = self.functions.values().map(|function| (None, function));
        methods.chain(functions)
    }

    pub fn callable_count(&self) -> usize {
        self.classes.values().map(BTreeMap::len).sum::<usize>() + self.functions.len()
    }
}

/// Structural model of an analyzed package.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageInfo {
    pub name: String,
    /// Source file the package was registered from.
    pub root_path: Option<String>,
    /// Fully-qualified module name -> module.
    pub modules: BTreeMap<String, ModuleInfo>,
}

impl PackageInfo {
    pub fn new(name: impl Into<String>, root_path: Option<String>) -> Self {
        PackageInfo {
            name: name.into(),
            root_path,
            modules: BTreeMap::new(),
        }
    }

    pub fn callable_count(&self) -> usize {
        self.modules.values().map(ModuleInfo::callable_count).sum()
    }
}

// ============================================================================
// Results
// ============================================================================

/// One invocation record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzCase {
    /// Every declared parameter; exactly one is fuzzed, the rest are null.
    pub inputs: Args,
    pub return_value: Option<Value>,
    pub exception: Option<String>,
    pub exception_type: Option<String>,
    /// Base64 of the captured trace.
    pub exception_traceback: Option<String>,
    pub is_standard_exception: Option<bool>,
    /// Base64 of the callable's registered source.
    pub encoded_source: Option<String>,
    pub improved_source: Option<String>,
}

impl FuzzCase {
    pub fn new(inputs: Args, encoded_source: Option<String>) -> Self {
        FuzzCase {
            inputs,
            return_value: None,
            exception: None,
            exception_type: None,
            exception_traceback: None,
            is_standard_exception: None,
            encoded_source,
            improved_source: None,
        }
    }

    pub fn raised(&self) -> bool {
        self.exception_type.is_some()
    }
}

/// Cases recorded for one resolved callable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodResult {
    /// Short callable name.
    pub method_name: String,
    /// Dotted path the callable was resolved from.
    pub path: String,
    pub test_cases: Vec<FuzzCase>,
}

impl MethodResult {
    pub fn new(method_name: impl Into<String>, path: impl Into<String>) -> Self {
        MethodResult {
            method_name: method_name.into(),
            path: path.into(),
            test_cases: Vec::new(),
        }
    }
}

/// Output of one fuzzing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FuzzResult {
    pub package_name: String,
    pub results: Vec<MethodResult>,
}

impl FuzzResult {
    pub fn new(package_name: impl Into<String>) -> Self {
        FuzzResult {
            package_name: package_name.into(),
            results: Vec::new(),
        }
    }

    pub fn case_count(&self) -> usize {
        self.results.iter().map(|r| r.test_cases.len()).sum()
    }

    pub fn method(&self, path: &str) -> Option<&MethodResult> {
        self.results.iter().find(|r| r.path == path)
    }
}

/// Occurrences per raised exception type, accumulated across a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExceptionTally(BTreeMap<String, usize>);

impl ExceptionTally {
    pub fn new() -> Self {
        ExceptionTally::default()
    }

    pub fn record(&mut self, type_name: &str) {
        *self.0.entry(type_name.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, type_name: &str) -> usize {
        self.0.get(type_name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, params: &[(&str, &str)]) -> MethodInfo {
        MethodInfo {
            name: name.to_string(),
            parameters: params
                .iter()
                .map(|(n, t)| ParameterInfo {
                    name: n.to_string(),
                    kind: ParamKind::PositionalOrKeyword,
                    default: None,
                    param_type: t.to_string(),
                })
                .collect(),
            return_type: NONE_TYPE.to_string(),
            source_file: None,
        }
    }

    mod param_kind {
        use super::*;

        #[test]
        fn serializes_as_screaming_snake_case() {
            let json = serde_json::to_string(&ParamKind::PositionalOrKeyword).unwrap();
            assert_eq!(json, "\"POSITIONAL_OR_KEYWORD\"");
            assert_eq!(ParamKind::VarKeyword.to_string(), "VAR_KEYWORD");
        }

        #[test]
        fn variadic_kinds() {
            assert!(ParamKind::VarPositional.is_variadic());
            assert!(ParamKind::VarKeyword.is_variadic());
            assert!(!ParamKind::KeywordOnly.is_variadic());
        }
    }

    mod structure {
        use super::*;

        #[test]
        fn callables_list_methods_before_functions() {
            let mut module = ModuleInfo::new("pkg.m");
            module.functions.insert("f".into(), method("f", &[]));
            module
                .classes
                .entry("B".into())
                .or_default()
                .insert("run".into(), method("run", &[]));
            module
                .classes
                .entry("A".into())
                .or_default()
                .insert("go".into(), method("go", &[]));

            let order: Vec<_> = module
                .callables()
                .map(|(class, m)| (class.map(str::to_string), m.name.clone()))
                .collect();
            assert_eq!(
                order,
                vec![
                    (Some("A".to_string()), "go".to_string()),
                    (Some("B".to_string()), "run".to_string()),
                    (None, "f".to_string()),
                ]
            );
            assert_eq!(module.callable_count(), 3);
        }

        #[test]
        fn package_counts_callables_across_modules() {
            let mut package = PackageInfo::new("pkg", None);
            let mut a = ModuleInfo::new("pkg.a");
            a.functions.insert("f".into(), method("f", &[("x", "int")]));
            let mut b = ModuleInfo::new("pkg.b");
            b.functions
                .insert("g".into(), method("g", &[("y", ANY_TYPE), ("z", "str")]));
            package.modules.insert(a.name.clone(), a);
            package.modules.insert(b.name.clone(), b);

            let typed: Vec<_> = package
                .modules
                .values()
                .flat_map(ModuleInfo::callables)
                .flat_map(|(_, m)| m.parameters.iter())
                .filter(|p| p.is_typed())
                .map(|p| p.name.as_str())
                .collect();
            assert_eq!(typed, vec!["x", "z"]);
            assert_eq!(package.callable_count(), 2);
        }

        #[test]
        fn method_info_serializes_params_key() {
            let json = serde_json::to_value(method("f", &[("x", "int")])).unwrap();
            assert_eq!(json["params"][0]["param_type"], "int");
            assert_eq!(json["params"][0]["default"], serde_json::Value::Null);
            assert_eq!(json["return_type"], "None");
            assert!(json.get("source_file").is_none());
        }
    }

    mod results {
        use super::*;

        #[test]
        fn tally_counts_per_type() {
            let mut tally = ExceptionTally::new();
            tally.record("TypeError");
            tally.record("TypeError");
            tally.record("ValueError");
            assert_eq!(tally.count("TypeError"), 2);
            assert_eq!(tally.count("KeyError"), 0);
            assert_eq!(tally.total(), 3);
            let json = serde_json::to_string(&tally).unwrap();
            assert_eq!(json, "{\"TypeError\":2,\"ValueError\":1}");
        }

        #[test]
        fn fuzz_case_serializes_absent_fields_as_null() {
            let case = FuzzCase::new(Args::nulled(["a"]), None);
            let json = serde_json::to_value(&case).unwrap();
            assert_eq!(json["inputs"]["a"], serde_json::Value::Null);
            assert_eq!(json["exception_type"], serde_json::Value::Null);
            assert_eq!(json["is_standard_exception"], serde_json::Value::Null);
            assert!(!case.raised());
        }

        #[test]
        fn case_count_sums_methods() {
            let mut result = FuzzResult::new("pkg");
            let mut first = MethodResult::new("f", "pkg.f");
            first
                .test_cases
                .push(FuzzCase::new(Args::nulled(["a"]), None));
            let mut second = MethodResult::new("g", "pkg.g");
            second
                .test_cases
                .push(FuzzCase::new(Args::nulled(["b"]), None));
            second
                .test_cases
                .push(FuzzCase::new(Args::nulled(["b"]), None));
            result.results.push(first);
            result.results.push(second);
            assert_eq!(result.case_count(), 3);
            assert_eq!(result.method("pkg.g").map(|m| m.test_cases.len()), Some(2));
        }
    }
}
