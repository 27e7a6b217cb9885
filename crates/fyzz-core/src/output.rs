//! JSON output types for CLI responses and export payloads.
//!
//! ## Conventions
//!
//! 1. **Status first:** every response starts with `status`
//! 2. **Deterministic:** same input gives the same bytes (maps are ordered)
//! 3. **Nullable vs absent:** explicit `null` for "no value"
//! 4. **Versioned:** `schema_version` on every response
//!
//! Besides the responses, this module holds the two export payloads: the
//! nested [`PackageReport`] (structure) and the [`FuzzResult`] itself, with
//! flattened row views ([`StructureRow`], [`ResultRow`]) in the shape a
//! tabular store would ingest.

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;

use crate::error::{FyzzError, OutputErrorCode};
use crate::runtime::{Args, Value};
use crate::types::{
    ExceptionTally, FuzzResult, MethodInfo, PackageInfo, ParamKind, ParameterInfo,
};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Structure Report
// ============================================================================

/// Nested structure export: package -> module -> class -> methods.
///
/// Module-level functions are listed under the class name `""`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageReport {
    pub package_name: String,
    pub root_path: Option<String>,
    pub modules: BTreeMap<String, ModuleReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleReport {
    pub classes: BTreeMap<String, ClassReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassReport {
    pub methods: Vec<MethodInfo>,
}

impl From<&PackageInfo> for PackageReport {
    fn from(package: &PackageInfo) -> Self {
        let modules = package
            .modules
            .iter()
            .map(|(name, module)| {
                let mut report = ModuleReport::default();
                for (class, method) in module.callables() {
                    report
                        .classes
                        .entry(class.unwrap_or_default().to_string())
                        .or_default()
                        .methods
                        .push(method.clone());
                }
                (name.clone(), report)
            })
            .collect();
        PackageReport {
            package_name: package.name.clone(),
            root_path: package.root_path.clone(),
            modules,
        }
    }
}

/// One parameter of one callable (or one parameterless callable).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureRow {
    pub module_name: String,
    pub class_name: String,
    pub method_name: String,
    pub param_name: Option<String>,
    pub param_kind: Option<ParamKind>,
    pub param_default: Option<Value>,
    pub param_type: Option<String>,
    pub return_type: String,
}

impl PackageReport {
    /// Flatten into one row per parameter. Callables without parameters get
    /// a single row with the parameter columns null.
    pub fn rows(&self) -> Vec<StructureRow> {
        let mut rows = Vec::new();
        for (module_name, module) in &self.modules {
            for (class_name, class) in &module.classes {
                for method in &class.methods {
                    let row = |param: Option<&ParameterInfo>| StructureRow {
                        module_name: module_name.clone(),
                        class_name: class_name.clone(),
                        method_name: method.name.clone(),
                        param_name: param.map(|p| p.name.clone()),
                        param_kind: param.map(|p| p.kind),
                        param_default: param.and_then(|p| p.default.clone()),
                        param_type: param.map(|p| p.param_type.clone()),
                        return_type: method.return_type.clone(),
                    };
                    if method.parameters.is_empty() {
                        rows.push(row(None));
                    } else {
                        rows.extend(method.parameters.iter().map(|p| row(Some(p))));
                    }
                }
            }
        }
        rows
    }
}

// ============================================================================
// Result Rows
// ============================================================================

/// One test case, flattened with its callable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub package_name: String,
    pub method_name: String,
    pub path: String,
    pub inputs: Args,
    pub return_value: Option<Value>,
    pub exception: Option<String>,
    pub exception_type: Option<String>,
    pub is_standard_exception: Option<bool>,
    pub encoded_source: Option<String>,
    pub improved_source: Option<String>,
}

impl FuzzResult {
    /// Flatten into one row per test case, in discovery order.
    pub fn rows(&self) -> Vec<ResultRow> {
        self.results
            .iter()
            .flat_map(|method| {
                method.test_cases.iter().map(move |case| ResultRow {
                    package_name: self.package_name.clone(),
                    method_name: method.method_name.clone(),
                    path: method.path.clone(),
                    inputs: case.inputs.clone(),
                    return_value: case.return_value.clone(),
                    exception: case.exception.clone(),
                    exception_type: case.exception_type.clone(),
                    is_standard_exception: case.is_standard_exception,
                    encoded_source: case.encoded_source.clone(),
                    improved_source: case.improved_source.clone(),
                })
            })
            .collect()
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Response for `fyzz list`.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub status: String,
    pub schema_version: String,
    /// Importable top-level package and module names.
    pub packages: Vec<String>,
}

impl ListResponse {
    pub fn new(packages: Vec<String>) -> Self {
        ListResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            packages,
        }
    }
}

/// Response for `fyzz analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub schema_version: String,
    pub callables: usize,
    pub structure: PackageReport,
}

impl AnalyzeResponse {
    pub fn new(package: &PackageInfo) -> Self {
        AnalyzeResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            callables: package.callable_count(),
            structure: PackageReport::from(package),
        }
    }
}

/// Summary response for `fyzz scan`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub status: String,
    pub schema_version: String,
    pub run_id: String,
    pub started_at: String,
    pub package: String,
    /// Distinct callables that produced at least one case.
    pub callables_fuzzed: usize,
    pub cases: usize,
    pub exceptions: ExceptionTally,
    /// Files written by the exporter.
    pub exports: Vec<String>,
}

/// Error information.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn from_error(err: &FyzzError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let details = match err {
            FyzzError::PackageNotFound { package } => {
                Some(serde_json::json!({ "package": package }))
            }
            FyzzError::ImportFailed { module, .. } => {
                Some(serde_json::json!({ "module": module }))
            }
            FyzzError::NoTypedParameters { package } => {
                Some(serde_json::json!({ "package": package }))
            }
            FyzzError::ExportFailed { path, .. } => Some(serde_json::json!({ "path": path })),
            FyzzError::InvalidArguments { .. } | FyzzError::InternalError { .. } => None,
        };
        ErrorInfo {
            code,
            message: err.to_string(),
            details,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &FyzzError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Response Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for the CLI.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
