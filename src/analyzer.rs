//! Structural analysis of an importable package.
//!
//! [`PackageAnalyzer`] walks a package through a [`Reflector`] and produces a
//! [`PackageInfo`]: module -> class (or none) -> callable -> parameters.
//!
//! - Packages contribute their direct submodules only (one level, no
//!   recursion). A package with no submodules is analyzed as a module.
//! - Classes count only in the module that declares them; re-exports are
//!   skipped.
//! - The implicit receiver is dropped from method parameter lists.
//! - Unannotated parameters get type `Any`; unannotated returns get `None`.

use thiserror::Error;
use tracing::{debug, error, info};

use fyzz_core::runtime::{ImportError, Inspectable, Member, ModuleObject, Reflector};
use fyzz_core::types::{MethodInfo, ModuleInfo, PackageInfo, ParameterInfo, ANY_TYPE, NONE_TYPE};

/// Analysis failed.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The package or one of its submodules could not be imported.
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Builds the structural model of a package.
pub struct PackageAnalyzer<'r, R: Reflector + ?Sized> {
    reflector: &'r R,
    ignore_private: bool,
}

impl<'r, R: Reflector + ?Sized> PackageAnalyzer<'r, R> {
    pub fn new(reflector: &'r R) -> Self {
        PackageAnalyzer {
            reflector,
            ignore_private: false,
        }
    }

    /// Skip callables whose names start with `_`.
    pub fn ignore_private(mut self, ignore: bool) -> Self {
        self.ignore_private = ignore;
        self
    }

    /// True iff `name` is in the set of importable top-level names.
    ///
    /// This is a membership check, not an import: a listed package can still
    /// fail in [`analyze`](Self::analyze).
    pub fn verify_importable(&self, name: &str) -> bool {
        let importable = self.reflector.is_importable(name);
        if !importable {
            error!(
                "package {} is not in the list of importable modules/packages",
                name
            );
        }
        importable
    }

    /// Import `name` and build its structural model.
    pub fn analyze(&self, name: &str) -> Result<PackageInfo, AnalyzeError> {
        let root = self.reflector.import_module(name).inspect_err(|e| {
            error!("error importing package {}: {}", name, e);
        })?;
        let mut package = PackageInfo::new(name, root.source_file().map(str::to_string));

        let submodules = self.reflector.list_submodules(&root);
        if submodules.is_empty() {
            self.analyze_module(&root, &mut package);
        } else {
            for short in submodules {
                let full = format!("{}.{}", name, short);
                let module = self.reflector.import_module(&full).inspect_err(|e| {
                    error!("error importing submodule {}: {}", full, e);
                })?;
                self.analyze_module(&module, &mut package);
            }
        }

        info!(
            "analyzed {}: {} module(s), {} callable(s)",
            name,
            package.modules.len(),
            package.callable_count()
        );
        Ok(package)
    }

    fn analyze_module(&self, module: &ModuleObject, package: &mut PackageInfo) {
        let module_name = module.name();
        let mut info = ModuleInfo::new(module_name);

        for member in self.reflector.list_members(module) {
            match member {
                Member::Class(class) => {
                    if class.module() != module_name {
                        debug!(
                            "skipping {} in {}: declared in {}",
                            class.name(),
                            module_name,
                            class.module()
                        );
                        continue;
                    }
                    let methods = info.classes.entry(class.name().to_string()).or_default();
                    for method in class.methods() {
                        if self.is_skipped(method.name()) {
                            continue;
                        }
                        methods.insert(method.name().to_string(), self.method_info(method));
                    }
                }
                Member::Function(function) => {
                    if self.is_skipped(function.name()) {
                        continue;
                    }
                    info.functions.insert(
                        function.name().to_string(),
                        self.method_info(&*function),
                    );
                }
            }
        }

        package.modules.insert(module_name.to_string(), info);
    }

    fn is_skipped(&self, name: &str) -> bool {
        self.ignore_private && name.starts_with('_')
    }

    fn method_info(&self, callable: &dyn Inspectable) -> MethodInfo {
        let signature = self.reflector.get_signature(callable);
        let parameters = signature
            .explicit_params()
            .map(|param| ParameterInfo {
                name: param.name.clone(),
                kind: param.kind,
                default: param.default.clone(),
                param_type: param
                    .annotation
                    .clone()
                    .unwrap_or_else(|| ANY_TYPE.to_string()),
            })
            .collect();
        MethodInfo {
            name: callable.name().to_string(),
            parameters,
            return_type: signature
                .returns
                .clone()
                .unwrap_or_else(|| NONE_TYPE.to_string()),
            source_file: callable.source_file().map(str::to_string),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fyzz_core::runtime::{ClassObject, FunctionObject, MethodObject, Param, Registry, Value};
    use fyzz_core::types::ParamKind;
    use std::sync::Arc;

    #[derive(Default)]
    struct Shape;

    fn registry() -> Registry {
        let shape = ClassObject::new::<Shape>("Shape", "geo.shapes")
            .method(
                MethodObject::new::<Shape, _>("area", |_, _| Ok(Value::Float(1.0)))
                    .param(Param::typed("scale", "float"))
                    .returns("float"),
            )
            .method(MethodObject::new::<Shape, _>("_hidden", |_, _| Ok(Value::None)));
        let shape = Arc::new(shape);

        let mut registry = Registry::new();
        registry
            .register(ModuleObject::package("geo"))
            .register(
                ModuleObject::module("geo.shapes")
                    .import_class(Arc::clone(&shape))
                    .function(
                        FunctionObject::new("scale", |_| Ok(Value::None))
                            .param(Param::typed("factor", "int"))
                            .param(Param::untyped("label").with_default("x"))
                            .param(Param::untyped("rest").with_kind(ParamKind::VarPositional)),
                    ),
            )
            .register(ModuleObject::module("geo.reexport").import_class(shape))
            .register(ModuleObject::module("flat").function(FunctionObject::new(
                "_private",
                |_| Ok(Value::None),
            )))
            .register_broken("geo_broken", "boom");
        registry
    }

    mod importability {
        use super::*;

        #[test]
        fn verify_is_membership_only() {
            let registry = registry();
            let analyzer = PackageAnalyzer::new(&registry);
            assert!(analyzer.verify_importable("geo"));
            assert!(analyzer.verify_importable("geo_broken"));
            assert!(!analyzer.verify_importable("nope"));
        }

        #[test]
        fn broken_package_fails_analysis() {
            let registry = registry();
            let err = PackageAnalyzer::new(&registry)
                .analyze("geo_broken")
                .unwrap_err();
            assert!(matches!(err, AnalyzeError::Import(ImportError::LoadFailed { .. })));
        }
    }

    mod structure {
        use super::*;

        #[test]
        fn package_lists_direct_submodules() {
            let registry = registry();
            let package = PackageAnalyzer::new(&registry).analyze("geo").unwrap();
            let modules: Vec<_> = package.modules.keys().cloned().collect();
            assert_eq!(modules, vec!["geo.reexport", "geo.shapes"]);
        }

        #[test]
        fn reexported_classes_are_excluded() {
            let registry = registry();
            let package = PackageAnalyzer::new(&registry).analyze("geo").unwrap();
            assert!(package.modules["geo.reexport"].classes.is_empty());
            assert!(package.modules["geo.shapes"].classes.contains_key("Shape"));
        }

        #[test]
        fn receiver_is_dropped_and_types_recorded() {
            let registry = registry();
            let package = PackageAnalyzer::new(&registry).analyze("geo").unwrap();
            let area = &package.modules["geo.shapes"].classes["Shape"]["area"];
            assert_eq!(area.parameters.len(), 1);
            assert_eq!(area.parameters[0].name, "scale");
            assert_eq!(area.parameters[0].param_type, "float");
            assert_eq!(area.return_type, "float");
            assert!(area.source_file.is_some());
        }

        #[test]
        fn unannotated_fallbacks() {
            let registry = registry();
            let package = PackageAnalyzer::new(&registry).analyze("geo").unwrap();
            let scale = &package.modules["geo.shapes"].functions["scale"];
            assert_eq!(scale.return_type, "None");
            assert_eq!(scale.parameters[1].param_type, "Any");
            assert_eq!(scale.parameters[1].default, Some(Value::from("x")));
            assert_eq!(scale.parameters[2].kind, ParamKind::VarPositional);
        }

        #[test]
        fn single_module_is_analyzed_directly() {
            let registry = registry();
            let package = PackageAnalyzer::new(&registry).analyze("flat").unwrap();
            assert_eq!(package.modules.len(), 1);
            assert!(package.modules["flat"].functions.contains_key("_private"));
        }
    }

    mod private_filter {
        use super::*;

        #[test]
        fn ignore_private_skips_underscored_names() {
            let registry = registry();
            let analyzer = PackageAnalyzer::new(&registry).ignore_private(true);
            let geo = analyzer.analyze("geo").unwrap();
            assert!(!geo.modules["geo.shapes"].classes["Shape"].contains_key("_hidden"));
            let flat = analyzer.analyze("flat").unwrap();
            assert!(flat.modules["flat"].functions.is_empty());
        }

        #[test]
        fn private_names_are_kept_by_default() {
            let registry = registry();
            let geo = PackageAnalyzer::new(&registry).analyze("geo").unwrap();
            assert!(geo.modules["geo.shapes"].classes["Shape"].contains_key("_hidden"));
        }
    }
}
