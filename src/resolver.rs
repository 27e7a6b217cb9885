//! Turning fuzz targets back into live callables.
//!
//! [`PathResolver`] takes a [`CallableKey`] (or a raw dotted path), imports
//! the module through an explicit [`ModuleCache`], and binds the callable:
//! module functions directly, methods off a zero-argument instance.
//!
//! Classes that cannot be instantiated without arguments are skipped, not
//! failed:
//! - abstract classes ([`SkipReason::Abstract`])
//! - classes whose initializer has a required parameter
//!   ([`SkipReason::RequiredConstructorArgs`])

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use fyzz_core::runtime::{
    CallFn, ClassObject, ImportError, Inspectable, Member, ModuleObject, Raised, Reflector,
};

use crate::guard::call_guarded;
use crate::test_map::CallableKey;

// ============================================================================
// Module Cache
// ============================================================================

/// Process-scoped module cache with load-once semantics.
///
/// Failed imports are not cached, so a later lookup retries.
#[derive(Debug, Default)]
pub struct ModuleCache {
    modules: HashMap<String, Arc<ModuleObject>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        ModuleCache::default()
    }

    /// Return the cached module, importing it on first use.
    pub fn get_or_import<R: Reflector + ?Sized>(
        &mut self,
        reflector: &R,
        name: &str,
    ) -> Result<Arc<ModuleObject>, ImportError> {
        if let Some(module) = self.modules.get(name) {
            return Ok(Arc::clone(module));
        }
        let module = reflector.import_module(name)?;
        debug!("imported module {}", name);
        self.modules.insert(name.to_string(), Arc::clone(&module));
        Ok(module)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

// ============================================================================
// Resolution Outcomes
// ============================================================================

/// Why a callable was left out of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The class declares unimplemented required members.
    Abstract { class: String },
    /// The class initializer has parameters without defaults.
    RequiredConstructorArgs { class: String, args: Vec<String> },
}

impl SkipReason {
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::Abstract { .. } => "abstract",
            SkipReason::RequiredConstructorArgs { .. } => "required-constructor-args",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Abstract { class } => write!(f, "{}: class {}", self.code(), class),
            SkipReason::RequiredConstructorArgs { class, args } => {
                write!(f, "{}: class {} needs {:?}", self.code(), class, args)
            }
        }
    }
}

/// A callable ready to invoke.
#[derive(Clone)]
pub struct BoundCallable {
    pub key: CallableKey,
    pub callable: Arc<CallFn>,
    /// Registered source text, if any.
    pub source: Option<String>,
}

impl fmt::Debug for BoundCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundCallable")
            .field("key", &self.key)
            .field("source", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Bound(BoundCallable),
    Skip(SkipReason),
}

/// Resolution failed for one callable. Never fatal to a run.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid callable path '{path}'")]
    InvalidPath { path: String },

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("module '{module}' has no class '{class}'")]
    ClassNotFound { module: String, class: String },

    #[error("'{owner}' has no callable attribute '{name}'")]
    AttributeNotFound { owner: String, name: String },

    #[error("constructing {class} raised {raised}")]
    Construction { class: String, raised: Raised },
}

// ============================================================================
// Path Resolver
// ============================================================================

/// Binds fuzz targets to live callables.
pub struct PathResolver<'a, R: Reflector + ?Sized> {
    reflector: &'a R,
    cache: &'a mut ModuleCache,
}

impl<'a, R: Reflector + ?Sized> PathResolver<'a, R> {
    pub fn new(reflector: &'a R, cache: &'a mut ModuleCache) -> Self {
        PathResolver { reflector, cache }
    }

    /// Resolve a raw dotted path.
    ///
    /// The last segment is the callable; the one before it is a class only
    /// when the path has more than two segments. If that reading finds no
    /// such class, the path is retried as `module.function`.
    pub fn resolve(&mut self, dotted: &str) -> Result<Resolution, ResolveError> {
        let parts: Vec<&str> = dotted.split('.').collect();
        if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(ResolveError::InvalidPath {
                path: dotted.to_string(),
            });
        }
        let name = parts[parts.len() - 1];
        let as_function = CallableKey::function(parts[..parts.len() - 1].join("."), name);
        if parts.len() == 2 {
            return self.resolve_key(&as_function);
        }

        let as_method = CallableKey::method(
            parts[..parts.len() - 2].join("."),
            parts[parts.len() - 2],
            name,
        );
        match self.resolve_key(&as_method) {
            Err(ResolveError::ClassNotFound { .. })
            | Err(ResolveError::Import(ImportError::ModuleNotFound { .. })) => {
                self.resolve_key(&as_function)
            }
            other => other,
        }
    }

    /// Resolve a structural key.
    pub fn resolve_key(&mut self, key: &CallableKey) -> Result<Resolution, ResolveError> {
        let module = self.cache.get_or_import(self.reflector, &key.module)?;
        match &key.class {
            Some(class_name) => self.bind_method(&module, class_name, key),
            None => self.bind_function(&module, key),
        }
    }

    fn bind_function(
        &self,
        module: &ModuleObject,
        key: &CallableKey,
    ) -> Result<Resolution, ResolveError> {
        match module.attribute(&key.name) {
            Some(Member::Function(function)) => Ok(Resolution::Bound(BoundCallable {
                key: key.clone(),
                callable: function.body(),
                source: function.source().map(str::to_string),
            })),
            _ => Err(ResolveError::AttributeNotFound {
                owner: module.name().to_string(),
                name: key.name.clone(),
            }),
        }
    }

    fn bind_method(
        &self,
        module: &ModuleObject,
        class_name: &str,
        key: &CallableKey,
    ) -> Result<Resolution, ResolveError> {
        let class = match module.attribute(class_name) {
            Some(Member::Class(class)) => Arc::clone(class),
            _ => {
                return Err(ResolveError::ClassNotFound {
                    module: module.name().to_string(),
                    class: class_name.to_string(),
                })
            }
        };

        if let Some(reason) = self.skip_reason(&class) {
            debug!("skipping {}: {}", key, reason);
            return Ok(Resolution::Skip(reason));
        }

        let method = class
            .method_named(&key.name)
            .ok_or_else(|| ResolveError::AttributeNotFound {
                owner: format!("{}.{}", module.name(), class_name),
                name: key.name.clone(),
            })?;

        let instance =
            call_guarded(|| class.instantiate()).map_err(|raised| ResolveError::Construction {
                class: class_name.to_string(),
                raised,
            })?;

        Ok(Resolution::Bound(BoundCallable {
            key: key.clone(),
            callable: method.bind(instance),
            source: method.source().map(str::to_string),
        }))
    }

    fn skip_reason(&self, class: &ClassObject) -> Option<SkipReason> {
        if self.reflector.is_abstract(class) {
            return Some(SkipReason::Abstract {
                class: class.name().to_string(),
            });
        }
        let required = class.init_signature().required_params();
        if !required.is_empty() {
            return Some(SkipReason::RequiredConstructorArgs {
                class: class.name().to_string(),
                args: required.into_iter().map(str::to_string).collect(),
            });
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
