//! Static registration of inspectable packages.
//!
//! Rust cannot import code by name at run time, so packages under test are
//! registered up front as [`ModuleObject`] trees. The [`Registry`] is the
//! compiled table the [`Reflector`] operations read from.
//!
//! A module name containing no `.` is top-level; `a.b` is a submodule of the
//! package `a`. A module may be registered as *broken*: it is listed (so
//! [`Reflector::is_importable`] reports it) but importing it fails, the way a
//! module with a failing import-time side effect behaves.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::object::ModuleObject;
use super::reflect::{ImportError, Reflector};

enum Entry {
    Loaded(Arc<ModuleObject>),
    Broken { reason: String },
}

/// Compiled table of registered modules.
#[derive(Default)]
pub struct Registry {
    modules: BTreeMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register a module. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, module: ModuleObject) -> &mut Self {
        debug!("registering module {}", module.name());
        self.modules
            .insert(module.name().to_string(), Entry::Loaded(Arc::new(module)));
        self
    }

    /// Register a module that fails when imported.
    pub fn register_broken(
        &mut self,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> &mut Self {
        self.modules.insert(
            name.into(),
            Entry::Broken {
                reason: reason.into(),
            },
        );
        self
    }

    /// Top-level module and package names, sorted.
    pub fn top_level_names(&self) -> Vec<&str> {
        self.modules
            .keys()
            .filter(|name| !name.contains('.'))
            .map(String::as_str)
            .collect()
    }
}

impl Reflector for Registry {
    fn is_importable(&self, name: &str) -> bool {
        !name.contains('.') && self.modules.contains_key(name)
    }

    fn import_module(&self, name: &str) -> Result<Arc<ModuleObject>, ImportError> {
        match self.modules.get(name) {
            Some(Entry::Loaded(module)) => Ok(Arc::clone(module)),
            Some(Entry::Broken { reason }) => Err(ImportError::LoadFailed {
                module: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(ImportError::ModuleNotFound {
                module: name.to_string(),
            }),
        }
    }

    fn list_submodules(&self, package: &ModuleObject) -> Vec<String> {
        if !package.is_package() {
            return Vec::new();
        }
        let prefix = format!("{}.", package.name());
        self.modules
            .keys()
            .filter_map(|name| name.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('.'))
            .map(str::to_string)
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
