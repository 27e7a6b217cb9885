//! The reflection capability the fuzzer is written against.
//!
//! Everything the analyzer and resolver need from the host goes through
//! [`Reflector`]: importability checks, module import, member listing,
//! signatures, and abstractness. The only implementation shipped here is the
//! static [`Registry`](super::registry::Registry); the trait is the seam for
//! any other source of inspectable callables.

use std::sync::Arc;

use thiserror::Error;

use super::object::{ClassObject, Inspectable, Member, ModuleObject, Signature};

/// A module could not be imported.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    /// No module with this name exists.
    #[error("no module named '{module}'")]
    ModuleNotFound { module: String },

    /// The module exists but failed while loading.
    #[error("module '{module}' failed to load: {reason}")]
    LoadFailed { module: String, reason: String },
}

impl ImportError {
    /// Name of the module that failed.
    pub fn module(&self) -> &str {
        match self {
            ImportError::ModuleNotFound { module } => module,
            ImportError::LoadFailed { module, .. } => module,
        }
    }
}

/// Host reflection capability.
pub trait Reflector {
    /// True iff `name` is in the enumerable set of loadable top-level
    /// modules. This is a membership check, not an import attempt.
    fn is_importable(&self, name: &str) -> bool;

    /// Load a module by fully-qualified name.
    fn import_module(&self, name: &str) -> Result<Arc<ModuleObject>, ImportError>;

    /// Short names of a package's direct submodules, in sorted order.
    fn list_submodules(&self, package: &ModuleObject) -> Vec<String>;

    /// Attributes visible in a module, including imported classes.
    fn list_members(&self, module: &ModuleObject) -> Vec<Member> {
        module.members().to_vec()
    }

    /// Declared signature of a function or method.
    fn get_signature(&self, callable: &dyn Inspectable) -> Signature {
        callable.signature().clone()
    }

    /// True iff the class leaves required members unimplemented.
    fn is_abstract(&self, class: &ClassObject) -> bool {
        !class.abstract_members().is_empty()
    }
}
