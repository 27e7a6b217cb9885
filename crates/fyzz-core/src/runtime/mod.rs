//! Host runtime for the callables under test.
//!
//! - [`value`]: dynamic values passed to and returned from callables
//! - [`args`]: keyword argument mappings
//! - [`raised`]: raised errors and the built-in exception table
//! - [`object`]: modules, classes, functions, methods
//! - [`reflect`]: the [`Reflector`] capability
//! - [`registry`]: static registration implementing [`Reflector`]

pub mod args;
pub mod object;
pub mod raised;
pub mod reflect;
pub mod registry;
pub mod value;

pub use args::Args;
pub use object::{
    CallFn, ClassObject, FunctionObject, Inspectable, Instance, Member, MethodObject,
    ModuleObject, Param, Signature, RECEIVER,
};
pub use raised::{is_standard_exception, Raised, PANIC_EXCEPTION, STANDARD_EXCEPTIONS};
pub use reflect::{ImportError, Reflector};
pub use registry::Registry;
pub use value::{Value, MAX_INT, MIN_INT};
