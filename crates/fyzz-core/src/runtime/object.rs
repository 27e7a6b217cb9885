//! Runtime object model: modules, classes, functions, methods.
//!
//! These are the live objects the [`Reflector`](super::reflect::Reflector)
//! hands out. Functions and methods wrap Rust closures over [`Args`]; classes
//! carry a zero-argument factory, their initializer signature, and the names
//! of any required members they leave unimplemented.
//!
//! Registration sites are recorded with `#[track_caller]`, so every function,
//! method and class knows the source file it was declared in.

use std::any::Any;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use super::args::Args;
use super::raised::Raised;
use super::value::Value;
use crate::types::ParamKind;

/// Name of the implicit receiver parameter on method signatures.
pub const RECEIVER: &str = "self";

/// A constructed class instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A callable body taking keyword arguments.
pub type CallFn = dyn Fn(&Args) -> Result<Value, Raised> + Send + Sync;

/// A method body taking the receiver and keyword arguments.
pub type MethodFn = dyn Fn(&Instance, &Args) -> Result<Value, Raised> + Send + Sync;

type Factory = dyn Fn() -> Result<Instance, Raised> + Send + Sync;

// ============================================================================
// Signatures
// ============================================================================

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// Declared type annotation, if any.
    pub annotation: Option<String>,
    /// Declared default, if any.
    pub default: Option<Value>,
}

impl Param {
    /// Positional-or-keyword parameter annotated with `type_name`.
    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            kind: ParamKind::PositionalOrKeyword,
            annotation: Some(type_name.into()),
            default: None,
        }
    }

    /// Positional-or-keyword parameter without an annotation.
    pub fn untyped(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            kind: ParamKind::PositionalOrKeyword,
            annotation: None,
            default: None,
        }
    }

    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    fn receiver() -> Self {
        Param::untyped(RECEIVER)
    }
}

/// A callable's declared signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
    /// Declared return annotation, if any.
    pub returns: Option<String>,
}

impl Signature {
    /// Parameters other than the implicit receiver.
    pub fn explicit_params(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| p.name != RECEIVER)
    }

    /// Non-receiver parameters that have no default and are not variadic.
    pub fn required_params(&self) -> Vec<&str> {
        self.explicit_params()
            .filter(|p| p.default.is_none() && !p.kind.is_variadic())
            .map(|p| p.name.as_str())
            .collect()
    }
}

/// Read access shared by functions and methods.
pub trait Inspectable {
    fn name(&self) -> &str;
    fn signature(&self) -> &Signature;
    /// Source text registered for the callable.
    fn source(&self) -> Option<&str>;
    /// File the callable was registered from.
    fn source_file(&self) -> Option<&str>;
}

// ============================================================================
// Functions
// ============================================================================

/// A module-level function.
#[derive(Clone)]
pub struct FunctionObject {
    name: String,
    signature: Signature,
    source: Option<String>,
    source_file: Option<String>,
    body: Arc<CallFn>,
}

impl FunctionObject {
    #[track_caller]
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Args) -> Result<Value, Raised> + Send + Sync + 'static,
    {
        FunctionObject {
            name: name.into(),
            signature: Signature::default(),
            source: None,
            source_file: Some(Location::caller().file().to_string()),
            body: Arc::new(body),
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.signature.params.push(param);
        self
    }

    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.signature.returns = Some(type_name.into());
        self
    }

    pub fn with_source(mut self, text: impl Into<String>) -> Self {
        self.source = Some(text.into());
        self
    }

    pub fn call(&self, args: &Args) -> Result<Value, Raised> {
        (self.body)(args)
    }

    /// Shared handle to the body.
    pub fn body(&self) -> Arc<CallFn> {
        Arc::clone(&self.body)
    }
}

impl Inspectable for FunctionObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }
}

impl fmt::Debug for FunctionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionObject")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Methods
// ============================================================================

/// An instance method. Its signature starts with the receiver.
#[derive(Clone)]
pub struct MethodObject {
    name: String,
    signature: Signature,
    source: Option<String>,
    source_file: Option<String>,
    body: Arc<MethodFn>,
}

impl MethodObject {
    /// Method on instances of `T`.
    ///
    /// The receiver is downcast to `T`; a receiver of another type raises
    /// `TypeError`.
    #[track_caller]
    pub fn new<T, F>(name: impl Into<String>, body: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &Args) -> Result<Value, Raised> + Send + Sync + 'static,
    {
        let name = name.into();
        let method_name = name.clone();
        let wrapped = move |instance: &Instance, args: &Args| match (**instance).downcast_ref::<T>()
        {
            Some(this) => body(this, args),
            None => Err(Raised::type_error(format!(
                "descriptor '{}' requires a '{}' object",
                method_name,
                std::any::type_name::<T>()
            ))),
        };
        MethodObject {
            name,
            signature: Signature {
                params: vec![Param::receiver()],
                returns: None,
            },
            source: None,
            source_file: Some(Location::caller().file().to_string()),
            body: Arc::new(wrapped),
        }
    }

    /// Method whose body receives the raw instance.
    #[track_caller]
    pub fn from_fn<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Instance, &Args) -> Result<Value, Raised> + Send + Sync + 'static,
    {
        MethodObject {
            name: name.into(),
            signature: Signature {
                params: vec![Param::receiver()],
                returns: None,
            },
            source: None,
            source_file: Some(Location::caller().file().to_string()),
            body: Arc::new(body),
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.signature.params.push(param);
        self
    }

    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.signature.returns = Some(type_name.into());
        self
    }

    pub fn with_source(mut self, text: impl Into<String>) -> Self {
        self.source = Some(text.into());
        self
    }

    /// Bind the method to an instance, producing a plain callable.
    pub fn bind(&self, instance: Instance) -> Arc<CallFn> {
        let body = Arc::clone(&self.body);
        Arc::new(move |args: &Args| body(&instance, args))
    }
}

impl Inspectable for MethodObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }
}

impl fmt::Debug for MethodObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodObject")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Classes
// ============================================================================

/// A class: initializer signature, factory, methods.
#[derive(Clone)]
pub struct ClassObject {
    name: String,
    module: String,
    init: Signature,
    abstract_members: Vec<String>,
    factory: Arc<Factory>,
    methods: Vec<MethodObject>,
}

impl ClassObject {
    /// Class declared in `module` whose instances are `T::default()`.
    pub fn new<T>(name: impl Into<String>, module: impl Into<String>) -> Self
    where
        T: Default + Any + Send + Sync,
    {
        ClassObject {
            name: name.into(),
            module: module.into(),
            init: Signature {
                params: vec![Param::receiver()],
                returns: None,
            },
            abstract_members: Vec::new(),
            factory: Arc::new(|| Ok(Arc::new(T::default()) as Instance)),
            methods: Vec::new(),
        }
    }

    /// Replace the zero-argument factory; an `Err` models an initializer
    /// that raises.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Instance, Raised> + Send + Sync + 'static,
    {
        self.factory = Arc::new(factory);
        self
    }

    /// Add an initializer parameter.
    pub fn init_param(mut self, param: Param) -> Self {
        self.init.params.push(param);
        self
    }

    pub fn method(mut self, method: MethodObject) -> Self {
        self.methods.push(method);
        self
    }

    /// Declare a required member the class leaves unimplemented.
    ///
    /// The method is still listed (and analyzed); its body raises
    /// `NotImplementedError`.
    #[track_caller]
    pub fn abstract_method(mut self, name: impl Into<String>, params: Vec<Param>) -> Self {
        let name = name.into();
        let message = format!("{}.{} is abstract", self.name, name);
        let mut method = MethodObject::from_fn(name.clone(), move |_: &Instance, _: &Args| {
            Err(Raised::not_implemented(message.clone()))
        });
        for param in params {
            method = method.param(param);
        }
        self.methods.push(method);
        self.abstract_members.push(name);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the module the class is declared in.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn init_signature(&self) -> &Signature {
        &self.init
    }

    pub fn abstract_members(&self) -> &[String] {
        &self.abstract_members
    }

    pub fn methods(&self) -> &[MethodObject] {
        &self.methods
    }

    pub fn method_named(&self, name: &str) -> Option<&MethodObject> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Construct an instance with no arguments.
    pub fn instantiate(&self) -> Result<Instance, Raised> {
        (self.factory)()
    }
}

impl fmt::Debug for ClassObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassObject")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("init", &self.init)
            .field("abstract_members", &self.abstract_members)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Modules
// ============================================================================

/// A module attribute.
#[derive(Debug, Clone)]
pub enum Member {
    Class(Arc<ClassObject>),
    Function(Arc<FunctionObject>),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Class(class) => class.name(),
            Member::Function(function) => function.name(),
        }
    }
}

/// A loaded module.
#[derive(Debug, Clone)]
pub struct ModuleObject {
    name: String,
    is_package: bool,
    source_file: Option<String>,
    members: Vec<Member>,
}

impl ModuleObject {
    /// A single-file module.
    #[track_caller]
    pub fn module(name: impl Into<String>) -> Self {
        ModuleObject {
            name: name.into(),
            is_package: false,
            source_file: Some(Location::caller().file().to_string()),
            members: Vec::new(),
        }
    }

    /// A package: a module whose submodules can be enumerated.
    #[track_caller]
    pub fn package(name: impl Into<String>) -> Self {
        ModuleObject {
            is_package: true,
            ..ModuleObject::module(name)
        }
    }

    pub fn function(mut self, function: FunctionObject) -> Self {
        self.members.push(Member::Function(Arc::new(function)));
        self
    }

    pub fn class(mut self, class: ClassObject) -> Self {
        self.members.push(Member::Class(Arc::new(class)));
        self
    }

    /// Make a class declared elsewhere visible in this module.
    pub fn import_class(mut self, class: Arc<ClassObject>) -> Self {
        self.members.push(Member::Class(class));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_package(&self) -> bool {
        self.is_package
    }

    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Look up an attribute by name. The last binding of a name wins.
    pub fn attribute(&self, name: &str) -> Option<&Member> {
        self.members.iter().rev().find(|m| m.name() == name)
    }
}
