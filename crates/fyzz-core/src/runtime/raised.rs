//! Raised errors: the signal the fuzzer measures.
//!
//! A callable under test reports failure by returning `Err(Raised)`. A
//! [`Raised`] carries the exception-type name, a message, and an optional
//! captured trace. Whether the type belongs to the host's built-in hierarchy
//! is decided by name against [`STANDARD_EXCEPTIONS`].

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

/// Type name recorded when a callable panics instead of raising.
pub const PANIC_EXCEPTION: &str = "PanicException";

/// Names of the host runtime's built-in exception hierarchy.
pub const STANDARD_EXCEPTIONS: &[&str] = &[
    "BaseException",
    "BaseExceptionGroup",
    "GeneratorExit",
    "KeyboardInterrupt",
    "SystemExit",
    "Exception",
    "ArithmeticError",
    "FloatingPointError",
    "OverflowError",
    "ZeroDivisionError",
    "AssertionError",
    "AttributeError",
    "BufferError",
    "EOFError",
    "ExceptionGroup",
    "ImportError",
    "ModuleNotFoundError",
    "LookupError",
    "IndexError",
    "KeyError",
    "MemoryError",
    "NameError",
    "UnboundLocalError",
    "OSError",
    "BlockingIOError",
    "ChildProcessError",
    "ConnectionError",
    "BrokenPipeError",
    "ConnectionAbortedError",
    "ConnectionRefusedError",
    "ConnectionResetError",
    "FileExistsError",
    "FileNotFoundError",
    "InterruptedError",
    "IsADirectoryError",
    "NotADirectoryError",
    "PermissionError",
    "ProcessLookupError",
    "TimeoutError",
    "ReferenceError",
    "RuntimeError",
    "NotImplementedError",
    "RecursionError",
    "StopAsyncIteration",
    "StopIteration",
    "SyntaxError",
    "IndentationError",
    "TabError",
    "SystemError",
    "TypeError",
    "ValueError",
    "UnicodeError",
    "UnicodeDecodeError",
    "UnicodeEncodeError",
    "UnicodeTranslateError",
    "Warning",
    "BytesWarning",
    "DeprecationWarning",
    "EncodingWarning",
    "FutureWarning",
    "ImportWarning",
    "PendingDeprecationWarning",
    "ResourceWarning",
    "RuntimeWarning",
    "SyntaxWarning",
    "UnicodeWarning",
    "UserWarning",
    PANIC_EXCEPTION,
];

/// True iff `type_name` belongs to the built-in exception hierarchy.
pub fn is_standard_exception(type_name: &str) -> bool {
    STANDARD_EXCEPTIONS.contains(&type_name)
}

// ============================================================================
// Raised
// ============================================================================

/// An error raised by a callable under test.
#[derive(Debug, Clone, PartialEq)]
pub struct Raised {
    type_name: String,
    message: String,
    trace: Option<String>,
}

impl Raised {
    /// Raise an error of the given type.
    ///
    /// A backtrace is captured when the environment enables one
    /// (`RUST_BACKTRACE`); otherwise the trace is left for the caller to fill.
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        let backtrace = Backtrace::capture();
        let trace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };
        Raised {
            type_name: type_name.into(),
            message: message.into(),
            trace,
        }
    }

    /// Raise a library-defined (non built-in) error type.
    pub fn custom(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Raised::new(type_name, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Raised::new("TypeError", message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Raised::new("ValueError", message)
    }

    pub fn overflow_error(message: impl Into<String>) -> Self {
        Raised::new("OverflowError", message)
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Raised::new("ZeroDivisionError", message)
    }

    pub fn key_error(message: impl Into<String>) -> Self {
        Raised::new("KeyError", message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Raised::new("IndexError", message)
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Raised::new("AttributeError", message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Raised::new("NotImplementedError", message)
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Raised::new("RuntimeError", message)
    }

    pub fn timeout_error(message: impl Into<String>) -> Self {
        Raised::new("TimeoutError", message)
    }

    /// Replace the captured trace.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    /// Whether this error's type is part of the built-in hierarchy.
    pub fn is_standard(&self) -> bool {
        is_standard_exception(&self.type_name)
    }
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.type_name)
        } else {
            write!(f, "{}: {}", self.type_name, self.message)
        }
    }
}

impl std::error::Error for Raised {}

// ============================================================================
// Tests
// ============================================================================
