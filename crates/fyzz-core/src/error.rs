//! Error types and error codes for fyzz.
//!
//! `FyzzError` is the single error type rendered in CLI output. Subsystem
//! errors are bridged into it with `From`; those living in this crate are
//! bridged here, the rest in the root crate's `error_bridges` module.
//!
//! ## Exit codes
//!
//! - `2`: invalid arguments or configuration
//! - `3`: the package (or one of its submodules) could not be imported
//! - `4`: nothing in the package carries a declared parameter type
//! - `5`: writing an export file failed
//! - `10`: internal error

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::runtime::ImportError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable numeric codes for JSON error responses and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Bad input from the caller.
    InvalidArguments = 2,
    /// Package or module import failed.
    ImportFailure = 3,
    /// The run refused to start: no typed parameters.
    NoTypedParameters = 4,
    /// An exporter failed.
    ExportFailure = 5,
    /// Bugs, unexpected state.
    InternalError = 10,
}

impl OutputErrorCode {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum FyzzError {
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// The name is not in the set of importable packages.
    #[error("package '{package}' is not importable")]
    PackageNotFound { package: String },

    #[error("import of '{module}' failed: {message}")]
    ImportFailed { module: String, message: String },

    #[error("no declared parameter types in '{package}'; fuzzing skipped")]
    NoTypedParameters { package: String },

    #[error("export to {path} failed: {message}")]
    ExportFailed { path: String, message: String },

    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl FyzzError {
    pub fn invalid_args(message: impl Into<String>) -> Self {
        FyzzError::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        FyzzError::InternalError {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

impl From<&FyzzError> for OutputErrorCode {
    fn from(err: &FyzzError) -> Self {
        match err {
            FyzzError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            FyzzError::PackageNotFound { .. } => OutputErrorCode::ImportFailure,
            FyzzError::ImportFailed { .. } => OutputErrorCode::ImportFailure,
            FyzzError::NoTypedParameters { .. } => OutputErrorCode::NoTypedParameters,
            FyzzError::ExportFailed { .. } => OutputErrorCode::ExportFailure,
            FyzzError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<FyzzError> for OutputErrorCode {
    fn from(err: FyzzError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<ImportError> for FyzzError {
    fn from(err: ImportError) -> Self {
        FyzzError::ImportFailed {
            module: err.module().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for FyzzError {
    fn from(err: ConfigError) -> Self {
        FyzzError::InvalidArguments {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
