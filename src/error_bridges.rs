//! Error bridge implementations for subsystem errors.
//!
//! This module provides `impl From<X> for FyzzError` conversions from the
//! root crate's subsystem errors to the unified `FyzzError` type.
//!
//! These bridges live in the root crate rather than `fyzz-core` because the
//! analyzer, engine and exporter errors are defined here.

use fyzz_core::error::FyzzError;

use crate::analyzer::AnalyzeError;
use crate::engine::FuzzError;
use crate::export::ExportError;
use crate::improve::ImproveError;

// ============================================================================
// Bridge: AnalyzeError -> FyzzError
// ============================================================================

impl From<AnalyzeError> for FyzzError {
    fn from(err: AnalyzeError) -> Self {
        match err {
            AnalyzeError::Import(import) => FyzzError::from(import),
        }
    }
}

// ============================================================================
// Bridge: FuzzError -> FyzzError
// ============================================================================

impl From<FuzzError> for FyzzError {
    fn from(err: FuzzError) -> Self {
        match err {
            FuzzError::NoTypedParameters { package } => FyzzError::NoTypedParameters { package },
        }
    }
}

// ============================================================================
// Bridge: ExportError -> FyzzError
// ============================================================================

impl From<ExportError> for FyzzError {
    fn from(err: ExportError) -> Self {
        FyzzError::ExportFailed {
            path: err.path().display().to_string(),
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Bridge: ImproveError -> FyzzError
// ============================================================================

/// Only reachable while configuring the improver; failures during a run are
/// logged by the engine instead.
impl From<ImproveError> for FyzzError {
    fn from(err: ImproveError) -> Self {
        match err {
            ImproveError::EmptyCommand => FyzzError::invalid_args("improver command is empty"),
            other => FyzzError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fyzz_core::error::OutputErrorCode;
    use fyzz_core::runtime::ImportError;
    use std::path::PathBuf;

    #[test]
    fn analyze_import_failure_maps_to_import_code() {
        let err: FyzzError = AnalyzeError::Import(ImportError::ModuleNotFound {
            module: "ghost".into(),
        })
        .into();
        assert_eq!(err.error_code(), OutputErrorCode::ImportFailure);
        assert!(matches!(err, FyzzError::ImportFailed { ref module, .. } if module == "ghost"));
    }

    #[test]
    fn no_typed_parameters_keeps_package() {
        let err: FyzzError = FuzzError::NoTypedParameters {
            package: "untyped".into(),
        }
        .into();
        assert_eq!(err.error_code(), OutputErrorCode::NoTypedParameters);
    }

    #[test]
    fn export_failure_carries_path() {
        let err: FyzzError = ExportError::Io {
            path: PathBuf::from("/nope/results_x.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert_eq!(err.error_code(), OutputErrorCode::ExportFailure);
        match err {
            FyzzError::ExportFailed { path, .. } => assert_eq!(path, "/nope/results_x.json"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn empty_improver_is_invalid_arguments() {
        let err: FyzzError = ImproveError::EmptyCommand.into();
        assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
    }
}
