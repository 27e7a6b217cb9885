//! Writing structure and result reports to disk.
//!
//! Reports are named `composition_<package>.<ext>` (structure) and
//! `results_<package>.<ext>` (fuzz results). An existing file at the target
//! path is removed before writing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use fyzz_core::config::OutputFormat;
use fyzz_core::output::PackageReport;
use fyzz_core::types::{FuzzResult, PackageInfo};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode JSON for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode YAML for {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

impl ExportError {
    pub fn path(&self) -> &Path {
        match self {
            ExportError::Io { path, .. }
            | ExportError::Json { path, .. }
            | ExportError::Yaml { path, .. } => path,
        }
    }
}

pub fn composition_file_name(package: &str, format: OutputFormat) -> Option<String> {
    format
        .extension()
        .map(|ext| format!("composition_{}.{}", package, ext))
}

pub fn results_file_name(package: &str, format: OutputFormat) -> Option<String> {
    format
        .extension()
        .map(|ext| format!("results_{}.{}", package, ext))
}

/// Pretty JSON to `path`, replacing any existing file.
pub fn export_json<T: Serialize>(payload: &T, path: &Path) -> Result<(), ExportError> {
    let text = serde_json::to_string_pretty(payload).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_replacing(path, &text)
}

/// YAML to `path`, replacing any existing file.
pub fn export_yaml<T: Serialize>(payload: &T, path: &Path) -> Result<(), ExportError> {
    let text = serde_yaml_ng::to_string(payload).map_err(|source| ExportError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    write_replacing(path, &text)
}

fn write_replacing(path: &Path, text: &str) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if path.exists() {
        debug!("replacing {}", path.display());
        fs::remove_file(path).map_err(io_err)?;
    }
    fs::write(path, text).map_err(io_err)
}

/// Writes both reports of a run into one directory.
#[derive(Debug, Clone)]
pub struct FileExporter {
    dir: PathBuf,
    format: OutputFormat,
}

impl FileExporter {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        FileExporter {
            dir: dir.into(),
            format,
        }
    }

    /// Write the structure and result reports; returns the written paths.
    /// With [`OutputFormat::None`] nothing is written.
    pub fn export(
        &self,
        package: &PackageInfo,
        results: &FuzzResult,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let (Some(composition), Some(results_name)) = (
            composition_file_name(&package.name, self.format),
            results_file_name(&package.name, self.format),
        ) else {
            return Ok(Vec::new());
        };

        fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let report = PackageReport::from(package);
        let composition = self.dir.join(composition);
        let results_path = self.dir.join(results_name);
        self.write(&report, &composition)?;
        self.write(results, &results_path)?;
        Ok(vec![composition, results_path])
    }

    fn write<T: Serialize>(&self, payload: &T, path: &Path) -> Result<(), ExportError> {
        let outcome = match self.format {
            OutputFormat::Json => export_json(payload, path),
            OutputFormat::Yaml => export_yaml(payload, path),
            OutputFormat::None => Ok(()),
        };
        if let Err(e) = &outcome {
            error!("export failed: {}", e);
        }
        outcome
    }
}

// ============================================================================
// Tests
// ============================================================================
