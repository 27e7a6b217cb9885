//! CLI front door.
//!
//! Provides the command-line helpers behind the `fyzz` binary:
//! - `list` - importable packages in the registry
//! - `analyze` - structural report for one package
//! - `scan` - analyze, fuzz and export one package
//!
//! ## Error Handling
//!
//! All functions return `Result<T, FyzzError>`. The caller (the binary)
//! turns an error into a JSON error response and an exit code.

use std::time::SystemTime;

use tracing::{error, info};

use fyzz_core::config::FuzzConfig;
use fyzz_core::error::FyzzError;
use fyzz_core::output::{AnalyzeResponse, ListResponse, ScanResponse, SCHEMA_VERSION};
use fyzz_core::runtime::{Reflector, Registry};
use fyzz_core::types::PackageInfo;
use fyzz_core::util::{format_timestamp, generate_run_id};

use crate::analyzer::PackageAnalyzer;
use crate::engine::Fuzzer;
use crate::export::FileExporter;
use crate::improve::CommandImprover;
use crate::test_map::TestMap;

/// List importable top-level names.
pub fn run_list(registry: &Registry) -> ListResponse {
    ListResponse::new(
        registry
            .top_level_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    )
}

/// Verify and analyze `package`.
pub fn run_analyze<R: Reflector + ?Sized>(
    reflector: &R,
    package: &str,
    config: &FuzzConfig,
) -> Result<AnalyzeResponse, FyzzError> {
    let info = analyze_package(reflector, package, config.ignore_private.value)?;
    Ok(AnalyzeResponse::new(&info))
}

/// Verify, analyze, fuzz and export `package`.
pub fn run_scan<R: Reflector + ?Sized>(
    reflector: &R,
    package: &str,
    config: &FuzzConfig,
) -> Result<ScanResponse, FyzzError> {
    let run_id = generate_run_id();
    let started_at = format_timestamp(SystemTime::now());
    info!("scan {} started ({})", package, run_id);

    let info = analyze_package(reflector, package, config.ignore_private.value)?;
    let map = TestMap::build(&info);

    let mut fuzzer = Fuzzer::new(reflector).with_timeout(config.invocation_timeout.value);
    if let Some(command) = &config.improver_command.value {
        let improver = CommandImprover::from_command_line(command)?;
        fuzzer = fuzzer.with_improver(improver);
    }
    let aggregator = fuzzer.run(&map)?;
    let callables_fuzzed = aggregator.fuzzed_callable_count();
    let (result, exceptions) = aggregator.into_parts();

    let exporter = FileExporter::new(
        config.output_dir.value.clone(),
        config.output_format.value,
    );
    let exports = exporter
        .export(&info, &result)?
        .into_iter()
        .map(|path| path.display().to_string())
        .collect();

    Ok(ScanResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        run_id,
        started_at,
        package: info.name,
        callables_fuzzed,
        cases: result.case_count(),
        exceptions,
        exports,
    })
}

fn analyze_package<R: Reflector + ?Sized>(
    reflector: &R,
    package: &str,
    ignore_private: bool,
) -> Result<PackageInfo, FyzzError> {
    let analyzer = PackageAnalyzer::new(reflector).ignore_private(ignore_private);
    if !analyzer.verify_importable(package) {
        return Err(FyzzError::PackageNotFound {
            package: package.to_string(),
        });
    }
    analyzer.analyze(package).map_err(|e| {
        error!("analysis of {} failed: {}", package, e);
        FyzzError::from(e)
    })
}

// ============================================================================
// Tests
// ============================================================================
