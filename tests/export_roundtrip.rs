//! Export a real run and read the files back.

use std::fs;

use fyzz::analyzer::PackageAnalyzer;
use fyzz::config::OutputFormat;
use fyzz::engine::Fuzzer;
use fyzz::export::FileExporter;
use fyzz::output::PackageReport;
use fyzz::test_map::TestMap;
use serde_json::Value as Json;
use tempfile::TempDir;

#[test]
fn json_reports_match_the_run() {
    let registry = fyzz_samples::registry();
    let info = PackageAnalyzer::new(&registry).analyze("arith").unwrap();
    let result = Fuzzer::new(&registry)
        .run(&TestMap::build(&info))
        .unwrap()
        .into_parts()
        .0;

    let dir = TempDir::new().unwrap();
    let written = FileExporter::new(dir.path(), OutputFormat::Json)
        .export(&info, &result)
        .unwrap();
    assert_eq!(written.len(), 2);

    let composition: Json =
        serde_json::from_str(&fs::read_to_string(dir.path().join("composition_arith.json")).unwrap())
            .unwrap();
    assert_eq!(composition["package_name"], "arith");
    let methods = &composition["modules"]["arith"]["classes"][""]["methods"];
    assert_eq!(methods[0]["name"], "add");
    assert_eq!(methods[0]["params"][0]["param_type"], "int");
    assert_eq!(methods[0]["params"][0]["kind"], "POSITIONAL_OR_KEYWORD");

    let results: Json =
        serde_json::from_str(&fs::read_to_string(dir.path().join("results_arith.json")).unwrap())
            .unwrap();
    let add = &results["results"][0];
    assert_eq!(add["method_name"], "add");
    assert_eq!(add["test_cases"].as_array().map(Vec::len), Some(16));
    assert_eq!(add["test_cases"][0]["inputs"]["a"], "not_an_int");
    assert_eq!(add["test_cases"][0]["inputs"]["b"], Json::Null);
    assert_eq!(add["test_cases"][0]["return_value"], 0);
}

#[test]
fn reexport_overwrites_previous_run() {
    let registry = fyzz_samples::registry();
    let info = PackageAnalyzer::new(&registry).analyze("arith").unwrap();
    let result = Fuzzer::new(&registry)
        .run(&TestMap::build(&info))
        .unwrap()
        .into_parts()
        .0;

    let dir = TempDir::new().unwrap();
    let exporter = FileExporter::new(dir.path(), OutputFormat::Yaml);
    exporter.export(&info, &result).unwrap();
    let first = fs::read_to_string(dir.path().join("results_arith.yaml")).unwrap();
    exporter.export(&info, &result).unwrap();
    let second = fs::read_to_string(dir.path().join("results_arith.yaml")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn structure_rows_cover_every_parameter() {
    let registry = fyzz_samples::registry();
    let info = PackageAnalyzer::new(&registry).analyze("pyfyzzexample").unwrap();
    let rows = PackageReport::from(&info).rows();
    // __init__ has no parameters and still gets one row
    assert_eq!(rows.len(), 1 + 2 + 2);
}
