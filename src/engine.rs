//! The invocation engine.
//!
//! [`Fuzzer::run`] walks a [`TestMap`] in order, resolves each entry to a live
//! callable, and invokes it once per gauntlet value of each parameter. Only
//! one parameter is fuzzed per case; its siblings are passed as null.
//!
//! A raise is data, not an engine fault: the case records the message, type
//! name, base64 trace and standard/custom classification, and the run moves
//! on. Resolution failures drop the callable with a warning. The only
//! run-fatal condition is a package with no typed parameters.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use fyzz_core::runtime::{Args, CallFn, Raised, Reflector, Value};
use fyzz_core::types::{FuzzCase, MethodResult};

use crate::gauntlet;
use crate::guard::call_guarded;
use crate::improve::CodeImprover;
use crate::resolver::{BoundCallable, ModuleCache, PathResolver, Resolution};
use crate::results::ResultAggregator;
use crate::test_map::{TestEntry, TestMap};

#[derive(Debug, Error)]
pub enum FuzzError {
    #[error("package '{package}' has no typed parameters to fuzz")]
    NoTypedParameters { package: String },
}

/// Drives one fuzzing run against a [`Reflector`].
pub struct Fuzzer<'r, R: Reflector + ?Sized> {
    reflector: &'r R,
    cache: ModuleCache,
    improver: Option<Box<dyn CodeImprover + 'r>>,
    timeout: Option<Duration>,
}

impl<'r, R: Reflector + ?Sized> Fuzzer<'r, R> {
    pub fn new(reflector: &'r R) -> Self {
        Fuzzer {
            reflector,
            cache: ModuleCache::new(),
            improver: None,
            timeout: None,
        }
    }

    pub fn with_improver(mut self, improver: impl CodeImprover + 'r) -> Self {
        self.improver = Some(Box::new(improver));
        self
    }

    /// Bound each invocation. `None` runs calls inline.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Modules imported so far.
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    pub fn run(&mut self, map: &TestMap) -> Result<ResultAggregator, FuzzError> {
        if !map.has_typed_parameters() {
            error!(
                "no typed parameters in {}; refusing to fuzz",
                map.package()
            );
            return Err(FuzzError::NoTypedParameters {
                package: map.package().to_string(),
            });
        }

        info!("fuzzing {} ({} callables)", map.package(), map.len());
        let mut aggregator = ResultAggregator::new(map.package());

        for entry in map.iter() {
            let resolution = {
                let mut resolver = PathResolver::new(self.reflector, &mut self.cache);
                resolver.resolve_key(&entry.key)
            };
            match resolution {
                Ok(Resolution::Bound(bound)) => {
                    let method = self.fuzz_callable(entry, &bound, &mut aggregator);
                    aggregator.record(method);
                }
                Ok(Resolution::Skip(reason)) => {
                    debug!("skipped {}: {}", entry.key, reason);
                }
                Err(e) => {
                    warn!("could not resolve {}: {}", entry.key, e);
                }
            }
        }

        info!(
            "fuzzed {} callables, {} cases",
            aggregator.fuzzed_callable_count(),
            aggregator.result().case_count()
        );
        aggregator.summarize_exceptions();
        Ok(aggregator)
    }

    fn fuzz_callable(
        &self,
        entry: &TestEntry,
        bound: &BoundCallable,
        aggregator: &mut ResultAggregator,
    ) -> MethodResult {
        let path = entry.key.dotted();
        let encoded_source = bound.source.as_deref().map(|s| STANDARD.encode(s));
        let improved_source = self.improve(bound);
        let names: Vec<&str> = entry.parameter_names().collect();

        let mut method = MethodResult::new(entry.key.name.clone(), path.clone());
        for param in &entry.parameters {
            let values = gauntlet::fuzz(&param.param_type);
            debug!(
                "testing parameter {} of {} with {} permutations",
                param.name,
                path,
                values.len()
            );
            for value in values {
                let mut inputs = Args::nulled(names.iter().copied());
                inputs.set(param.name.clone(), value);

                let outcome = self.invoke(&bound.callable, &inputs);
                let mut case = FuzzCase::new(inputs, encoded_source.clone());
                case.improved_source = improved_source.clone();
                match outcome {
                    Ok(returned) => case.return_value = Some(returned),
                    Err(raised) => {
                        aggregator.record_exception(raised.type_name());
                        let trace = match raised.trace() {
                            Some(trace) => trace.to_string(),
                            None => format!("{}\n{}", path, raised),
                        };
                        case.exception = Some(raised.message().to_string());
                        case.exception_type = Some(raised.type_name().to_string());
                        case.exception_traceback = Some(STANDARD.encode(trace));
                        case.is_standard_exception = Some(raised.is_standard());
                    }
                }
                method.test_cases.push(case);
            }
        }
        method
    }

    fn improve(&self, bound: &BoundCallable) -> Option<String> {
        let improver = self.improver.as_ref()?;
        let source = bound.source.as_deref()?;
        match improver.suggest_improvement(source, &bound.key.code_path()) {
            Ok(improved) => Some(improved),
            Err(e) => {
                warn!("improver failed for {}: {}", bound.key, e);
                None
            }
        }
    }

    fn invoke(&self, callable: &Arc<CallFn>, inputs: &Args) -> Result<Value, Raised> {
        match self.timeout {
            None => call_guarded(|| callable(inputs)),
            Some(timeout) => invoke_with_timeout(Arc::clone(callable), inputs.clone(), timeout),
        }
    }
}

/// Run the call on a worker thread and wait at most `timeout`.
///
/// On expiry the worker is abandoned; its eventual result is dropped.
fn invoke_with_timeout(
    callable: Arc<CallFn>,
    inputs: Args,
    timeout: Duration,
) -> Result<Value, Raised> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("fyzz-invoke".to_string())
        .spawn(move || {
            let _ = tx.send(call_guarded(|| callable(&inputs)));
        })
        .map_err(|e| Raised::runtime_error(format!("failed to start worker: {}", e)))?;

    match rx.recv_timeout(timeout) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => Err(Raised::timeout_error(format!(
            "call did not finish within {:?}",
            timeout
        ))),
        Err(RecvTimeoutError::Disconnected) => {
            Err(Raised::runtime_error("worker exited without a result"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::PackageAnalyzer;
    use crate::improve::ImproveError;
    use fyzz_core::runtime::{
        ClassObject, FunctionObject, MethodObject, ModuleObject, Param, Registry, PANIC_EXCEPTION,
    };

    #[derive(Default)]
    struct Greeter;

    #[derive(Default)]
    struct Sealed;

    fn registry() -> Registry {
        let greeter = ClassObject::new::<Greeter>("Greeter", "demo.core").method(
            MethodObject::new::<Greeter, _>("greet", |_, args| {
                Ok(Value::from(format!("hi {}", args.str("name")?)))
            })
            .param(Param::typed("name", "str"))
            .returns("str")
            .with_source("def greet(self, name: str) -> str: ..."),
        );
        let sealed = ClassObject::new::<Sealed>("Sealed", "demo.core")
            .init_param(Param::typed("key", "str"))
            .method(
                MethodObject::new::<Sealed, _>("open", |_, _| Ok(Value::None))
                    .param(Param::typed("code", "int")),
            );

        let mut registry = Registry::new();
        registry
            .register(ModuleObject::package("demo"))
            .register(
                ModuleObject::module("demo.core")
                    .class(greeter)
                    .class(sealed)
                    .function(
                        FunctionObject::new("pair", |args| {
                            Ok(Value::List(vec![
                                args.value("a").clone(),
                                args.value("b").clone(),
                            ]))
                        })
                        .param(Param::typed("a", "bool"))
                        .param(Param::typed("b", "list")),
                    )
                    .function(
                        FunctionObject::new("boom", |args| {
                            if args.value("n").as_int() == Some(0) {
                                panic!("zero");
                            }
                            Err(Raised::custom("DemoError", "always"))
                        })
                        .param(Param::typed("n", "int")),
                    )
                    .function(
                        FunctionObject::new("nap", |_| {
                            thread::sleep(Duration::from_millis(500));
                            Ok(Value::None)
                        })
                        .param(Param::typed("flag", "bool")),
                    ),
            )
            .register(
                ModuleObject::module("loose")
                    .function(FunctionObject::new("f", |_| Ok(Value::None)).param(Param::untyped("x"))),
            );
        registry
    }

    fn map_for(registry: &Registry, package: &str) -> TestMap {
        let info = PackageAnalyzer::new(registry).analyze(package).unwrap();
        TestMap::build(&info)
    }

    fn without(map: &TestMap, dotted: &str) -> TestMap {
        let mut out = TestMap::new(map.package());
        for entry in map.iter().filter(|e| e.key.dotted() != dotted) {
            out.insert(entry.key.clone(), entry.parameters.clone());
        }
        out
    }

    struct Upper;

    impl CodeImprover for Upper {
        fn suggest_improvement(&self, source: &str, code_path: &str) -> Result<String, ImproveError> {
            Ok(format!("# {}\n{}", code_path, source.to_uppercase()))
        }
    }

    struct Broken;

    impl CodeImprover for Broken {
        fn suggest_improvement(&self, _: &str, _: &str) -> Result<String, ImproveError> {
            Err(ImproveError::EmptyCommand)
        }
    }

    mod precondition {
        use super::*;

        #[test]
        fn untyped_package_is_refused() {
            let registry = registry();
            let map = map_for(&registry, "loose");
            let err = Fuzzer::new(&registry).run(&map).unwrap_err();
            assert!(matches!(err, FuzzError::NoTypedParameters { package } if package == "loose"));
        }
    }

    mod cases {
        use super::*;

        fn run() -> ResultAggregator {
            let registry = registry();
            let map = without(&map_for(&registry, "demo"), "demo.core.nap");
            let agg = Fuzzer::new(&registry).run(&map).unwrap();
            agg
        }

        #[test]
        fn one_parameter_at_a_time() {
            let agg = run();
            let pair = agg.result().method("demo.core.pair").unwrap();
            assert_eq!(pair.test_cases.len(), 6 + 4);
            for case in &pair.test_cases {
                let set = case
                    .inputs
                    .iter()
                    .filter(|(_, v)| !v.is_none())
                    .count();
                assert!(set <= 1);
                assert_eq!(case.inputs.len(), 2);
            }
            assert_eq!(pair.test_cases[1].inputs.value("a"), &Value::Bool(true));
            assert!(pair.test_cases[1].inputs.value("b").is_none());
        }

        #[test]
        fn skipped_classes_produce_no_result() {
            let agg = run();
            assert!(agg.result().method("demo.core.Sealed.open").is_none());
            assert!(agg.result().method("demo.core.Greeter.greet").is_some());
        }

        #[test]
        fn raises_are_classified() {
            let agg = run();
            let greet = agg.result().method("demo.core.Greeter.greet").unwrap();
            let confused = &greet.test_cases[0];
            assert_eq!(confused.exception_type.as_deref(), Some("TypeError"));
            assert_eq!(confused.is_standard_exception, Some(true));
            assert!(confused.exception_traceback.is_some());
            assert!(confused.return_value.is_none());

            let fine = &greet.test_cases[1];
            assert_eq!(fine.return_value, Some(Value::from("hi ")));
            assert!(fine.exception.is_none());

            let boom = agg.result().method("demo.core.boom").unwrap();
            let custom = &boom.test_cases[0];
            assert_eq!(custom.exception_type.as_deref(), Some("DemoError"));
            assert_eq!(custom.exception.as_deref(), Some("always"));
            assert_eq!(custom.is_standard_exception, Some(false));
        }

        #[test]
        fn panics_are_recorded_not_propagated() {
            let agg = run();
            let boom = agg.result().method("demo.core.boom").unwrap();
            // gauntlet index 3 is zero
            let case = &boom.test_cases[3];
            assert_eq!(case.exception_type.as_deref(), Some(PANIC_EXCEPTION));
            assert_eq!(case.exception.as_deref(), Some("zero"));
            assert_eq!(agg.tally().count(PANIC_EXCEPTION), 1);
            assert_eq!(agg.tally().count("DemoError"), 7);
        }

        #[test]
        fn source_is_base64_encoded() {
            let agg = run();
            let greet = agg.result().method("demo.core.Greeter.greet").unwrap();
            let encoded = greet.test_cases[0].encoded_source.as_deref().unwrap();
            let decoded = STANDARD.decode(encoded).unwrap();
            assert_eq!(decoded, b"def greet(self, name: str) -> str: ...");
            let pair = agg.result().method("demo.core.pair").unwrap();
            assert!(pair.test_cases[0].encoded_source.is_none());
        }

        #[test]
        fn modules_are_imported_once() {
            let registry = registry();
            let map = without(&map_for(&registry, "demo"), "demo.core.nap");
            let mut fuzzer = Fuzzer::new(&registry);
            fuzzer.run(&map).unwrap();
            assert_eq!(fuzzer.cache().len(), 1);
        }
    }

    mod resolution {
        use super::*;
        use crate::test_map::CallableKey;

        fn fragile() -> Registry {
            let refuses = ClassObject::new::<Sealed>("Refuses", "frail")
                .with_factory(|| Err(Raised::runtime_error("no instances today")))
                .method(
                    MethodObject::new::<Sealed, _>("poke", |_, _| Ok(Value::None))
                        .param(Param::typed("n", "int")),
                );
            let explodes = ClassObject::new::<Sealed>("Explodes", "frail")
                .with_factory(|| panic!("constructor blew up"))
                .method(
                    MethodObject::new::<Sealed, _>("poke", |_, _| Ok(Value::None))
                        .param(Param::typed("n", "int")),
                );
            let mut registry = Registry::new();
            registry.register(
                ModuleObject::module("frail")
                    .class(refuses)
                    .class(explodes)
                    .function(
                        FunctionObject::new("after", |args| Ok(Value::Int(args.int("n")?)))
                            .param(Param::typed("n", "int")),
                    ),
            );
            registry
        }

        #[test]
        fn failures_drop_only_their_callable() {
            let registry = fragile();
            let analyzed = map_for(&registry, "frail");
            let params = analyzed.get("frail.after").unwrap().parameters.clone();

            let mut map = TestMap::new("frail");
            map.insert(CallableKey::function("ghost", "f"), params.clone());
            map.insert(CallableKey::function("frail", "vanished"), params.clone());
            map.insert(CallableKey::method("frail", "Missing", "poke"), params);
            for entry in analyzed.iter() {
                map.insert(entry.key.clone(), entry.parameters.clone());
            }
            assert_eq!(map.len(), 6);

            let agg = Fuzzer::new(&registry).run(&map).unwrap();
            let paths: Vec<&str> = agg
                .result()
                .results
                .iter()
                .map(|r| r.path.as_str())
                .collect();
            assert_eq!(paths, vec!["frail.after"]);
            assert_eq!(agg.fuzzed_callable_count(), 1);
            let after = agg.result().method("frail.after").unwrap();
            assert_eq!(after.test_cases.len(), 8);
        }
    }

    mod improver {
        use super::*;

        #[test]
        fn improvement_is_attached_to_every_case() {
            let registry = registry();
            let map = without(&map_for(&registry, "demo"), "demo.core.nap");
            let agg = Fuzzer::new(&registry).with_improver(Upper).run(&map).unwrap();
            let greet = agg.result().method("demo.core.Greeter.greet").unwrap();
            for case in &greet.test_cases {
                assert_eq!(
                    case.improved_source.as_deref(),
                    Some("# demo.core::Greeter::greet\nDEF GREET(SELF, NAME: STR) -> STR: ...")
                );
            }
            // no source, no improvement
            let pair = agg.result().method("demo.core.pair").unwrap();
            assert!(pair.test_cases[0].improved_source.is_none());
        }

        #[test]
        fn improver_failure_does_not_block_cases() {
            let registry = registry();
            let map = without(&map_for(&registry, "demo"), "demo.core.nap");
            let agg = Fuzzer::new(&registry).with_improver(Broken).run(&map).unwrap();
            let greet = agg.result().method("demo.core.Greeter.greet").unwrap();
            assert_eq!(greet.test_cases.len(), 8);
            assert!(greet.test_cases.iter().all(|c| c.improved_source.is_none()));
        }
    }

    mod timeout {
        use super::*;

        #[test]
        fn slow_calls_record_timeout_error() {
            let registry = registry();
            let mut map = TestMap::new("demo");
            let full = map_for(&registry, "demo");
            let nap = full.get("demo.core.nap").unwrap();
            map.insert(nap.key.clone(), nap.parameters.clone());

            let agg = Fuzzer::new(&registry)
                .with_timeout(Some(Duration::from_millis(20)))
                .run(&map)
                .unwrap();
            let nap = agg.result().method("demo.core.nap").unwrap();
            assert_eq!(nap.test_cases.len(), 6);
            assert!(nap
                .test_cases
                .iter()
                .all(|c| c.exception_type.as_deref() == Some("TimeoutError")));
            assert!(nap.test_cases.iter().all(|c| c.is_standard_exception == Some(true)));
        }

        #[test]
        fn fast_calls_pass_through_worker() {
            let registry = registry();
            let mut map = TestMap::new("demo");
            let full = map_for(&registry, "demo");
            let pair = full.get("demo.core.pair").unwrap();
            map.insert(pair.key.clone(), pair.parameters.clone());

            let agg = Fuzzer::new(&registry)
                .with_timeout(Some(Duration::from_secs(5)))
                .run(&map)
                .unwrap();
            let pair = agg.result().method("demo.core.pair").unwrap();
            assert!(pair.test_cases.iter().all(|c| c.return_value.is_some()));
        }
    }
}
