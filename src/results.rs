//! Accumulating one run's results.

use tracing::info;

use fyzz_core::types::{ExceptionTally, FuzzResult, MethodResult};

/// Collects [`MethodResult`]s in discovery order plus the exception tally.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    result: FuzzResult,
    tally: ExceptionTally,
}

impl ResultAggregator {
    pub fn new(package_name: impl Into<String>) -> Self {
        ResultAggregator {
            result: FuzzResult::new(package_name),
            tally: ExceptionTally::new(),
        }
    }

    pub fn record(&mut self, method: MethodResult) {
        self.result.results.push(method);
    }

    pub fn record_exception(&mut self, type_name: &str) {
        self.tally.record(type_name);
    }

    pub fn result(&self) -> &FuzzResult {
        &self.result
    }

    pub fn tally(&self) -> &ExceptionTally {
        &self.tally
    }

    /// Distinct callables that produced at least one case.
    pub fn fuzzed_callable_count(&self) -> usize {
        self.result
            .results
            .iter()
            .filter(|r| !r.test_cases.is_empty())
            .count()
    }

    /// One log line per exception type seen.
    pub fn summarize_exceptions(&self) {
        for (type_name, count) in self.tally.iter() {
            info!(
                "found unhandled exception {}: {} occurrence(s)",
                type_name, count
            );
        }
    }

    pub fn into_parts(self) -> (FuzzResult, ExceptionTally) {
        (self.result, self.tally)
    }
}
