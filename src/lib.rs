//! fyzz: type-directed fuzzing harness
//!
//! Analyzes a registered package's callables, feeds each typed parameter a
//! fixed gauntlet of adversarial values, and records every return and raise.

// Core infrastructure - re-exported from fyzz-core
pub use fyzz_core::config;
pub use fyzz_core::error;
pub use fyzz_core::output;
pub use fyzz_core::runtime;
pub use fyzz_core::types;
pub use fyzz_core::util;

// Pipeline
pub mod analyzer;
pub mod engine;
pub mod gauntlet;
pub mod guard;
pub mod resolver;
pub mod results;
pub mod test_map;

// Collaborators
pub mod export;
pub mod improve;

// Front door
pub mod cli;

// Error bridges - converts subsystem errors to FyzzError
mod error_bridges;
