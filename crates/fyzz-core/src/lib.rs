//! Core infrastructure for fyzz.
//!
//! This crate provides everything the fuzzer is written against:
//! - The host runtime: dynamic values, raised errors, and the object model
//!   for modules, classes and callables
//! - The `Reflector` capability and the static registry implementing it
//! - Structure and result data model
//! - Error types and exit codes
//! - JSON output types for CLI responses
//! - Layered run configuration

pub mod config;
pub mod error;
pub mod output;
pub mod runtime;
pub mod types;
pub mod util;
