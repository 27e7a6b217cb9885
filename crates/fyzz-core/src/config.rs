//! Run configuration with layered precedence.
//!
//! Every setting is resolved from three layers, lowest first:
//! built-in default, environment variable, CLI flag. Each resolved value
//! remembers its [`ConfigSource`] so diagnostics can say where it came from.
//!
//! | Setting | Env var | Default |
//! |---------|---------|---------|
//! | `ignore_private` | `FYZZ_IGNORE_PRIVATE` | `false` |
//! | `output_format` | `FYZZ_OUTPUT_FORMAT` | `json` |
//! | `output_dir` | `FYZZ_OUTPUT_DIR` | `.` |
//! | `invocation_timeout` | `FYZZ_TIMEOUT_MS` | none |
//! | `improver_command` | `FYZZ_IMPROVER_CMD` | none |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const ENV_IGNORE_PRIVATE: &str = "FYZZ_IGNORE_PRIVATE";
pub const ENV_OUTPUT_FORMAT: &str = "FYZZ_OUTPUT_FORMAT";
pub const ENV_OUTPUT_DIR: &str = "FYZZ_OUTPUT_DIR";
pub const ENV_TIMEOUT_MS: &str = "FYZZ_TIMEOUT_MS";
pub const ENV_IMPROVER_CMD: &str = "FYZZ_IMPROVER_CMD";

/// A configuration value could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: expected {expected}")]
    InvalidEnvValue {
        var: String,
        value: String,
        expected: String,
    },

    #[error("unknown output format '{0}': expected json, yaml or none")]
    UnknownFormat(String),
}

// ============================================================================
// Configuration Sources
// ============================================================================

/// Where a configuration value came from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in default value.
    Default = 0,
    /// From environment variable.
    EnvVar = 1,
    /// From CLI flag (highest precedence).
    CliFlag = 2,
}

/// A configuration value with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    pub fn default_value(value: T) -> Self {
        ConfigValue::new(value, ConfigSource::Default)
    }

    /// Merge with another value, preferring higher precedence.
    pub fn merge(self, other: Self) -> Self {
        if other.source >= self.source {
            other
        } else {
            self
        }
    }

    /// Merge with an optional value from `source`.
    pub fn merge_opt(self, other: Option<T>, source: ConfigSource) -> Self {
        match other {
            Some(value) => self.merge(ConfigValue::new(value, source)),
            None => self,
        }
    }
}

// ============================================================================
// Output Format
// ============================================================================

/// Export file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    /// Skip file export.
    None,
}

impl OutputFormat {
    /// File extension, or `None` when nothing is written.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            OutputFormat::Json => Some("json"),
            OutputFormat::Yaml => Some("yaml"),
            OutputFormat::None => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "none" => Ok(OutputFormat::None),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::None => "none",
        })
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Values given on the command line. `None` (or `false` for flags) means
/// the flag was not passed.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub ignore_private: bool,
    pub output_format: Option<OutputFormat>,
    pub output_dir: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub improver_command: Option<String>,
}

/// Fully resolved run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzConfig {
    pub ignore_private: ConfigValue<bool>,
    pub output_format: ConfigValue<OutputFormat>,
    pub output_dir: ConfigValue<PathBuf>,
    /// Per-invocation timeout; `None` runs calls inline.
    pub invocation_timeout: ConfigValue<Option<Duration>>,
    pub improver_command: ConfigValue<Option<String>>,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        FuzzConfig {
            ignore_private: ConfigValue::default_value(false),
            output_format: ConfigValue::default_value(OutputFormat::Json),
            output_dir: ConfigValue::default_value(PathBuf::from(".")),
            invocation_timeout: ConfigValue::default_value(None),
            improver_command: ConfigValue::default_value(None),
        }
    }
}

impl FuzzConfig {
    /// Resolve against the process environment.
    pub fn from_env(cli: &CliOverrides) -> Result<Self, ConfigError> {
        FuzzConfig::resolve(cli, |var| std::env::var(var).ok())
    }

    /// Resolve defaults, then `env`, then `cli`.
    pub fn resolve<F>(cli: &CliOverrides, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = FuzzConfig::default();
        let from_env = ConfigSource::EnvVar;
        let from_cli = ConfigSource::CliFlag;

        let env_ignore_private = env(ENV_IGNORE_PRIVATE)
            .map(|raw| parse_bool(ENV_IGNORE_PRIVATE, &raw))
            .transpose()?;
        let env_format = env(ENV_OUTPUT_FORMAT)
            .map(|raw| raw.parse::<OutputFormat>())
            .transpose()?;
        let env_dir = env(ENV_OUTPUT_DIR)
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);
        let env_timeout = env(ENV_TIMEOUT_MS)
            .map(|raw| parse_millis(ENV_TIMEOUT_MS, &raw))
            .transpose()?;
        let env_improver = env(ENV_IMPROVER_CMD).filter(|raw| !raw.trim().is_empty());

        Ok(FuzzConfig {
            ignore_private: defaults
                .ignore_private
                .merge_opt(env_ignore_private, from_env)
                .merge_opt(cli.ignore_private.then_some(true), from_cli),
            output_format: defaults
                .output_format
                .merge_opt(env_format, from_env)
                .merge_opt(cli.output_format, from_cli),
            output_dir: defaults
                .output_dir
                .merge_opt(env_dir, from_env)
                .merge_opt(cli.output_dir.clone(), from_cli),
            invocation_timeout: defaults
                .invocation_timeout
                .merge_opt(env_timeout.map(millis_to_timeout), from_env)
                .merge_opt(cli.timeout_ms.map(millis_to_timeout), from_cli),
            improver_command: defaults
                .improver_command
                .merge_opt(env_improver.map(Some), from_env)
                .merge_opt(cli.improver_command.clone().map(Some), from_cli),
        })
    }
}

/// Zero disables the timeout.
fn millis_to_timeout(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnvValue {
            var: var.to_string(),
            value: raw.to_string(),
            expected: "a boolean (true/false/1/0)".to_string(),
        }),
    }
}

fn parse_millis(var: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidEnvValue {
            var: var.to_string(),
            value: raw.to_string(),
            expected: "a whole number of milliseconds".to_string(),
        })
}

// ============================================================================
// Tests
// ============================================================================
