//! fyzz CLI binary entry point.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use fyzz::cli::{run_analyze, run_list, run_scan};
use fyzz::config::{CliOverrides, FuzzConfig, OutputFormat};
use fyzz::error::{FyzzError, OutputErrorCode};
use fyzz::output::{emit_response, ErrorResponse};

/// Type-directed fuzzing for registered packages.
#[derive(Parser, Debug)]
#[command(name = "fyzz")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List importable packages.
    List,

    /// Print the structural report of a package.
    Analyze {
        /// Package or module name.
        #[arg(long)]
        package: String,

        /// Skip callables whose names start with `_`.
        #[arg(long)]
        ignore_private: bool,
    },

    /// Analyze, fuzz and export a package.
    Scan {
        /// Package or module name.
        #[arg(long)]
        package: String,

        /// Skip callables whose names start with `_`.
        #[arg(long)]
        ignore_private: bool,

        /// Export format: json, yaml or none.
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Directory for exported reports.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Per-invocation timeout in milliseconds (0 disables).
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Command that rewrites a callable's source read from stdin.
        #[arg(long)]
        improver_cmd: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_format);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like every other response.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), FyzzError> {
    let registry = fyzz_samples::registry();
    let mut stdout = io::stdout();
    let emitted = match cli.command {
        Command::List => emit_response(&run_list(&registry), &mut stdout),
        Command::Analyze {
            package,
            ignore_private,
        } => {
            let overrides = CliOverrides {
                ignore_private,
                ..CliOverrides::default()
            };
            let config = FuzzConfig::from_env(&overrides)?;
            emit_response(&run_analyze(&registry, &package, &config)?, &mut stdout)
        }
        Command::Scan {
            package,
            ignore_private,
            format,
            output_dir,
            timeout_ms,
            improver_cmd,
        } => {
            let overrides = CliOverrides {
                ignore_private,
                output_format: format,
                output_dir,
                timeout_ms,
                improver_command: improver_cmd,
            };
            let config = FuzzConfig::from_env(&overrides)?;
            emit_response(&run_scan(&registry, &package, &config)?, &mut stdout)
        }
    };
    emitted.map_err(|e| FyzzError::internal(format!("failed to write response: {}", e)))
}
