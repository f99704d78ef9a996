use crate::logging::{LogLevel, TracingFormat};
use crate::run::{CheckReport, Report};
use clap::{Parser, ValueEnum};
use critpath_render::OutputFormat;
use miette::{Diagnostic, Report as MietteReport};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Configuration or input error exit code
pub const EXIT_CLI: i32 = 2;
/// Dependency cycle exit code
pub const EXIT_CYCLE: i32 = 3;
/// Rendering error exit code
pub const EXIT_RENDER: i32 = 4;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI flag, config file or input file error (exit code 2)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(critpath::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The project plan is malformed (exit code 2)
    #[error("Invalid project plan: {message}")]
    #[diagnostic(code(critpath::cli::input))]
    Input {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The project plan contains a dependency cycle (exit code 3)
    #[error("{message}")]
    #[diagnostic(code(critpath::cli::cycle))]
    Cycle {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The graph image could not be written (exit code 4)
    #[error("Rendering failed: {message}")]
    #[diagnostic(code(critpath::cli::render))]
    Render {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Short machine-readable code used in JSON error envelopes.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Input { .. } => "input",
            Self::Cycle { .. } => "cycle",
            Self::Render { .. } => "render",
        }
    }
}

fn help_of(err: &dyn Diagnostic) -> Option<String> {
    err.help().map(|help| help.to_string())
}

impl From<critpath_graph::Error> for CliError {
    fn from(err: critpath_graph::Error) -> Self {
        let help = help_of(&err);
        match err {
            critpath_graph::Error::CycleDetected { .. } => Self::Cycle {
                message: err.to_string(),
                help,
            },
            _ => Self::Input {
                message: err.to_string(),
                help,
            },
        }
    }
}

impl From<critpath_render::Error> for CliError {
    fn from(err: critpath_render::Error) -> Self {
        Self::Render {
            message: err.to_string(),
            help: help_of(&err),
        }
    }
}

/// Map an error to the process exit code.
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } | CliError::Input { .. } => EXIT_CLI,
        CliError::Cycle { .. } => EXIT_CYCLE,
        CliError::Render { .. } => EXIT_RENDER,
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Human-readable result lines.
#[must_use]
pub fn format_report(report: &Report) -> String {
    format!(
        "The critical path is [{}]\nThe expected duration is {}",
        report.critical.path.join(", "),
        report.critical.duration
    )
}

/// Human-readable summary of a `--check` run.
#[must_use]
pub fn format_check(summary: &CheckReport) -> String {
    format!(
        "The plan is valid: {} tasks, {} dependencies",
        summary.tasks, summary.edges
    )
}

/// Print a successful result to stdout, as `human` text or a JSON envelope.
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_ok<T: Serialize>(data: &T, human: &str, json_mode: bool) {
    if json_mode {
        match serde_json::to_string(&OkEnvelope::new(data)) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing response"),
        }
    } else {
        println!("{human}");
    }
}

/// Render error appropriately based on JSON flag
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": err.kind(),
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = MietteReport::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Output format flag.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum FormatArg {
    /// Self-contained SVG image
    Svg,
    /// Graphviz DOT source
    Dot,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Svg => Self::Svg,
            FormatArg::Dot => Self::Dot,
        }
    }
}

/// Compute the critical path of a nested project plan and draw its dependency graph.
#[derive(Parser, Debug)]
#[command(name = "critpath", version, about, long_about = None)]
pub struct Cli {
    /// Project plan to read (YAML or JSON) [default: input/dependencies.yaml]
    #[arg(value_name = "INPUT", env = "CRITPATH_INPUT")]
    pub input: Option<PathBuf>,

    /// Where to write the graph image [default: output/path.svg]
    #[arg(short, long, value_name = "PATH", env = "CRITPATH_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Image format; inferred from the output extension when omitted
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Skip writing the graph image
    #[arg(long)]
    pub no_render: bool,

    /// Only validate the plan (schema and cycles); implies --no-render
    #[arg(long)]
    pub check: bool,

    /// Config file [default: ./critpath.toml when present]
    #[arg(short, long, value_name = "PATH", env = "CRITPATH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit a JSON envelope instead of text
    #[arg(long)]
    pub json: bool,

    /// Logging verbosity level
    #[arg(short = 'L', long, default_value = "warn", value_enum)]
    pub level: LogLevel,

    /// Log output format
    #[arg(long, default_value = "compact", value_enum)]
    pub log_format: TracingFormat,
}

/// Parse command line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
