use binstage_core::{DEFAULT_PROJECT_ROOT_HOPS, TargetPlatform};
use clap::{Args, Parser, Subcommand};
use miette::{Diagnostic, Report};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// A required artifact was missing and `--strict` was given
pub const EXIT_STAGING: i32 = 1;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Unexpected runtime error exit code
pub const EXIT_OTHER: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(binstage::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Required artifacts were missing under strict mode (exit code 1)
    #[error("Staging failed: {message}")]
    #[diagnostic(code(binstage::cli::staging))]
    Staging {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
        /// Full staging report, attached to JSON error envelopes
        report: Option<serde_json::Value>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(binstage::cli::other))]
    Other {
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

    /// Create a new staging error with help text
    #[must_use]
    pub fn staging_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Staging {
            message: message.into(),
            help: Some(help.into()),
            report: None,
        }
    }

    /// Attach a serialized report to a staging error; other variants are unchanged.
    #[must_use]
    pub fn with_report(mut self, value: serde_json::Value) -> Self {
        if let Self::Staging { report, .. } = &mut self {
            *report = Some(value);
        }
        self
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new other error with help text
    #[must_use]
    pub fn other_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Convert `binstage_core::Error` to the matching `CliError` variant.
///
/// Manifest and path problems are configuration errors (exit code 2); I/O
/// errors are unexpected (exit code 3).
impl From<binstage_core::Error> for CliError {
    fn from(err: binstage_core::Error) -> Self {
        use binstage_core::Error;

        match err {
            // Extract just the message to avoid "Configuration error: Configuration error:"
            Error::Configuration { message } => Self::config(message),
            Error::UnknownPreset { ref available, .. } => {
                let help = available.clone();
                Self::Config {
                    message: err.to_string(),
                    help,
                }
            }
            Error::InvalidManifest { .. }
            | Error::ManifestParse { .. }
            | Error::UnsupportedVersion { .. } => Self::config_with_help(
                err.to_string(),
                "Check the manifest against the documented format",
            ),
            Error::ProjectRoot { .. } => Self::config_with_help(
                err.to_string(),
                "Pass --project-root explicitly or lower --project-root-hops",
            ),
            Error::Io {
                source,
                path,
                operation,
            } => {
                let path_str = path
                    .as_ref()
                    .map_or(String::new(), |p| format!(" on {}", p.display()));
                Self::other_with_help(
                    format!("I/O {operation} failed{path_str}: {source}"),
                    "Check file permissions and ensure the path exists",
                )
            }
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Staging { .. } => EXIT_STAGING,
        CliError::Other { .. } => EXIT_OTHER,
    }
}

/// Build the JSON error envelope for `err`
#[must_use]
pub fn error_envelope(err: &CliError) -> ErrorEnvelope<serde_json::Value> {
    let mut error = serde_json::json!({
        "code": match err {
            CliError::Config { .. } => "config",
            CliError::Staging { .. } => "staging",
            CliError::Other { .. } => "other",
        },
        "message": err.to_string()
    });
    if let CliError::Staging {
        report: Some(report),
        ..
    } = err
    {
        error["report"] = report.clone();
    }
    ErrorEnvelope::new(error)
}

/// Render error appropriately based on JSON flag
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = error_envelope(err);

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        // Use miette for human-friendly error display
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        // Ensure output is flushed before potential process exit
        let _ = io::stderr().flush();
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

/// Main CLI entry point for binstage.
///
/// Stages prebuilt native libraries into the directories a host build expects.
#[derive(Parser, Debug)]
#[command(name = "binstage")]
#[command(about = "Stage prebuilt native libraries into host build output directories")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: crate::tracing::LogLevel,

    /// Emit JSON logs and JSON envelopes on stdout.
    #[arg(long, global = true, help = "Emit JSON logs and JSON envelopes on stdout")]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy artifacts into their destinations and report the outcome.
    #[command(about = "Copy artifacts into their destinations and report the outcome")]
    Stage {
        /// Manifest, platform and directory selection.
        #[command(flatten)]
        target: TargetArgs,
        /// Exit with an error when a required artifact is missing.
        #[arg(long, help = "Exit with an error when a required artifact is missing")]
        strict: bool,
    },
    /// Print link libraries, delay-load list and runtime dependencies without copying.
    #[command(about = "Print link libraries, delay-load list and runtime dependencies")]
    Outputs {
        /// Manifest, platform and directory selection.
        #[command(flatten)]
        target: TargetArgs,
    },
    /// List platforms covered by the manifest.
    #[command(about = "List platforms covered by the manifest")]
    Platforms {
        /// Manifest selection.
        #[command(flatten)]
        manifest: ManifestArgs,
    },
    /// Show version information.
    #[command(about = "Show version information")]
    Version,
}

/// Which manifest to load.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ManifestArgs {
    /// Path to a manifest file. Takes precedence over `--preset`.
    #[arg(
        long,
        env = "BINSTAGE_MANIFEST",
        value_name = "PATH",
        help = "Path to a binstage.toml manifest (takes precedence over --preset)"
    )]
    pub manifest: Option<PathBuf>,

    /// Built-in preset name.
    #[arg(
        long,
        env = "BINSTAGE_PRESET",
        value_name = "NAME",
        help = "Built-in preset to use when no manifest is given"
    )]
    pub preset: Option<String>,
}

/// Platform and host directories for a staging run.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TargetArgs {
    /// Manifest selection.
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Target platform; defaults to the platform running binstage.
    #[arg(
        long,
        env = "BINSTAGE_PLATFORM",
        value_parser = parse_platform,
        help = "Target platform (win64, mac, linux, ...); defaults to the current platform"
    )]
    pub platform: Option<TargetPlatform>,

    /// Directory of the module that owns the artifacts.
    #[arg(
        long,
        env = "BINSTAGE_MODULE_ROOT",
        value_name = "DIR",
        default_value = ".",
        help = "Module directory that source directories are relative to"
    )]
    pub module_root: PathBuf,

    /// Host project root; derived from the module root when omitted.
    #[arg(
        long,
        env = "BINSTAGE_PROJECT_ROOT",
        value_name = "DIR",
        help = "Project root that destinations are relative to"
    )]
    pub project_root: Option<PathBuf>,

    /// Parent hops from module root to project root when `--project-root` is omitted.
    #[arg(
        long,
        env = "BINSTAGE_PROJECT_ROOT_HOPS",
        value_name = "N",
        default_value_t = DEFAULT_PROJECT_ROOT_HOPS,
        help = "Directories to walk up from the module root when --project-root is omitted"
    )]
    pub project_root_hops: usize,
}

fn parse_platform(s: &str) -> Result<TargetPlatform, String> {
    s.parse()
}

/// Parse command line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
