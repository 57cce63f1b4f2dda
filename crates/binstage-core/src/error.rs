//! Error types for binstage-core
//!
//! Staging itself never returns these: per-artifact failures are reported as
//! [`StagingStatus`](crate::StagingStatus) values. The variants here cover what
//! can go wrong before staging starts (reading and validating a manifest,
//! deriving the project root).

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for binstage-core operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {message}")]
    #[diagnostic(code(binstage::config::invalid))]
    Configuration {
        /// The error message describing the configuration issue
        message: String,
    },

    /// A platform entry in the manifest violates a profile invariant.
    #[error("Invalid manifest entry for platform '{platform}': {message}")]
    #[diagnostic(
        code(binstage::manifest::invalid),
        help("Artifact names must be plain filenames and appear in only one of `required` or `optional`")
    )]
    InvalidManifest {
        /// The platform key as written in the manifest.
        platform: String,
        /// What is wrong with the entry.
        message: String,
    },

    /// The manifest could not be parsed as TOML.
    #[error("Failed to parse manifest {origin}: {message}")]
    #[diagnostic(
        code(binstage::manifest::parse_failed),
        help("Check the manifest for TOML syntax errors or unknown fields")
    )]
    ManifestParse {
        /// Where the manifest came from (a path or a preset name).
        origin: String,
        /// The parser's description of the problem.
        message: String,
    },

    /// The manifest declares a format version newer than this build understands.
    #[error("Manifest version {found} is newer than supported version {supported}")]
    #[diagnostic(
        code(binstage::manifest::unsupported_version),
        help("Upgrade binstage to read this manifest")
    )]
    UnsupportedVersion {
        /// Version declared by the manifest.
        found: u32,
        /// Highest version supported by this build.
        supported: u32,
    },

    /// No built-in preset with the given name.
    #[error("Unknown preset '{name}'")]
    #[diagnostic(code(binstage::manifest::unknown_preset))]
    UnknownPreset {
        /// The requested preset name.
        name: String,
        /// Names of the presets that do exist.
        #[help]
        available: Option<String>,
    },

    /// Walking up from the module root ran out of parent directories.
    #[error("Cannot walk {hops} directories up from {}", module_root.display())]
    #[diagnostic(
        code(binstage::paths::project_root),
        help("Pass the project root explicitly instead of deriving it from the module root")
    )]
    ProjectRoot {
        /// The directory the walk started from.
        module_root: PathBuf,
        /// Number of parent hops requested.
        hops: usize,
    },

    /// I/O error with path context
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(binstage::io::error))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path where the I/O error occurred, if applicable
        path: Option<Box<Path>>,
        /// Description of the operation that failed
        operation: String,
    },
}

impl Error {
    /// Create a configuration error with a message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid manifest error for a platform entry
    pub fn invalid_manifest(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            platform: platform.into(),
            message: message.into(),
        }
    }

    /// Create a manifest parse error
    pub fn manifest_parse(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ManifestParse {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(source: std::io::Error, path: Option<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.map(PathBuf::into_boxed_path),
            operation: operation.into(),
        }
    }
}

/// Result type for binstage-core operations
pub type Result<T> = std::result::Result<T, Error>;
