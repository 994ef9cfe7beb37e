//! Error types for relnotes-cli

use thiserror::Error;

/// Result type alias for relnotes-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in relnotes-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from relnotes-core
    #[error(transparent)]
    Core(#[from] relnotes_core::Error),

    /// Error from relnotes-serve
    #[error(transparent)]
    Serve(#[from] relnotes_serve::Error),

    /// A version lookup failed; carries the closest known version
    #[error("Version {version} not found{}", hint(.suggestion))]
    UnknownVersion {
        /// Version that was requested
        version: String,
        /// Closest known version, if any
        suggestion: Option<String>,
    },

    /// A range whose start is above its end
    #[error("Invalid range: {from} is greater than {to}")]
    InvalidRange {
        /// Exclusive lower bound
        from: String,
        /// Inclusive upper bound
        to: String,
    },

    /// Lint found problems
    #[error("Lint failed with {errors} error(s) and {warnings} warning(s)")]
    LintFailed {
        /// Number of errors
        errors: usize,
        /// Number of warnings
        warnings: usize,
    },
}

fn hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean {s}?)"))
        .unwrap_or_default()
}
