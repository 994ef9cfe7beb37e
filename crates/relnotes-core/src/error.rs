//! Error types for relnotes-core.

use std::path::{Path, PathBuf};

/// Errors that can occur while loading, querying, or editing a changelog.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error without path context
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error on a specific file
    #[error("I/O error on {}: {source}", path.display())]
    IoWithPath {
        /// File that could not be read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A string could not be parsed as a version
    #[error("Invalid version '{input}': {reason}")]
    InvalidVersion {
        /// Offending input
        input: String,
        /// What is wrong with it
        reason: String,
    },

    /// The requested version has no section in the changelog
    #[error("Version not found: {version}")]
    VersionNotFound {
        /// Version that was requested
        version: String,
    },

    /// A release was requested but there is no Unreleased section
    #[error("No Unreleased section to release")]
    NoUnreleasedSection,

    /// A release would duplicate an existing version
    #[error("Version {version} already exists in the changelog")]
    DuplicateVersion {
        /// Version that already exists
        version: String,
    },

    /// A release would break descending order
    #[error("Version {version} is not greater than the latest release {latest}")]
    VersionNotGreater {
        /// Version that was requested
        version: String,
        /// Latest version already released
        latest: String,
    },

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },
}

/// Convenience `Result` type alias for relnotes operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it occurred on.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a new invalid-version error.
    pub fn invalid_version<I, R>(input: I, reason: R) -> Self
    where
        I: Into<String>,
        R: Into<String>,
    {
        Error::InvalidVersion {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new version-not-found error.
    pub fn version_not_found(version: impl ToString) -> Self {
        Error::VersionNotFound {
            version: version.to_string(),
        }
    }

    /// Returns `true` if the error was caused by user input rather than the
    /// environment (missing files, permissions).
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Error::Io(_) | Error::IoWithPath { .. })
    }
}
