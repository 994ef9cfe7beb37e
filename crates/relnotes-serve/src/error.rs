//! Error types for relnotes-serve

use thiserror::Error;

/// Result type alias for relnotes-serve operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while starting or running the preview server
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from relnotes-core
    #[error("Core error: {0}")]
    Core(#[from] relnotes_core::Error),

    /// Socket error while serving
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The listen address could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: String,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// A fixed port was configured but is already in use
    #[error("Port {port} is not available")]
    PortUnavailable {
        /// Configured port
        port: u16,
    },

    /// The OS could not hand out a free port
    #[error("No available port")]
    NoAvailablePort,
}
