//! Error types for the host driver and the wire format.

use thiserror::Error;

/// Failures starting, feeding or stopping the driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The server configuration could not be read.
    #[error("Failed to load server config '{path}': {message}")]
    Config {
        /// Path to the file.
        path: String,
        /// Error message.
        message: String,
    },

    /// A client asked to run the tick engine.
    #[error("Role {0:?} does not run the simulation")]
    NotAuthoritative(crate::Role),

    /// The driver task has already stopped.
    #[error("Driver is not running")]
    Stopped,

    /// The driver task panicked or was cancelled.
    #[error("Driver task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Failures encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Invalid JSON or an unknown message shape.
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A well-formed message this end should never receive.
    #[error("Unexpected {message} message for a {role:?}")]
    Unexpected {
        /// Message kind.
        message: &'static str,
        /// Receiving role.
        role: crate::Role,
    },
}
