//! Error types for the battle simulation.
//!
//! The tick itself never fails: rejected recruits and unknown actions are
//! silent no-ops. These errors cover the fallible edges around it: loading
//! configuration tables, encoding snapshots and replays.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation-adjacent failures.
#[derive(Debug, Error)]
pub enum GameError {
    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Failed to read or write a file.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path involved in the failed operation.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration table is missing an entry or holds an unusable value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown map identifier.
    #[error("Unknown map: {0}")]
    UnknownMap(String),

    /// Binary encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Replay file does not match this build.
    #[error("Replay version mismatch: expected {expected}, got {found}")]
    ReplayVersion {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// Desync detected between a replay and its recorded outcome.
    #[error("Desync detected at {at_ms}ms: expected hash {expected}, got {actual}")]
    DesyncDetected {
        /// Simulation timestamp where the mismatch was found.
        at_ms: u64,
        /// Recorded hash.
        expected: u64,
        /// Hash produced by the replayed simulation.
        actual: u64,
    },
}

impl From<bincode::Error> for GameError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
