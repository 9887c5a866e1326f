//! Errors for scenario loading and headless runs.

use thiserror::Error;

/// Error type for scenario and runner operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Neither a built-in scenario nor a readable file.
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Failed to encode results.
    #[error("Failed to encode results: {0}")]
    Json(#[from] serde_json::Error),

    /// The simulation rejected the setup.
    #[error(transparent)]
    Game(#[from] siege_core::error::GameError),

    /// The scenario places units a replay cannot reproduce.
    #[error("Scenario '{0}' cannot be recorded: it places units outside the action stream")]
    NotReplayable(String),
}
