//! Crate-wide error type

use thiserror::Error;

/// Errors surfaced by training, evaluation and configuration
#[derive(Debug, Error)]
pub enum Error {
    /// Shape or length mismatch between predictions, targets and labels
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Non-finite loss or gradient; the run is aborted
    #[error("Numeric instability: {0}")]
    NumericInstability(String),

    /// Unsupported or inconsistent configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No epoch produced a finite validation MSE
    #[error("No best model: validation MSE was never finite")]
    NoBestModel,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
