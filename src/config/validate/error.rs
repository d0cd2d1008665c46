//! Validation error types

use crate::error::Error;

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Dataset file does not exist: {0}")]
    DataPathNotFound(String),

    #[error("Invalid learning rate: {0} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid weight decay: {0} (must be finite and >= 0.0)")]
    InvalidWeightDecay(f32),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid hidden size: {0} (must be > 0)")]
    InvalidHiddenSize(usize),

    #[error("Invalid gradient clip value: {0} (must be finite and > 0.0)")]
    InvalidGradClip(f32),

    #[error("Invalid LR decay step size: {0} (must be > 0)")]
    InvalidLrDecayStep(usize),

    #[error("Invalid LR decay factor: {0} (must be in (0.0, 1.0])")]
    InvalidLrDecayFactor(f32),

    #[error("Invalid loss configuration: {0}")]
    InvalidLoss(String),
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Configuration(err.to_string())
    }
}
