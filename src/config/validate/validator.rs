//! Configuration validation logic

use super::error::ValidationError;
use crate::config::schema::RunSpec;

/// Validate a run specification
///
/// Checks numeric ranges and resolves the loss flags. File paths are left
/// to [`validate_paths`].
pub fn validate_config(spec: &RunSpec) -> Result<(), ValidationError> {
    if spec.data.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(spec.data.batch_size));
    }

    if spec.model.hidden_size == 0 {
        return Err(ValidationError::InvalidHiddenSize(spec.model.hidden_size));
    }

    let training = &spec.training;

    // NaN fails both comparisons, so test for the valid range
    if !(training.lr > 0.0 && training.lr <= 1.0) {
        return Err(ValidationError::InvalidLearningRate(training.lr));
    }

    if !(training.weight_decay.is_finite() && training.weight_decay >= 0.0) {
        return Err(ValidationError::InvalidWeightDecay(training.weight_decay));
    }

    if training.max_epochs == 0 {
        return Err(ValidationError::InvalidEpochs(training.max_epochs));
    }

    if !(training.grad_clip_value.is_finite() && training.grad_clip_value > 0.0) {
        return Err(ValidationError::InvalidGradClip(training.grad_clip_value));
    }

    if training.lr_decay_step_size == 0 {
        return Err(ValidationError::InvalidLrDecayStep(training.lr_decay_step_size));
    }

    if !(training.lr_decay_factor > 0.0 && training.lr_decay_factor <= 1.0) {
        return Err(ValidationError::InvalidLrDecayFactor(training.lr_decay_factor));
    }

    spec.loss.build().map_err(|e| ValidationError::InvalidLoss(e.to_string()))?;

    Ok(())
}

/// Check that the dataset file exists
pub fn validate_paths(spec: &RunSpec) -> Result<(), ValidationError> {
    if !spec.data.path.is_file() {
        return Err(ValidationError::DataPathNotFound(spec.data.path.display().to_string()));
    }
    Ok(())
}
