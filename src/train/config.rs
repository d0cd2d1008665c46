//! Training hyperparameters

use crate::error::{Error, Result};
use crate::optim::OptimizerKind;
use serde::{Deserialize, Serialize};

/// Optimization schedule and loop settings
///
/// Defaults: 20 epochs, Adam at `lr = 5e-3` with weight decay `5e-4`,
/// halving the learning rate every 3 epochs, gradients clamped to ±1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub max_epochs: usize,
    pub lr: f32,
    pub weight_decay: f32,
    /// Epochs between learning-rate decays
    pub lr_decay_step_size: usize,
    /// Multiplier applied at each decay
    pub lr_decay_factor: f32,
    /// Log the step loss every N steps (0 disables)
    pub print_progress_steps: usize,
    /// Bound on each gradient component's magnitude
    pub grad_clip_value: f32,
    pub optimizer: OptimizerKind,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_epochs: 20,
            lr: 5e-3,
            weight_decay: 5e-4,
            lr_decay_step_size: 3,
            lr_decay_factor: 0.5,
            print_progress_steps: 50,
            grad_clip_value: 1.0,
            optimizer: OptimizerKind::Adam,
            seed: 1,
        }
    }
}

impl TrainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    pub fn with_lr(mut self, lr: f32) -> Self {
        self.lr = lr;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Multiply the learning rate by `factor` every `step_size` epochs
    pub fn with_lr_decay(mut self, step_size: usize, factor: f32) -> Self {
        self.lr_decay_step_size = step_size;
        self.lr_decay_factor = factor;
        self
    }

    pub fn with_print_progress_steps(mut self, steps: usize) -> Self {
        self.print_progress_steps = steps;
        self
    }

    pub fn with_grad_clip_value(mut self, clip: f32) -> Self {
        self.grad_clip_value = clip;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the values the optimizer, schedule and clamp rely on
    ///
    /// A zero learning rate is accepted (parameters stay fixed); the clip
    /// value must be finite and positive, since a NaN bound never clamps.
    pub fn validate(&self) -> Result<()> {
        // NaN fails every comparison, so test for the valid range
        if !(self.lr.is_finite() && self.lr >= 0.0) {
            return Err(invalid(format!("lr must be finite and >= 0, got {}", self.lr)));
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return Err(invalid(format!(
                "weight_decay must be finite and >= 0, got {}",
                self.weight_decay
            )));
        }
        if !(self.grad_clip_value.is_finite() && self.grad_clip_value > 0.0) {
            return Err(invalid(format!(
                "grad_clip_value must be finite and > 0, got {}",
                self.grad_clip_value
            )));
        }
        if self.lr_decay_step_size == 0 {
            return Err(invalid("lr_decay_step_size must be > 0".to_string()));
        }
        if !(self.lr_decay_factor.is_finite() && self.lr_decay_factor > 0.0) {
            return Err(invalid(format!(
                "lr_decay_factor must be finite and > 0, got {}",
                self.lr_decay_factor
            )));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> Error {
    Error::Configuration(msg)
}
