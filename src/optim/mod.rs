//! Optimizers for training neural networks

mod adam;
mod adamw;
mod clip;
mod optimizer;
mod scheduler;

pub use adam::Adam;
pub use adamw::AdamW;
pub use clip::{clip_grad_value, clip_grad_value_refs, grad_norm};
pub use optimizer::Optimizer;
pub use scheduler::{LRScheduler, StepDecayLR};

use serde::{Deserialize, Serialize};

/// Optimizer family selected by the run configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    /// Adam with L2 weight decay added to the gradient
    #[default]
    Adam,
    /// Adam with decoupled weight decay
    AdamW,
}

impl OptimizerKind {
    /// Build a fresh optimizer with default betas
    pub fn build(self, lr: f32, weight_decay: f32) -> Box<dyn Optimizer> {
        match self {
            Self::Adam => Box::new(Adam::new(lr, 0.9, 0.999, 1e-8, weight_decay)),
            Self::AdamW => Box::new(AdamW::new(lr, 0.9, 0.999, 1e-8, weight_decay)),
        }
    }
}

impl std::fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Adam => write!(f, "adam"),
            Self::AdamW => write!(f, "adamw"),
        }
    }
}
