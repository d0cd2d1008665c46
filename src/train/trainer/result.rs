//! Training result types

use crate::eval::Metrics;
use serde::{Deserialize, Serialize};

/// Summary of one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Epoch number (1-indexed)
    pub epoch: usize,
    /// Size-weighted mean training loss
    pub loss: f32,
    /// Learning rate used for this epoch's updates
    pub lr: f32,
    pub train: Metrics,
    pub val: Metrics,
    /// Whether this epoch produced a new best snapshot
    pub improved: bool,
}

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainOutcome<M> {
    /// Snapshot of the model at `best_epoch`
    pub best: M,
    pub best_epoch: usize,
    /// Validation MSE of the best model
    pub min_val: f32,
    pub history: Vec<EpochRecord>,
    /// Total training time in seconds
    pub elapsed_secs: f64,
}

impl<M> TrainOutcome<M> {
    /// Number of epochs that ran
    pub fn epochs(&self) -> usize {
        self.history.len()
    }

    /// Record of the epoch the best model comes from
    pub fn best_record(&self) -> Option<&EpochRecord> {
        self.history.iter().find(|r| r.epoch == self.best_epoch)
    }
}
