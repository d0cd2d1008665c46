//! Best-model selection on validation MSE

use crate::error::{Error, Result};
use crate::model::PerturbationModel;

/// Snapshot taken at the epoch with the lowest validation MSE so far
#[derive(Debug, Clone)]
pub struct BestModel<M> {
    pub model: M,
    /// Epoch (1-indexed) the snapshot was taken at
    pub epoch: usize,
    pub val_mse: f32,
}

/// Tracks `min_val` and keeps an independent copy of the best model
///
/// Only a strictly lower validation MSE replaces the snapshot, so ties keep
/// the earlier epoch and `NaN` never qualifies.
pub struct ModelSelector<M> {
    min_val: f32,
    best: Option<BestModel<M>>,
}

impl<M: PerturbationModel> ModelSelector<M> {
    pub fn new() -> Self {
        Self { min_val: f32::INFINITY, best: None }
    }

    /// Record an epoch's validation MSE, snapshotting `model` on improvement
    ///
    /// Returns `true` when a new snapshot was taken.
    pub fn observe(&mut self, epoch: usize, val_mse: f32, model: &M) -> bool {
        if val_mse < self.min_val {
            self.min_val = val_mse;
            self.best = Some(BestModel { model: model.snapshot(), epoch, val_mse });
            true
        } else {
            false
        }
    }

    /// Lowest validation MSE seen, `+inf` before any improvement
    pub fn min_val(&self) -> f32 {
        self.min_val
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best.as_ref().map(|b| b.epoch)
    }

    pub fn best(&self) -> Option<&BestModel<M>> {
        self.best.as_ref()
    }

    /// Consume the selector, failing if no snapshot was ever taken
    pub fn into_best(self) -> Result<BestModel<M>> {
        self.best.ok_or(Error::NoBestModel)
    }
}

impl<M: PerturbationModel> Default for ModelSelector<M> {
    fn default() -> Self {
        Self::new()
    }
}
