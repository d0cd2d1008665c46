//! Core traits and types for the metrics sink
//!
//! - `SinkEntry` - named scalars emitted at a step or epoch boundary
//! - `TrainSummary` - outcome reported once training finishes
//! - `MetricsSink` - the trait all sinks implement

use crate::error::Result;
use serde::Serialize;

/// Metric keys emitted by the trainer
pub mod keys {
    pub const TRAINING_LOSS: &str = "training_loss";
    pub const TRAIN_MSE: &str = "train_mse";
    pub const TRAIN_R2: &str = "train_r2";
    pub const VAL_MSE: &str = "val_mse";
    pub const VAL_R2: &str = "val_r2";
    pub const TRAIN_DE_MSE: &str = "train_de_mse";
    pub const TRAIN_DE_R2: &str = "train_de_r2";
    pub const VAL_DE_MSE: &str = "val_de_mse";
    pub const VAL_DE_R2: &str = "val_de_r2";
}

/// Named scalars logged together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkEntry {
    /// Epoch (1-indexed)
    pub epoch: usize,
    /// Step within the epoch (1-indexed); `None` for epoch summaries
    pub step: Option<usize>,
    /// Optimizer steps taken so far
    pub global_step: usize,
    /// Seconds since training started
    pub elapsed_secs: f64,
    pub values: Vec<(&'static str, f32)>,
}

impl SinkEntry {
    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<f32> {
        self.values.iter().find(|(k, _)| *k == key).map(|&(_, v)| v)
    }

    pub fn is_epoch_summary(&self) -> bool {
        self.step.is_none()
    }
}

/// Final state of a training run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainSummary {
    pub epochs: usize,
    pub best_epoch: usize,
    pub min_val: f32,
    pub elapsed_secs: f64,
}

/// Receiver for training metrics
///
/// All methods have no-op defaults, so a sink only implements the events it
/// cares about. Errors abort the run.
pub trait MetricsSink {
    /// Called after every optimizer step and once per epoch
    fn log(&mut self, _entry: &SinkEntry) -> Result<()> {
        Ok(())
    }

    /// Called once after the best model has been selected
    fn on_train_end(&mut self, _summary: &TrainSummary) -> Result<()> {
        Ok(())
    }

    /// Get sink name for logging
    fn name(&self) -> &'static str {
        "MetricsSink"
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn name(&self) -> &'static str {
        "NoopSink"
    }
}
