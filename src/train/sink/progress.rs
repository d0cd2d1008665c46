//! Progress sink for logging epoch timing

use super::traits::{keys, MetricsSink, SinkEntry, TrainSummary};
use crate::error::Result;

/// Logs a one-line summary per epoch with elapsed time
#[derive(Clone, Debug)]
pub struct ProgressSink {
    max_epochs: usize,
}

impl ProgressSink {
    pub fn new(max_epochs: usize) -> Self {
        Self { max_epochs }
    }

    /// Summary line for an epoch entry, `None` for step entries
    pub fn format(&self, entry: &SinkEntry) -> Option<String> {
        if !entry.is_epoch_summary() {
            return None;
        }
        let metric = |key| entry.get(key).map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
        Some(format!(
            "Epoch {}/{}: train_mse {} val_mse {} val_de_mse {} ({:.1}s)",
            entry.epoch,
            self.max_epochs,
            metric(keys::TRAIN_MSE),
            metric(keys::VAL_MSE),
            metric(keys::VAL_DE_MSE),
            entry.elapsed_secs
        ))
    }
}

impl MetricsSink for ProgressSink {
    fn log(&mut self, entry: &SinkEntry) -> Result<()> {
        if let Some(line) = self.format(entry) {
            log::info!("{line}");
        }
        Ok(())
    }

    fn on_train_end(&mut self, summary: &TrainSummary) -> Result<()> {
        log::info!(
            "Finished {} epochs in {:.1}s; best epoch {} (val mse {:.4})",
            summary.epochs,
            summary.elapsed_secs,
            summary.best_epoch,
            summary.min_val
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ProgressSink"
    }
}
