//! Multi-epoch training loop with per-epoch evaluation

use super::core::Trainer;
use super::result::{EpochRecord, TrainOutcome};
use super::selector::ModelSelector;
use crate::data::PertBatch;
use crate::error::Result;
use crate::eval::{compute_metrics, evaluate, Metrics};
use crate::graph::{EdgeWeights, Graph};
use crate::model::PerturbationModel;
use crate::optim::LRScheduler;
use crate::train::sink::{keys, TrainSummary};
use std::time::Instant;

impl Trainer {
    /// Train for `max_epochs` epochs and return the best model snapshot
    ///
    /// Each epoch runs [`train_epoch`](Self::train_epoch), advances the
    /// learning-rate schedule, evaluates on both splits (DE metrics over
    /// `gene_idx`), logs, and offers the model to a [`ModelSelector`] keyed
    /// on validation MSE.
    ///
    /// # Errors
    ///
    /// Any step or evaluation failure aborts the run. If no epoch produced
    /// a finite validation MSE (including `max_epochs == 0`) the result is
    /// [`Error::NoBestModel`](crate::Error::NoBestModel).
    pub fn train<M: PerturbationModel>(
        &mut self,
        model: &mut M,
        train: &[PertBatch],
        val: &[PertBatch],
        graph: &Graph,
        weights: Option<&EdgeWeights>,
        gene_idx: Option<&[usize]>,
    ) -> Result<TrainOutcome<M>> {
        self.start_time = Some(Instant::now());
        self.global_step = 0;

        let max_epochs = self.config.max_epochs;
        let mut selector = ModelSelector::new();
        let mut history = Vec::with_capacity(max_epochs);

        log::info!(
            "Start Training: {} epochs, {} train / {} val batches, loss {}, optimizer {}",
            max_epochs,
            train.len(),
            val.len(),
            self.loss,
            self.config.optimizer
        );

        for epoch in 1..=max_epochs {
            self.epoch = epoch;
            let lr = self.lr();
            let loss = self.train_epoch(model, train, graph, weights)?;

            self.scheduler.step();
            self.scheduler.apply(&mut *self.optimizer);

            let train_metrics = evaluate_split(model, train, graph, weights, gene_idx)?;
            let val_metrics = evaluate_split(model, val, graph, weights, gene_idx)?;

            log::info!(
                "Epoch {}: Train: {:.4}, R2 {:.4} Validation: {:.4}. R2 {:.4} Loss: {:.4}",
                epoch,
                train_metrics.mse,
                train_metrics.r2,
                val_metrics.mse,
                val_metrics.r2,
                loss
            );
            log::info!(
                "DE_Train: {:.4}, R2 {:.4} DE_Validation: {:.4}. R2 {:.4}",
                train_metrics.mse_de,
                train_metrics.r2_de,
                val_metrics.mse_de,
                val_metrics.r2_de
            );

            self.emit(
                None,
                vec![
                    (keys::TRAIN_MSE, train_metrics.mse),
                    (keys::TRAIN_R2, train_metrics.r2),
                    (keys::VAL_MSE, val_metrics.mse),
                    (keys::VAL_R2, val_metrics.r2),
                    (keys::TRAIN_DE_MSE, train_metrics.mse_de),
                    (keys::TRAIN_DE_R2, train_metrics.r2_de),
                    (keys::VAL_DE_MSE, val_metrics.mse_de),
                    (keys::VAL_DE_R2, val_metrics.r2_de),
                ],
            )?;

            let improved = selector.observe(epoch, val_metrics.mse, model);
            if improved {
                log::debug!("New best model at epoch {epoch} (val mse {:.4})", val_metrics.mse);
            }

            history.push(EpochRecord { epoch, loss, lr, train: train_metrics, val: val_metrics, improved });
        }

        let elapsed_secs = self.elapsed_secs();
        self.epoch = 0;
        let best = selector.into_best()?;
        log::info!("Done! Best epoch {} with validation MSE {:.4}", best.epoch, best.val_mse);

        self.sinks.on_train_end(&TrainSummary {
            epochs: history.len(),
            best_epoch: best.epoch,
            min_val: best.val_mse,
            elapsed_secs,
        })?;

        Ok(TrainOutcome { best: best.model, best_epoch: best.epoch, min_val: best.val_mse, history, elapsed_secs })
    }
}

fn evaluate_split<M: PerturbationModel>(
    model: &mut M,
    batches: &[PertBatch],
    graph: &Graph,
    weights: Option<&EdgeWeights>,
    gene_idx: Option<&[usize]>,
) -> Result<Metrics> {
    let record = evaluate(batches, graph, weights, model, gene_idx)?;
    let (metrics, _) = compute_metrics(&record, gene_idx)?;
    Ok(metrics)
}
