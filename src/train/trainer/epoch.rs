//! Epoch-level training

use super::core::Trainer;
use crate::data::PertBatch;
use crate::error::Result;
use crate::graph::{EdgeWeights, Graph};
use crate::model::PerturbationModel;
use crate::train::sink::keys;

impl Trainer {
    /// Train for one epoch
    ///
    /// Puts the model in training mode and runs [`train_step`](Self::train_step)
    /// on every batch in order. Every `print_progress_steps` steps (starting
    /// with the first) the step loss is logged; every step loss goes to the
    /// sinks as `training_loss`.
    ///
    /// # Returns
    ///
    /// Mean loss over the epoch, each batch weighted by its number of cells;
    /// `0.0` when there are no batches
    pub fn train_epoch<M: PerturbationModel>(
        &mut self,
        model: &mut M,
        batches: &[PertBatch],
        graph: &Graph,
        weights: Option<&EdgeWeights>,
    ) -> Result<f32> {
        model.train_mode();

        let every = self.config.print_progress_steps;
        let mut total_loss = 0.0f32;
        let mut num_graphs = 0usize;

        for (step, batch) in batches.iter().enumerate() {
            let loss = self.train_step(model, batch, graph, weights)?;
            total_loss += loss * batch.num_graphs() as f32;
            num_graphs += batch.num_graphs();

            if every > 0 && step % every == 0 {
                log::info!("Epoch {} Step {} Train Loss: {:.4}", self.epoch, step + 1, loss);
            }
            self.emit(Some(step + 1), vec![(keys::TRAINING_LOSS, loss)])?;
        }

        Ok(if num_graphs > 0 { total_loss / num_graphs as f32 } else { 0.0 })
    }
}
