//! Training step operations

use super::core::Trainer;
use crate::autograd::backward;
use crate::data::PertBatch;
use crate::error::{Error, Result};
use crate::graph::{EdgeWeights, Graph};
use crate::model::PerturbationModel;
use crate::optim::{clip_grad_value_refs, grad_norm};

impl Trainer {
    /// Perform a single training step
    ///
    /// Zero gradients, forward, loss, backward, clamp each gradient component
    /// to `±grad_clip_value`, optimizer step. A non-finite loss or gradient
    /// aborts with [`Error::NumericInstability`] before any parameter moves.
    ///
    /// # Returns
    ///
    /// Scalar loss value for this batch
    pub fn train_step<M: PerturbationModel>(
        &mut self,
        model: &mut M,
        batch: &PertBatch,
        graph: &Graph,
        weights: Option<&EdgeWeights>,
    ) -> Result<f32> {
        self.optimizer.zero_grad_refs(&mut model.parameters_mut());

        let pred = model.forward(batch, graph, weights)?;
        let mut loss = self.loss.forward(&pred, &batch.y, &batch.pert)?;
        let loss_val = loss.data()[0];
        if !loss_val.is_finite() {
            return Err(Error::NumericInstability(format!(
                "loss is {loss_val} at epoch {} step {}",
                self.epoch,
                self.global_step + 1
            )));
        }

        backward(&mut loss, None);

        // Clamping compares false against NaN, so check before clipping
        for (name, param) in model.named_parameters() {
            if let Some(grad) = param.grad() {
                if grad.iter().any(|g| !g.is_finite()) {
                    return Err(Error::NumericInstability(format!(
                        "non-finite gradient for parameter '{name}' at step {}",
                        self.global_step + 1
                    )));
                }
            }
        }

        let mut params = model.parameters_mut();
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("step {} grad norm {:.4}", self.global_step + 1, grad_norm(&params));
        }
        let clamped = clip_grad_value_refs(&mut params, self.config.grad_clip_value);
        if clamped > 0 {
            log::trace!("clamped {clamped} gradient components");
        }
        self.optimizer.step_refs(&mut params);

        self.global_step += 1;
        Ok(loss_val)
    }
}
