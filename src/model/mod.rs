//! Perturbation response models
//!
//! The trainer only needs a forward pass, a train/eval switch and access to
//! the trainable tensors; [`PerturbationModel`] captures exactly that.

mod graph_conv;
mod state;

pub use graph_conv::{GraphConvConfig, GraphConvModel};
pub use state::{ModelState, ParameterState};

use crate::data::PertBatch;
use crate::error::Result;
use crate::graph::{EdgeWeights, Graph};
use crate::Tensor;

/// Model mapping a batch of cell graphs to predicted expression
pub trait PerturbationModel {
    /// Predict a `num_graphs × num_genes` expression matrix
    ///
    /// In training mode the result is attached to the autograd tape so a
    /// loss built on it can backpropagate into the parameters.
    fn forward(&self, batch: &PertBatch, graph: &Graph, weights: Option<&EdgeWeights>) -> Result<Tensor>;

    /// Enable gradient tracking for subsequent forward passes
    fn train_mode(&mut self);

    /// Disable gradient tracking for subsequent forward passes
    fn eval_mode(&mut self);

    fn is_training(&self) -> bool;

    /// Trainable tensors with stable names, in a fixed order
    fn named_parameters(&self) -> Vec<(&'static str, &Tensor)>;

    /// Trainable tensors, same order as [`named_parameters`](Self::named_parameters)
    fn parameters_mut(&mut self) -> Vec<&mut Tensor>;

    /// Fully independent copy whose tensors share nothing with `self`
    fn snapshot(&self) -> Self
    where
        Self: Sized;

    /// Short architecture name used in experiment names
    fn name(&self) -> &str;

    fn parameters(&self) -> Vec<&Tensor> {
        self.named_parameters().into_iter().map(|(_, t)| t).collect()
    }

    /// Total number of scalar parameters
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.len()).sum()
    }
}
