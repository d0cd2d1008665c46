//! Optimizer trait

use crate::Tensor;

/// Trait for optimization algorithms
///
/// Parameters are usually borrowed from a model
/// (`PerturbationModel::parameters_mut`), so the reference form is the
/// primitive and the owned-slice form delegates to it.
pub trait Optimizer {
    /// Perform an optimization step on referenced parameters
    ///
    /// Parameters must be passed in the same order on every call; per-slot
    /// state (moments) is keyed by position.
    fn step_refs(&mut self, params: &mut [&mut Tensor]);

    /// Perform a single optimization step
    fn step(&mut self, params: &mut [Tensor]) {
        let mut refs: Vec<&mut Tensor> = params.iter_mut().collect();
        self.step_refs(&mut refs);
    }

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &mut [Tensor]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Zero gradients on referenced parameters
    fn zero_grad_refs(&mut self, params: &mut [&mut Tensor]) {
        for param in params.iter_mut() {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}
