//! Tape-based autograd engine
//!
//! Provides automatic differentiation over a computational graph recorded
//! while the forward pass runs. Every intermediate tensor is consumed by
//! exactly one downstream op in the models this crate builds, which is the
//! condition under which the recursive backward pass is exact.

mod backward;
mod ops;
mod tensor;

#[cfg(test)]
pub(crate) mod tests;

pub use backward::BackwardOp;
pub use ops::*;
pub use tensor::{GradCell, Tensor};

/// Perform backward pass on a tensor
pub fn backward(tensor: &mut Tensor, grad_output: Option<ndarray::Array1<f32>>) {
    if let Some(grad) = grad_output {
        tensor.set_grad(grad);
    } else {
        // Initialize with ones for scalar loss
        let ones = ndarray::Array1::ones(tensor.data().len());
        tensor.set_grad(ones);
    }

    if let Some(op) = tensor.backward_op() {
        op.backward();
    }
}
