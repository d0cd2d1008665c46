//! Autograd operations with backward passes
//!
//! This module provides differentiable operations for automatic differentiation.

mod activations;
mod matmul;
mod propagate;

// Re-export all public operations
pub use activations::relu;
pub use matmul::{add_bias, matmul};
pub use propagate::propagate;
