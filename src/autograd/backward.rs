//! Backward operation trait

/// A node on the gradient tape
///
/// Implementations read the gradient of their output from the shared cell,
/// accumulate gradients into their inputs and recurse into the inputs'
/// backward ops.
pub trait BackwardOp {
    fn backward(&self);
}
