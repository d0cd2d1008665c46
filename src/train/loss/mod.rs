//! Loss functions for training
//!
//! - [`PerturbationLoss`] - micro-averaged or control-weighted regression
//!   loss over cells labelled by perturbation
//! - [`LossMode`] - squared (`l2`) or higher-power (`l3`) residuals
//! - [`LossType`] - group-balanced (`micro`) or row-weighted aggregation

mod perturbation;

#[cfg(test)]
mod tests;

pub use perturbation::{LossMode, LossType, PerturbationLoss};
