//! Evaluation of perturbation models
//!
//! - [`evaluate`] runs a model over batches and gathers predictions
//! - [`compute_metrics`] reduces them to per-perturbation and aggregate
//!   MSE / R², both on all genes and on a DE gene subset

mod evaluator;
mod metric;


pub use evaluator::{compute_metrics, evaluate, EvalRecord, Metrics, PerturbationMetrics};
pub use metric::{Metric, Mse, R2Score};
