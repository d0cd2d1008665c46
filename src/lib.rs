//! # pertgnn
//!
//! Graph neural network training for single-cell perturbation response
//! prediction. A gene-interaction network serves as the structural prior;
//! the model predicts the expression profile of every gene for a perturbed
//! cell.
//!
//! The crate is organised around a small tape-based autograd engine:
//!
//! - [`autograd`] - `Tensor`, backward ops and differentiable primitives
//! - [`train`] - perturbation-aware loss, epoch runner, best-model selection
//! - [`optim`] - Adam/AdamW, element-wise gradient clipping, step decay
//! - [`eval`] - evaluation and per-perturbation metrics
//! - [`model`] - the `PerturbationModel` capability and a reference graph model
//! - [`data`] / [`graph`] - batches and the gene-interaction graph
//! - [`config`] / [`cli`] - YAML run specs and the command-line front end
//!
//! # Example
//!
//! ```no_run
//! use pertgnn::train::{PerturbationLoss, TrainConfig, Trainer};
//!
//! let config = TrainConfig::new().with_max_epochs(20).with_lr(5e-3);
//! let loss = PerturbationLoss::micro_l2();
//! let trainer = Trainer::new(config, loss)?;
//! // let outcome = trainer.train(model, &train, &val, &graph, None, None)?;
//! # Ok::<(), pertgnn::Error>(())
//! ```

pub mod autograd;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod graph;
pub mod model;
pub mod optim;
pub mod train;

pub use autograd::Tensor;
pub use error::{Error, Result};

/// Perturbation label of unperturbed control cells
pub const CTRL_LABEL: &str = "ctrl";
