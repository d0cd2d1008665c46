//! Trainer: epoch runner, best-model selection and the full training loop
//!
//! - [`Trainer::train_step`] - one optimizer update on one batch
//! - [`Trainer::train_epoch`] - one pass over the training batches
//! - [`ModelSelector`] - keeps a snapshot of the lowest-validation-MSE model
//! - [`Trainer::train`] - epochs, LR schedule, evaluation and selection
//!
//! # Example
//!
//! ```no_run
//! use pertgnn::data::PertDataset;
//! use pertgnn::model::{GraphConvConfig, GraphConvModel};
//! use pertgnn::train::{PerturbationLoss, ProgressSink, TrainConfig, Trainer};
//!
//! let dataset = PertDataset::load("norman.json")?;
//! let loaders = dataset.loaders(32, 1)?;
//! let config = TrainConfig::new().with_max_epochs(10);
//!
//! let mut model = GraphConvModel::new(
//!     GraphConvConfig { num_node_features: dataset.num_node_features(), hidden_size: 64, use_edge_weights: false },
//!     config.seed,
//! )?;
//! let mut trainer = Trainer::new(config, PerturbationLoss::micro_l2())?;
//! trainer.add_sink(ProgressSink::new(10));
//!
//! let outcome = trainer.train(
//!     &mut model,
//!     &loaders.train,
//!     &loaders.val,
//!     dataset.graph(),
//!     dataset.edge_weights(),
//!     dataset.de_gene_idx(),
//! )?;
//! println!("best epoch {} (val mse {:.4})", outcome.best_epoch, outcome.min_val);
//! # Ok::<(), pertgnn::Error>(())
//! ```

mod core;
mod epoch;
mod result;
mod selector;
mod step;
mod train_loop;

#[cfg(test)]
pub(crate) mod test_utils;

pub use core::Trainer;
pub use result::{EpochRecord, TrainOutcome};
pub use selector::{BestModel, ModelSelector};
