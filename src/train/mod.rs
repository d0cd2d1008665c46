//! Training: loss, trainer loop, best-model selection and metrics sinks
//!
//! - [`PerturbationLoss`] - micro-averaged or weighted loss over perturbation groups
//! - [`Trainer`] - epoch runner and training orchestrator
//! - [`ModelSelector`] - lowest-validation-MSE snapshotting
//! - [`MetricsSink`] - side channel for experiment trackers
//!
//! # Example
//!
//! ```
//! use pertgnn::train::{LossMode, LossType, PerturbationLoss, TrainConfig, Trainer};
//!
//! let loss = PerturbationLoss::new(LossMode::L3 { gamma: 2.0 }, LossType::Micro)?;
//! let config = TrainConfig::new().with_max_epochs(20).with_lr(5e-3);
//! let trainer = Trainer::new(config, loss)?;
//! assert_eq!(trainer.lr(), 5e-3);
//! # Ok::<(), pertgnn::Error>(())
//! ```

mod config;
mod loss;
pub mod sink;
mod trainer;

pub use config::TrainConfig;
pub use loss::{LossMode, LossType, PerturbationLoss};
pub use sink::{JsonLinesSink, MemorySink, MetricsSink, NoopSink, ProgressSink, SinkEntry, SinkManager, TrainSummary};
pub use trainer::{BestModel, EpochRecord, ModelSelector, TrainOutcome, Trainer};
