//! Declarative run configuration
//!
//! A YAML [`RunSpec`] names the dataset, model size, loss flags and training
//! hyperparameters. [`load_config`] parses and validates it;
//! [`run_experiment`] executes it end to end.
//!
//! ```yaml
//! data:
//!   path: data/norman.json
//!   batch_size: 32
//! model:
//!   hidden_size: 64
//! loss:
//!   loss_mode: l3
//!   focal_gamma: 2
//! training:
//!   max_epochs: 20
//!   lr: 0.005
//! output_dir: runs/norman
//! ```

mod cli;
mod schema;
mod train;
mod validate;

pub use cli::{apply_overrides, parse_args, Cli, Command, InfoArgs, OutputFormat, TrainArgs, ValidateArgs};
pub use schema::{DataSpec, LossSpec, ModelSpec, RunSpec};
pub use train::{experiment_name, load_config, run_experiment, ExperimentReport};
pub use validate::{validate_config, validate_paths, ValidationError};
