//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! pertgnn train run.yaml
//! pertgnn train run.yaml --epochs 5 --lr 0.001 --output-dir runs/quick
//! pertgnn validate run.yaml
//! pertgnn info run.yaml --format json
//! ```

mod core;
mod types;

pub use core::{apply_overrides, parse_args, Cli, Command, InfoArgs, TrainArgs, ValidateArgs};
pub use types::OutputFormat;
