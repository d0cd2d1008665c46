//! YAML schema for run configuration

use crate::error::Result;
use crate::train::{PerturbationLoss, TrainConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete run specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    pub data: DataSpec,

    #[serde(default)]
    pub model: ModelSpec,

    #[serde(default)]
    pub loss: LossSpec,

    /// Optimizer, schedule and loop settings
    #[serde(default)]
    pub training: TrainConfig,

    /// Where to write the best model, metrics and the resolved spec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

/// Dataset location and batching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSpec {
    /// JSON dataset file
    pub path: PathBuf,

    /// Short name used in the experiment name; defaults to the file stem
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl DataSpec {
    /// Dataset name for experiment naming
    pub fn dataset_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "dataset".to_string())
        })
    }
}

/// Model size; the input width comes from the dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,

    #[serde(default)]
    pub use_edge_weights: bool,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self { hidden_size: default_hidden_size(), use_edge_weights: false }
    }
}

/// Loss flags as written in run files
///
/// Resolved into a [`PerturbationLoss`] once, at validation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossSpec {
    /// `l2` or `l3`
    #[serde(default = "default_loss_mode")]
    pub loss_mode: String,

    /// Extra exponent for `l3`
    #[serde(default = "default_focal_gamma")]
    pub focal_gamma: f32,

    /// `micro`; anything else selects the weighted loss
    #[serde(default = "default_loss_type")]
    pub loss_type: String,

    /// Weight of non-control rows in the weighted loss
    #[serde(default = "default_pert_loss_wt")]
    pub pert_loss_wt: f32,
}

impl Default for LossSpec {
    fn default() -> Self {
        Self {
            loss_mode: default_loss_mode(),
            focal_gamma: default_focal_gamma(),
            loss_type: default_loss_type(),
            pert_loss_wt: default_pert_loss_wt(),
        }
    }
}

impl LossSpec {
    pub fn build(&self) -> Result<PerturbationLoss> {
        PerturbationLoss::from_flags(&self.loss_mode, self.focal_gamma, &self.loss_type, self.pert_loss_wt)
    }
}

fn default_batch_size() -> usize {
    100
}

fn default_hidden_size() -> usize {
    64
}

fn default_loss_mode() -> String {
    "l2".to_string()
}

fn default_focal_gamma() -> f32 {
    2.0
}

fn default_loss_type() -> String {
    "micro".to_string()
}

fn default_pert_loss_wt() -> f32 {
    1.0
}
