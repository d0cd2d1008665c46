//! Serializable model parameters

use super::PerturbationModel;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One named parameter tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterState {
    pub name: String,
    pub shape: (usize, usize),
    pub data: Vec<f32>,
}

/// Parameter values of a model, as written to `best_model.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    pub model: String,
    pub parameters: Vec<ParameterState>,
}

impl ModelState {
    /// Capture the current parameter values of a model
    pub fn from_model<M: PerturbationModel>(model: &M) -> Self {
        let parameters = model
            .named_parameters()
            .into_iter()
            .map(|(name, tensor)| ParameterState {
                name: name.to_string(),
                shape: tensor.shape(),
                data: tensor.data().to_vec(),
            })
            .collect();
        Self { model: model.name().to_string(), parameters }
    }

    /// Copy stored values into a model with the same architecture
    pub fn apply_to<M: PerturbationModel>(&self, model: &mut M) -> Result<()> {
        if self.model != model.name() {
            return Err(Error::InvalidInput(format!(
                "state is for model '{}', not '{}'",
                self.model,
                model.name()
            )));
        }
        let names: Vec<&str> = model.named_parameters().into_iter().map(|(n, _)| n).collect();
        let mut params = model.parameters_mut();
        if params.len() != self.parameters.len() {
            return Err(Error::InvalidInput(format!(
                "state has {} parameters, model has {}",
                self.parameters.len(),
                params.len()
            )));
        }
        for ((param, name), stored) in params.iter_mut().zip(names).zip(&self.parameters) {
            if stored.name != name || stored.shape != param.shape() || stored.data.len() != param.len() {
                return Err(Error::InvalidInput(format!(
                    "parameter '{}' {:?} does not fit '{name}' {:?}",
                    stored.name,
                    stored.shape,
                    param.shape()
                )));
            }
            param.data_mut().assign(&ndarray::ArrayView1::from(&stored.data[..]));
        }
        Ok(())
    }

    pub fn num_parameters(&self) -> usize {
        self.parameters.iter().map(|p| p.data.len()).sum()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
