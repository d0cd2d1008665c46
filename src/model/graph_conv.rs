//! Single-layer neighbour-mean graph model

use super::PerturbationModel;
use crate::autograd::{add_bias, matmul, propagate, relu, Tensor};
use crate::data::PertBatch;
use crate::error::{Error, Result};
use crate::graph::{EdgeWeights, Graph};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Architecture hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConvConfig {
    /// Input features per gene node
    pub num_node_features: usize,
    /// Hidden units per node
    pub hidden_size: usize,
    /// Weight the neighbour mean by edge weights when they are supplied
    #[serde(default)]
    pub use_edge_weights: bool,
}

/// Graph model predicting one expression value per gene node
///
/// ```text
/// X [cells·genes, F]
///   → neighbour mean over the gene graph
///   → linear F→H, ReLU
///   → linear H→1
///   → reshape [cells, genes]
/// ```
///
/// Weights are shared across genes, so the parameter count does not depend
/// on the gene panel.
pub struct GraphConvModel {
    config: GraphConvConfig,
    w1: Tensor,
    b1: Tensor,
    w2: Tensor,
    b2: Tensor,
    training: bool,
}

impl GraphConvModel {
    /// Create a model with `U(-1/√fan_in, 1/√fan_in)` initial weights
    pub fn new(config: GraphConvConfig, seed: u64) -> Result<Self> {
        if config.num_node_features == 0 || config.hidden_size == 0 {
            return Err(Error::Configuration(format!(
                "num_node_features ({}) and hidden_size ({}) must be positive",
                config.num_node_features, config.hidden_size
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let (f, h) = (config.num_node_features, config.hidden_size);

        Ok(Self {
            config,
            w1: uniform(&mut rng, f, h, f),
            b1: uniform(&mut rng, 1, h, f),
            w2: uniform(&mut rng, h, 1, h),
            b2: uniform(&mut rng, 1, 1, h),
            training: true,
        })
    }

    pub fn config(&self) -> &GraphConvConfig {
        &self.config
    }

    /// Parameter handle for the forward pass: on the tape while training,
    /// detached otherwise
    fn param(&self, tensor: &Tensor) -> Tensor {
        if self.training {
            tensor.clone()
        } else {
            tensor.detach()
        }
    }
}

fn uniform(rng: &mut StdRng, rows: usize, cols: usize, fan_in: usize) -> Tensor {
    let bound = 1.0 / (fan_in as f32).sqrt();
    let data: Vec<f32> = (0..rows * cols).map(|_| rng.random_range(-bound..bound)).collect();
    let flat = Tensor::from_vec(data, true);
    flat.with_shape(rows, cols).expect("element count matches rows × cols")
}

impl PerturbationModel for GraphConvModel {
    fn forward(&self, batch: &PertBatch, graph: &Graph, weights: Option<&EdgeWeights>) -> Result<Tensor> {
        if batch.num_node_features() != self.config.num_node_features {
            return Err(Error::InvalidInput(format!(
                "batch has {} node features, model expects {}",
                batch.num_node_features(),
                self.config.num_node_features
            )));
        }
        if graph.num_nodes() == 0 {
            return Err(Error::InvalidInput("graph has no gene nodes".to_string()));
        }
        if graph.num_nodes() != batch.num_genes() {
            return Err(Error::InvalidInput(format!(
                "graph has {} nodes for {} genes",
                graph.num_nodes(),
                batch.num_genes()
            )));
        }

        let weights = if self.config.use_edge_weights { weights } else { None };
        let prop = Rc::new(graph.propagation(weights)?);

        let x = Tensor::from_array2(&batch.x, false);
        let pooled = propagate(&x, &prop);
        let hidden = relu(&add_bias(&matmul(&pooled, &self.param(&self.w1)), &self.param(&self.b1)));
        let out = add_bias(&matmul(&hidden, &self.param(&self.w2)), &self.param(&self.b2));

        out.with_shape(batch.num_graphs(), batch.num_genes()).ok_or_else(|| {
            Error::InvalidInput(format!("cannot reshape {:?} output to cells × genes", out.shape()))
        })
    }

    fn train_mode(&mut self) {
        self.training = true;
    }

    fn eval_mode(&mut self) {
        self.training = false;
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn named_parameters(&self) -> Vec<(&'static str, &Tensor)> {
        vec![("w1", &self.w1), ("b1", &self.b1), ("w2", &self.w2), ("b2", &self.b2)]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.w1, &mut self.b1, &mut self.w2, &mut self.b2]
    }

    fn snapshot(&self) -> Self {
        Self {
            config: self.config,
            w1: self.w1.deep_copy(),
            b1: self.b1.deep_copy(),
            w2: self.w2.deep_copy(),
            b2: self.b2.deep_copy(),
            training: self.training,
        }
    }

    fn name(&self) -> &str {
        "graph_conv"
    }
}
