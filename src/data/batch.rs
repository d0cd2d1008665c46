//! Batch data structure

use crate::error::{Error, Result};
use ndarray::Array2;

/// A batch of cells, each a copy of the gene graph with its own node features
///
/// `x` stacks the node features of every cell node-major
/// (`num_graphs * num_genes` rows), `y` holds one expression profile per
/// cell and `pert` one perturbation label per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PertBatch {
    /// Node features
    pub x: Array2<f32>,
    /// Target expression
    pub y: Array2<f32>,
    /// Perturbation labels
    pub pert: Vec<String>,
}

impl PertBatch {
    /// Create a batch, checking that the three parts agree on size
    pub fn new(x: Array2<f32>, y: Array2<f32>, pert: Vec<String>) -> Result<Self> {
        let (cells, genes) = y.dim();
        if pert.len() != cells {
            return Err(Error::InvalidInput(format!(
                "{} perturbation labels for {cells} cells",
                pert.len()
            )));
        }
        if x.nrows() != cells * genes {
            return Err(Error::InvalidInput(format!(
                "node feature rows ({}) must equal cells × genes ({cells} × {genes})",
                x.nrows()
            )));
        }
        Ok(Self { x, y, pert })
    }

    /// Number of cells (graph copies) in the batch
    pub fn num_graphs(&self) -> usize {
        self.y.nrows()
    }

    pub fn num_genes(&self) -> usize {
        self.y.ncols()
    }

    pub fn num_node_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.num_graphs() == 0
    }
}
