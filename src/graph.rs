//! Gene-interaction graph used as the structural prior
//!
//! The same graph is shared by every cell: a batch of `B` cells is the
//! disjoint union of `B` copies, stacked node-major in the feature matrix
//! (`B * num_nodes` rows).

use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Optional per-edge weights, aligned with [`Graph::edge_index`]
pub type EdgeWeights = Array1<f32>;

/// Directed edge list over `num_nodes` gene nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    num_nodes: usize,
    edge_index: Vec<(usize, usize)>,
}

impl Graph {
    /// Build a graph, rejecting edges that reference missing nodes
    pub fn new(num_nodes: usize, edge_index: Vec<(usize, usize)>) -> Result<Self> {
        if let Some(&(src, dst)) = edge_index
            .iter()
            .find(|&&(src, dst)| src >= num_nodes || dst >= num_nodes)
        {
            return Err(Error::InvalidInput(format!(
                "edge ({src}, {dst}) references a node outside 0..{num_nodes}"
            )));
        }
        Ok(Self { num_nodes, edge_index })
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.edge_index.len()
    }

    /// (source, target) pairs
    pub fn edge_index(&self) -> &[(usize, usize)] {
        &self.edge_index
    }

    /// Row-normalized propagation operator with self loops
    ///
    /// Node `i` receives `(x_i + Σ w_ji x_j) / (1 + Σ w_ji)` over its
    /// in-edges `j → i`; unweighted edges count 1.
    pub fn propagation(&self, weights: Option<&EdgeWeights>) -> Result<Propagation> {
        if let Some(w) = weights {
            if w.len() != self.edge_index.len() {
                return Err(Error::InvalidInput(format!(
                    "{} edge weights for {} edges",
                    w.len(),
                    self.edge_index.len()
                )));
            }
            if w.iter().any(|&v| !v.is_finite() || v < 0.0) {
                return Err(Error::InvalidInput(
                    "edge weights must be finite and non-negative".to_string(),
                ));
            }
        }

        let edge_weight = |e: usize| weights.map_or(1.0, |w| w[e]);

        let mut degree = vec![1.0f32; self.num_nodes];
        for (e, &(_, dst)) in self.edge_index.iter().enumerate() {
            degree[dst] += edge_weight(e);
        }

        let mut entries = Vec::with_capacity(self.num_nodes + self.edge_index.len());
        for (node, &deg) in degree.iter().enumerate() {
            entries.push((node, node, 1.0 / deg));
        }
        for (e, &(src, dst)) in self.edge_index.iter().enumerate() {
            entries.push((dst, src, edge_weight(e) / degree[dst]));
        }

        Ok(Propagation {
            num_nodes: self.num_nodes,
            entries,
        })
    }
}

/// Sparse `num_nodes × num_nodes` operator applied block-wise to a batch
#[derive(Debug, Clone)]
pub struct Propagation {
    num_nodes: usize,
    /// (target, source, coefficient)
    entries: Vec<(usize, usize, f32)>,
}

impl Propagation {
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// `out[g, i] = Σ coef · x[g, j]` for every graph copy `g`
    pub fn apply(&self, x: ArrayView2<'_, f32>) -> Array2<f32> {
        self.apply_impl(x, false)
    }

    /// Transposed operator, used by the backward pass
    pub fn apply_transpose(&self, x: ArrayView2<'_, f32>) -> Array2<f32> {
        self.apply_impl(x, true)
    }

    fn apply_impl(&self, x: ArrayView2<'_, f32>, transpose: bool) -> Array2<f32> {
        let (rows, cols) = x.dim();
        debug_assert_eq!(rows % self.num_nodes.max(1), 0);
        let num_graphs = if self.num_nodes == 0 { 0 } else { rows / self.num_nodes };

        let mut out = Array2::zeros((rows, cols));
        for g in 0..num_graphs {
            let base = g * self.num_nodes;
            for &(target, source, coef) in &self.entries {
                let (to, from) = if transpose { (source, target) } else { (target, source) };
                let src_row = x.row(base + from);
                let mut dst_row = out.row_mut(base + to);
                dst_row.scaled_add(coef, &src_row);
            }
        }
        out
    }
}
