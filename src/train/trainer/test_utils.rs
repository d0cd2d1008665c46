//! Shared fixtures for trainer tests

use crate::data::PertBatch;
use crate::graph::Graph;
use crate::model::{GraphConvConfig, GraphConvModel};
use ndarray::Array2;

pub(crate) const GENES: usize = 3;
pub(crate) const FEATURES: usize = 2;

/// Cells cycling through `ctrl`, `KLF1`, `CEBPA` with a smooth target
pub(crate) fn batches(num_cells: usize, batch_size: usize, offset: usize) -> Vec<PertBatch> {
    let labels = ["ctrl", "KLF1", "CEBPA"];
    (0..num_cells)
        .collect::<Vec<_>>()
        .chunks(batch_size)
        .map(|cells| {
            let n = cells.len();
            let x = Array2::from_shape_fn((n * GENES, FEATURES), |(r, f)| {
                let cell = cells[r / GENES] + offset;
                ((cell * 7 + (r % GENES) * 3 + f) % 11) as f32 / 11.0
            });
            let y = Array2::from_shape_fn((n, GENES), |(i, g)| {
                let cell = cells[i] + offset;
                0.5 + 0.1 * g as f32 + 0.05 * (cell % 3) as f32
            });
            let pert = cells.iter().map(|&c| labels[(c + offset) % 3].to_string()).collect();
            PertBatch::new(x, y, pert).expect("fixture shapes are consistent")
        })
        .collect()
}

/// Path graph over the genes plus 8 train cells in 4 batches and 6 val
/// cells in 2 batches
pub(crate) fn fixture() -> (Graph, Vec<PertBatch>, Vec<PertBatch>) {
    let graph = Graph::new(GENES, vec![(0, 1), (1, 0), (1, 2), (2, 1)]).expect("valid edges");
    (graph, batches(8, 2, 0), batches(6, 3, 1))
}

pub(crate) fn model(seed: u64) -> GraphConvModel {
    GraphConvModel::new(
        GraphConvConfig { num_node_features: FEATURES, hidden_size: 4, use_edge_weights: false },
        seed,
    )
    .expect("positive dimensions")
}
