//! JSON perturbation dataset reader

use super::PertBatch;
use crate::error::{Error, Result};
use crate::graph::{EdgeWeights, Graph};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Dataset partition a cell belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Val => write!(f, "val"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// `[src, dst]` or `[src, dst, weight]`, by gene index
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EdgeRecord {
    Weighted(usize, usize, f32),
    Plain(usize, usize),
}

#[derive(Debug, Deserialize)]
struct CellRecord {
    pert: String,
    split: Split,
    x: Vec<Vec<f32>>,
    y: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    genes: Vec<String>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
    node_features: usize,
    #[serde(default)]
    de_genes: Vec<String>,
    cells: Vec<CellRecord>,
}

#[derive(Debug, Clone)]
struct Cell {
    pert: String,
    split: Split,
    x: Array2<f32>,
    y: Array1<f32>,
}

/// Train/validation/test batches built from one dataset
#[derive(Debug, Clone)]
pub struct DataLoaders {
    pub train: Vec<PertBatch>,
    pub val: Vec<PertBatch>,
    pub test: Vec<PertBatch>,
}

/// Cells, gene graph and optional DE gene set read from a JSON file
///
/// ```json
/// {
///   "genes": ["A", "B"],
///   "edges": [[0, 1, 0.5]],
///   "node_features": 1,
///   "de_genes": ["B"],
///   "cells": [{ "pert": "ctrl", "split": "train", "x": [[0.1], [0.2]], "y": [0.1, 0.2] }]
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PertDataset {
    genes: Vec<String>,
    graph: Graph,
    edge_weights: Option<EdgeWeights>,
    node_features: usize,
    de_gene_idx: Vec<usize>,
    cells: Vec<Cell>,
}

impl PertDataset {
    /// Read and validate a dataset file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a dataset from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: DatasetFile = serde_json::from_str(content)?;
        Self::from_file(file)
    }

    fn from_file(file: DatasetFile) -> Result<Self> {
        let num_genes = file.genes.len();
        if num_genes == 0 {
            return Err(Error::InvalidInput("dataset has no genes".to_string()));
        }
        if file.node_features == 0 {
            return Err(Error::InvalidInput("node_features must be at least 1".to_string()));
        }

        let weighted = file.edges.iter().filter(|e| matches!(e, EdgeRecord::Weighted(..))).count();
        if weighted != 0 && weighted != file.edges.len() {
            return Err(Error::InvalidInput(
                "either every edge carries a weight or none does".to_string(),
            ));
        }
        let mut edge_index = Vec::with_capacity(file.edges.len());
        let mut weights = Vec::with_capacity(weighted);
        for edge in &file.edges {
            match *edge {
                EdgeRecord::Weighted(src, dst, w) => {
                    edge_index.push((src, dst));
                    weights.push(w);
                }
                EdgeRecord::Plain(src, dst) => edge_index.push((src, dst)),
            }
        }
        let graph = Graph::new(num_genes, edge_index)?;
        let edge_weights = (weighted > 0).then(|| Array1::from(weights));
        // Validates weight values
        graph.propagation(edge_weights.as_ref())?;

        let index: HashMap<&str, usize> =
            file.genes.iter().enumerate().map(|(i, g)| (g.as_str(), i)).collect();
        let de_gene_idx = file
            .de_genes
            .iter()
            .map(|g| {
                index
                    .get(g.as_str())
                    .copied()
                    .ok_or_else(|| Error::InvalidInput(format!("unknown DE gene '{g}'")))
            })
            .collect::<Result<Vec<_>>>()?;

        let cells = file
            .cells
            .into_iter()
            .enumerate()
            .map(|(i, cell)| Self::cell(i, cell, num_genes, file.node_features))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            genes: file.genes,
            graph,
            edge_weights,
            node_features: file.node_features,
            de_gene_idx,
            cells,
        })
    }

    fn cell(i: usize, record: CellRecord, num_genes: usize, features: usize) -> Result<Cell> {
        if record.y.len() != num_genes || record.x.len() != num_genes {
            return Err(Error::InvalidInput(format!(
                "cell {i}: expected {num_genes} genes, got x={} y={}",
                record.x.len(),
                record.y.len()
            )));
        }
        if let Some(row) = record.x.iter().find(|row| row.len() != features) {
            return Err(Error::InvalidInput(format!(
                "cell {i}: expected {features} node features, got {}",
                row.len()
            )));
        }
        let flat: Vec<f32> = record.x.into_iter().flatten().collect();
        let x = Array2::from_shape_vec((num_genes, features), flat)
            .map_err(|e| Error::InvalidInput(format!("cell {i}: {e}")))?;
        Ok(Cell { pert: record.pert, split: record.split, x, y: Array1::from(record.y) })
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn num_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn num_node_features(&self) -> usize {
        self.node_features
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn edge_weights(&self) -> Option<&EdgeWeights> {
        self.edge_weights.as_ref()
    }

    /// Indices of the differentially expressed genes, if the file lists any
    pub fn de_gene_idx(&self) -> Option<&[usize]> {
        (!self.de_gene_idx.is_empty()).then_some(self.de_gene_idx.as_slice())
    }

    pub fn num_cells(&self, split: Split) -> usize {
        self.cells.iter().filter(|c| c.split == split).count()
    }

    /// Distinct perturbation labels in a split, in first-appearance order
    pub fn perturbations(&self, split: Split) -> Vec<&str> {
        let mut seen = Vec::new();
        for cell in self.cells.iter().filter(|c| c.split == split) {
            if !seen.contains(&cell.pert.as_str()) {
                seen.push(cell.pert.as_str());
            }
        }
        seen
    }

    /// Group a split into batches of at most `batch_size` cells
    ///
    /// With a seed, cell order is shuffled deterministically first.
    pub fn batches(&self, split: Split, batch_size: usize, shuffle_seed: Option<u64>) -> Result<Vec<PertBatch>> {
        if batch_size == 0 {
            return Err(Error::InvalidInput("batch_size must be at least 1".to_string()));
        }
        let mut order: Vec<&Cell> = self.cells.iter().filter(|c| c.split == split).collect();
        if let Some(seed) = shuffle_seed {
            let mut rng = StdRng::seed_from_u64(seed);
            order.shuffle(&mut rng);
        }

        order.chunks(batch_size).map(|chunk| self.batch(chunk)).collect()
    }

    /// Shuffled train batches plus ordered validation and test batches
    pub fn loaders(&self, batch_size: usize, seed: u64) -> Result<DataLoaders> {
        Ok(DataLoaders {
            train: self.batches(Split::Train, batch_size, Some(seed))?,
            val: self.batches(Split::Val, batch_size, None)?,
            test: self.batches(Split::Test, batch_size, None)?,
        })
    }

    fn batch(&self, cells: &[&Cell]) -> Result<PertBatch> {
        let genes = self.num_genes();
        let mut x = Array2::zeros((cells.len() * genes, self.node_features));
        let mut y = Array2::zeros((cells.len(), genes));
        for (i, cell) in cells.iter().enumerate() {
            x.slice_mut(ndarray::s![i * genes..(i + 1) * genes, ..]).assign(&cell.x);
            y.row_mut(i).assign(&cell.y);
        }
        let pert = cells.iter().map(|c| c.pert.clone()).collect();
        PertBatch::new(x, y, pert)
    }
}
