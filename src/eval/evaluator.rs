//! Model evaluation over batches and per-perturbation metrics

use super::metric::{Metric, Mse, R2Score};
use crate::data::PertBatch;
use crate::error::{Error, Result};
use crate::graph::{EdgeWeights, Graph};
use crate::model::PerturbationModel;
use crate::CTRL_LABEL;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Predictions, ground truth and labels for every evaluated cell
#[derive(Debug, Clone, PartialEq)]
pub struct EvalRecord {
    /// `n_cells × n_genes`
    pub pred: Array2<f32>,
    /// `n_cells × n_genes`
    pub truth: Array2<f32>,
    pub pert_cat: Vec<String>,
}

impl EvalRecord {
    pub fn num_cells(&self) -> usize {
        self.pert_cat.len()
    }

    pub fn num_genes(&self) -> usize {
        self.truth.ncols()
    }
}

/// Aggregate metrics over perturbations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub mse: f32,
    pub r2: f32,
    pub mse_de: f32,
    pub r2_de: f32,
}

/// Metrics of one perturbation's mean profile
///
/// The DE fields are absent for the control group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationMetrics {
    pub pert: String,
    pub num_cells: usize,
    pub mse: f32,
    pub r2: f32,
    pub mse_de: Option<f32>,
    pub r2_de: Option<f32>,
}

/// Run the model in eval mode over every batch and collect its outputs
///
/// `gene_idx` is checked against the gene count so a bad DE set fails
/// before metrics are computed.
pub fn evaluate<M: PerturbationModel>(
    batches: &[PertBatch],
    graph: &Graph,
    weights: Option<&EdgeWeights>,
    model: &mut M,
    gene_idx: Option<&[usize]>,
) -> Result<EvalRecord> {
    model.eval_mode();

    let num_genes = graph.num_nodes();
    if let Some(&bad) = gene_idx.and_then(|idx| idx.iter().find(|&&g| g >= num_genes)) {
        return Err(Error::InvalidInput(format!("DE gene index {bad} out of range 0..{num_genes}")));
    }

    let mut preds = Vec::with_capacity(batches.len());
    let mut pert_cat = Vec::new();
    for batch in batches {
        let pred = model.forward(batch, graph, weights)?;
        preds.push(pred.to_array2());
        pert_cat.extend(batch.pert.iter().cloned());
    }

    let pred = stack(preds.iter().map(|p| p.view()).collect(), num_genes)?;
    let truth = stack(batches.iter().map(|b| b.y.view()).collect(), num_genes)?;
    Ok(EvalRecord { pred, truth, pert_cat })
}

fn stack(parts: Vec<ndarray::ArrayView2<'_, f32>>, num_genes: usize) -> Result<Array2<f32>> {
    if parts.is_empty() {
        return Ok(Array2::zeros((0, num_genes)));
    }
    ndarray::concatenate(Axis(0), &parts)
        .map_err(|e| Error::InvalidInput(format!("batches disagree on gene count: {e}")))
}

/// Per-perturbation and aggregate MSE / R² of mean expression profiles
///
/// For each perturbation the predicted and true profiles are averaged over
/// its cells and compared gene by gene. The DE variants restrict the
/// comparison to `gene_idx` (all genes when `None`) and leave out the
/// control group; with no non-control group they are `NaN`.
pub fn compute_metrics(
    record: &EvalRecord,
    gene_idx: Option<&[usize]>,
) -> Result<(Metrics, Vec<PerturbationMetrics>)> {
    let num_genes = record.num_genes();
    if record.pred.dim() != record.truth.dim() || record.pert_cat.len() != record.truth.nrows() {
        return Err(Error::InvalidInput(format!(
            "record shapes disagree: pred {:?}, truth {:?}, {} labels",
            record.pred.dim(),
            record.truth.dim(),
            record.pert_cat.len()
        )));
    }
    let de_idx: Vec<usize> = match gene_idx {
        Some(idx) => {
            if let Some(&bad) = idx.iter().find(|&&g| g >= num_genes) {
                return Err(Error::InvalidInput(format!(
                    "DE gene index {bad} out of range 0..{num_genes}"
                )));
            }
            idx.to_vec()
        }
        None => (0..num_genes).collect(),
    };

    let mut order: Vec<&str> = Vec::new();
    let mut rows: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, pert) in record.pert_cat.iter().enumerate() {
        rows.entry(pert.as_str())
            .or_insert_with(|| {
                order.push(pert.as_str());
                Vec::new()
            })
            .push(i);
    }

    let mut detail = Vec::with_capacity(order.len());
    for pert in order {
        let idx = &rows[pert];
        let mean_pred = mean_rows(&record.pred, idx);
        let mean_truth = mean_rows(&record.truth, idx);

        let (mse_de, r2_de) = if pert == CTRL_LABEL {
            (None, None)
        } else {
            let p = mean_pred.select(Axis(0), &de_idx);
            let t = mean_truth.select(Axis(0), &de_idx);
            (Some(Mse.compute(p.view(), t.view())), Some(R2Score.compute(p.view(), t.view())))
        };

        detail.push(PerturbationMetrics {
            pert: pert.to_string(),
            num_cells: idx.len(),
            mse: Mse.compute(mean_pred.view(), mean_truth.view()),
            r2: R2Score.compute(mean_pred.view(), mean_truth.view()),
            mse_de,
            r2_de,
        });
    }

    let metrics = Metrics {
        mse: mean(detail.iter().map(|d| d.mse)),
        r2: mean(detail.iter().map(|d| d.r2)),
        mse_de: mean(detail.iter().filter_map(|d| d.mse_de)),
        r2_de: mean(detail.iter().filter_map(|d| d.r2_de)),
    };
    Ok((metrics, detail))
}

fn mean_rows(matrix: &Array2<f32>, rows: &[usize]) -> Array1<f32> {
    matrix
        .select(Axis(0), rows)
        .mean_axis(Axis(0))
        .expect("every perturbation group has at least one cell")
}

/// Mean of a sequence, `NaN` when empty
fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, n) = values.fold((0.0f32, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f32::NAN
    } else {
        sum / n as f32
    }
}
