//! Perturbation-aware regression loss

use crate::autograd::{BackwardOp, GradCell, Tensor};
use crate::error::{Error, Result};
use crate::CTRL_LABEL;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Residual exponent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LossMode {
    /// Squared error
    L2,
    /// Residual raised to `2 + gamma`
    L3 { gamma: f32 },
}

impl LossMode {
    /// Exponent applied to each residual
    pub fn exponent(&self) -> f32 {
        match self {
            Self::L2 => 2.0,
            Self::L3 { gamma } => 2.0 + gamma,
        }
    }

    /// Short flag used in experiment names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L2 => "l2",
            Self::L3 { .. } => "l3",
        }
    }
}

/// How per-cell errors are aggregated into the batch loss
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LossType {
    /// Mean over perturbation groups of each group's mean error
    Micro,
    /// Row-weighted MSE; non-control rows are scaled by `pert_weight`
    Weighted { pert_weight: f32 },
}

/// Batch loss over predictions grouped by perturbation label
///
/// ```
/// use pertgnn::train::PerturbationLoss;
/// use pertgnn::Tensor;
/// use ndarray::arr2;
///
/// let loss_fn = PerturbationLoss::micro_l2();
/// let y = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
/// let pred = Tensor::from_array2(&y, true);
/// let perts = vec!["ctrl".to_string(), "KLF1".to_string()];
///
/// let loss = loss_fn.forward(&pred, &y, &perts).unwrap();
/// assert_eq!(loss.data()[0], 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerturbationLoss {
    mode: LossMode,
    kind: LossType,
}

impl PerturbationLoss {
    /// Validate and combine a mode and an aggregation
    pub fn new(mode: LossMode, kind: LossType) -> Result<Self> {
        if let LossMode::L3 { gamma } = mode {
            if !gamma.is_finite() || gamma < 0.0 {
                return Err(Error::Configuration(format!(
                    "gamma must be finite and non-negative, got {gamma}"
                )));
            }
            if matches!(kind, LossType::Weighted { .. }) {
                return Err(Error::Configuration(
                    "loss_mode l3 is only supported with loss_type micro".to_string(),
                ));
            }
        }
        if let LossType::Weighted { pert_weight } = kind {
            if !pert_weight.is_finite() {
                return Err(Error::Configuration(format!(
                    "perturbation weight must be finite, got {pert_weight}"
                )));
            }
        }
        Ok(Self { mode, kind })
    }

    /// Resolve the string flags used by run configurations
    ///
    /// `loss_mode` is `"l2"` or `"l3"`; any `loss_type` other than
    /// `"micro"` selects the weighted aggregation.
    pub fn from_flags(loss_mode: &str, gamma: f32, loss_type: &str, weight: f32) -> Result<Self> {
        let mode = match loss_mode {
            "l2" => LossMode::L2,
            "l3" => LossMode::L3 { gamma },
            other => {
                return Err(Error::Configuration(format!(
                    "unknown loss_mode '{other}' (expected l2 or l3)"
                )))
            }
        };
        let kind = if loss_type == "micro" {
            LossType::Micro
        } else {
            LossType::Weighted { pert_weight: weight }
        };
        Self::new(mode, kind)
    }

    /// Micro-averaged squared error
    pub fn micro_l2() -> Self {
        Self { mode: LossMode::L2, kind: LossType::Micro }
    }

    pub fn mode(&self) -> LossMode {
        self.mode
    }

    pub fn kind(&self) -> LossType {
        self.kind
    }

    /// Compute the scalar loss and wire its gradient back to `pred`
    ///
    /// `pred` must be `batch × genes`, matching `y`, with one label per row.
    pub fn forward(&self, pred: &Tensor, y: &Array2<f32>, perts: &[String]) -> Result<Tensor> {
        let (rows, cols) = y.dim();
        if pred.shape() != (rows, cols) {
            return Err(Error::InvalidInput(format!(
                "prediction shape {:?} does not match target shape {:?}",
                pred.shape(),
                (rows, cols)
            )));
        }
        if perts.len() != rows {
            return Err(Error::InvalidInput(format!(
                "{} perturbation labels for {rows} rows",
                perts.len()
            )));
        }
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidInput("empty batch".to_string()));
        }

        let residual = &pred.matrix() - y;
        let (value, grad) = match self.kind {
            LossType::Micro => micro(&residual, perts, self.mode.exponent()),
            LossType::Weighted { pert_weight } => weighted(&residual, perts, pert_weight),
        };

        let mut loss = Tensor::from_vec(vec![value], pred.requires_grad());
        if pred.requires_grad() {
            loss.set_backward_op(Rc::new(PerturbationLossBackward {
                pred: pred.clone(),
                grad: grad.iter().copied().collect(),
                result_grad: loss.grad_cell(),
            }));
        }
        Ok(loss)
    }
}

impl fmt::Display for PerturbationLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mode, self.kind) {
            (LossMode::L2, LossType::Micro) => write!(f, "micro/l2"),
            (LossMode::L3 { gamma }, LossType::Micro) => write!(f, "micro/l3(gamma={gamma})"),
            (mode, LossType::Weighted { pert_weight }) => {
                write!(f, "weighted/{}(w={pert_weight})", mode.as_str())
            }
        }
    }
}

/// `r^p`, exact signed integer power for integral exponents and
/// `sign(r)·|r|^p` otherwise
pub(crate) fn signed_power(r: f32, p: f32) -> f32 {
    if p.fract() == 0.0 {
        r.powi(p as i32)
    } else {
        r.signum() * r.abs().powf(p)
    }
}

/// Derivative of [`signed_power`] with respect to `r`
pub(crate) fn signed_power_grad(r: f32, p: f32) -> f32 {
    if p.fract() == 0.0 {
        p * r.powi(p as i32 - 1)
    } else {
        p * r.abs().powf(p - 1.0)
    }
}

/// Row indices per label, in first-appearance order
fn group_rows(perts: &[String]) -> Vec<Vec<usize>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (row, label) in perts.iter().enumerate() {
        let slot = *index.entry(label.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }
    groups
}

fn micro(residual: &Array2<f32>, perts: &[String], p: f32) -> (f32, Array2<f32>) {
    let cols = residual.ncols() as f32;
    let groups = group_rows(perts);
    let num_groups = groups.len() as f32;

    let mut total = 0.0f32;
    let mut grad = Array2::zeros(residual.dim());
    for rows in &groups {
        let denom = rows.len() as f32 * cols;
        let mut group_sum = 0.0f32;
        for &i in rows {
            for (j, &r) in residual.row(i).iter().enumerate() {
                group_sum += signed_power(r, p);
                grad[[i, j]] = signed_power_grad(r, p) / (num_groups * denom);
            }
        }
        total += group_sum / denom;
    }
    (total / num_groups, grad)
}

fn weighted(residual: &Array2<f32>, perts: &[String], pert_weight: f32) -> (f32, Array2<f32>) {
    let (rows, cols) = residual.dim();
    let n = rows as f32;
    let c = cols as f32;

    let mut total = 0.0f32;
    let mut grad = Array2::zeros(residual.dim());
    for (i, label) in perts.iter().enumerate() {
        let w = if label == CTRL_LABEL { 1.0 } else { pert_weight };
        let row = residual.row(i);
        total += w * row.iter().map(|r| r * r).sum::<f32>() / c;
        grad.row_mut(i).assign(&row.mapv(|r| 2.0 * w * r / (n * c)));
    }
    (total / n, grad)
}

struct PerturbationLossBackward {
    pred: Tensor,
    grad: Array1<f32>,
    result_grad: GradCell,
}

impl BackwardOp for PerturbationLossBackward {
    fn backward(&self) {
        // Scalar upstream gradient, 1.0 when the loss is the root
        let upstream = self
            .result_grad
            .borrow()
            .as_ref()
            .and_then(|g| g.first().copied())
            .unwrap_or(1.0);

        self.pred.accumulate_grad(&self.grad * upstream);

        if let Some(op) = self.pred.backward_op() {
            op.backward();
        }
    }
}
