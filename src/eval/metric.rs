//! Regression metrics over expression profiles

use ndarray::ArrayView1;

/// Trait for evaluation metrics
pub trait Metric {
    /// Compute the metric given predicted and true profiles
    fn compute(&self, predictions: ArrayView1<'_, f32>, targets: ArrayView1<'_, f32>) -> f32;

    /// Name of the metric
    fn name(&self) -> &str;

    /// Whether higher values are better (true) or lower (false)
    fn higher_is_better(&self) -> bool {
        true
    }
}

/// Mean squared error
///
/// MSE = mean((y - y_pred)²), `NaN` for empty input
#[derive(Debug, Clone, Copy, Default)]
pub struct Mse;

impl Metric for Mse {
    fn compute(&self, predictions: ArrayView1<'_, f32>, targets: ArrayView1<'_, f32>) -> f32 {
        assert_eq!(predictions.len(), targets.len());
        if predictions.is_empty() {
            return f32::NAN;
        }
        let ss: f32 = predictions.iter().zip(targets.iter()).map(|(&p, &t)| (t - p).powi(2)).sum();
        ss / predictions.len() as f32
    }

    fn name(&self) -> &'static str {
        "MSE"
    }

    fn higher_is_better(&self) -> bool {
        false
    }
}

/// R² (coefficient of determination)
///
/// R² = 1 - SS_res / SS_tot
///
/// Where:
/// - SS_res = sum((y - y_pred)²)
/// - SS_tot = sum((y - y_mean)²)
///
/// For constant targets (SS_tot = 0) the score is 1.0 when the prediction
/// is exact and 0.0 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct R2Score;

impl Metric for R2Score {
    fn compute(&self, predictions: ArrayView1<'_, f32>, targets: ArrayView1<'_, f32>) -> f32 {
        assert_eq!(predictions.len(), targets.len());
        if predictions.is_empty() {
            return f32::NAN;
        }

        let mean = targets.sum() / targets.len() as f32;
        let ss_tot: f32 = targets.iter().map(|&t| (t - mean).powi(2)).sum();
        let ss_res: f32 = predictions.iter().zip(targets.iter()).map(|(&p, &t)| (t - p).powi(2)).sum();

        if ss_tot == 0.0 {
            return if ss_res == 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }

    fn name(&self) -> &'static str {
        "R²"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_mse() {
        let pred = arr1(&[1.0, 2.0, 3.0]);
        let truth = arr1(&[1.5, 2.5, 3.5]);
        assert_abs_diff_eq!(Mse.compute(pred.view(), truth.view()), 0.25, epsilon = 1e-6);
        assert!(!Mse.higher_is_better());
    }

    #[test]
    fn test_r2_perfect_prediction() {
        let y = arr1(&[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(R2Score.compute(y.view(), y.view()), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_r2_mean_prediction_is_zero() {
        let pred = arr1(&[2.0, 2.0, 2.0]);
        let truth = arr1(&[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(R2Score.compute(pred.view(), truth.view()), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_r2_constant_target() {
        let truth = arr1(&[4.0, 4.0]);
        assert_eq!(R2Score.compute(truth.view(), truth.view()), 1.0);
        assert_eq!(R2Score.compute(arr1(&[4.0, 5.0]).view(), truth.view()), 0.0);
    }

    #[test]
    fn test_empty_is_nan() {
        let empty = arr1(&[]);
        assert!(Mse.compute(empty.view(), empty.view()).is_nan());
        assert!(R2Score.compute(empty.view(), empty.view()).is_nan());
    }

    #[test]
    fn test_names() {
        assert_eq!(Mse.name(), "MSE");
        assert_eq!(R2Score.name(), "R²");
    }
}
