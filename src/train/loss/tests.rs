//! Tests for the perturbation loss

use super::perturbation::{signed_power, signed_power_grad};
use super::*;
use crate::autograd::tests::test_utils::finite_difference;
use crate::autograd::{backward, matmul, Tensor};
use crate::error::Error;
use approx::assert_abs_diff_eq;
use ndarray::{arr2, Array2};
use proptest::prelude::*;

fn labels(perts: &[&str]) -> Vec<String> {
    perts.iter().map(|p| p.to_string()).collect()
}

fn loss_value(loss_fn: &PerturbationLoss, pred: &Array2<f32>, y: &Array2<f32>, perts: &[String]) -> f32 {
    let pred = Tensor::from_array2(pred, false);
    loss_fn.forward(&pred, y, perts).unwrap().data()[0]
}

fn mse(pred: &Array2<f32>, y: &Array2<f32>) -> f32 {
    (pred - y).mapv(|r| r * r).mean().unwrap()
}

#[test]
fn test_exact_prediction_gives_zero_micro() {
    let y = arr2(&[[0.5, 1.0], [2.0, -1.0], [3.0, 0.0]]);
    let perts = labels(&["ctrl", "geneA", "geneA"]);
    let loss = loss_value(&PerturbationLoss::micro_l2(), &y, &y, &perts);
    assert_eq!(loss, 0.0);
}

#[test]
fn test_exact_prediction_gives_zero_weighted() {
    let y = arr2(&[[0.5, 1.0], [2.0, -1.0]]);
    let perts = labels(&["ctrl", "geneA"]);
    let loss_fn = PerturbationLoss::new(LossMode::L2, LossType::Weighted { pert_weight: 3.0 }).unwrap();
    assert_eq!(loss_value(&loss_fn, &y, &y, &perts), 0.0);
}

#[test]
fn test_constant_offset_two_groups_micro() {
    let d = 0.7;
    let y = arr2(&[[1.0, 2.0, 3.0], [0.0, 0.0, 0.0], [4.0, 5.0, 6.0], [1.0, 1.0, 1.0]]);
    let pred = y.mapv(|v| v + d);
    let perts = labels(&["A", "A", "B", "B"]);
    let loss = loss_value(&PerturbationLoss::micro_l2(), &pred, &y, &perts);
    assert_abs_diff_eq!(loss, d * d, epsilon = 1e-6);
}

#[test]
fn test_micro_balances_uneven_groups() {
    // Group A: 1 row with error 2 → mean 4; group B: 3 rows with error 0
    let y = Array2::zeros((4, 1));
    let pred = arr2(&[[2.0], [0.0], [0.0], [0.0]]);
    let perts = labels(&["A", "B", "B", "B"]);
    let loss = loss_value(&PerturbationLoss::micro_l2(), &pred, &y, &perts);
    assert_abs_diff_eq!(loss, 2.0, epsilon = 1e-6);
    // Plain MSE would weight the single row by 1/4
    assert_abs_diff_eq!(mse(&pred, &y), 1.0, epsilon = 1e-6);
}

#[test]
fn test_weighted_without_ctrl_doubles_mse() {
    let y = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
    let pred = arr2(&[[1.5, 1.0], [2.0, 4.5]]);
    let perts = labels(&["geneA", "geneB"]);
    let loss_fn = PerturbationLoss::new(LossMode::L2, LossType::Weighted { pert_weight: 2.0 }).unwrap();
    assert_abs_diff_eq!(loss_value(&loss_fn, &pred, &y, &perts), 2.0 * mse(&pred, &y), epsilon = 1e-6);
}

#[test]
fn test_weighted_ctrl_rows_keep_unit_weight() {
    let y = Array2::zeros((2, 1));
    let pred = arr2(&[[1.0], [1.0]]);
    let perts = labels(&["ctrl", "geneA"]);
    let loss_fn = PerturbationLoss::new(LossMode::L2, LossType::Weighted { pert_weight: 5.0 }).unwrap();
    // (1·1 + 5·1) / 2
    assert_abs_diff_eq!(loss_value(&loss_fn, &pred, &y, &perts), 3.0, epsilon = 1e-6);
}

#[test]
fn test_l3_integral_exponent_keeps_sign() {
    // gamma = 1 → r³, negative residuals give negative contributions
    let loss_fn = PerturbationLoss::new(LossMode::L3 { gamma: 1.0 }, LossType::Micro).unwrap();
    let y = arr2(&[[0.0]]);
    let pred = arr2(&[[-2.0]]);
    assert_abs_diff_eq!(loss_value(&loss_fn, &pred, &y, &labels(&["A"])), -8.0, epsilon = 1e-5);
}

#[test]
fn test_l3_default_gamma_is_fourth_power() {
    let loss_fn = PerturbationLoss::from_flags("l3", 2.0, "micro", 1.0).unwrap();
    let y = arr2(&[[0.0, 0.0]]);
    let pred = arr2(&[[-2.0, 1.0]]);
    assert_abs_diff_eq!(loss_value(&loss_fn, &pred, &y, &labels(&["A"])), 8.5, epsilon = 1e-5);
}

#[test]
fn test_signed_power_fractional() {
    assert_abs_diff_eq!(signed_power(-4.0, 2.5), -32.0, epsilon = 1e-4);
    assert_abs_diff_eq!(signed_power(4.0, 2.5), 32.0, epsilon = 1e-4);
    assert_abs_diff_eq!(signed_power_grad(-4.0, 2.5), 20.0, epsilon = 1e-4);
    assert_abs_diff_eq!(signed_power(0.0, 2.5), 0.0);
}

#[test]
fn test_shape_mismatch_is_invalid_input() {
    let y = Array2::zeros((2, 3));
    let pred = Tensor::zeros_matrix(2, 2, true);
    let err = PerturbationLoss::micro_l2().forward(&pred, &y, &labels(&["a", "b"])).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn test_label_count_mismatch_is_invalid_input() {
    let y = Array2::zeros((2, 3));
    let pred = Tensor::zeros_matrix(2, 3, true);
    let err = PerturbationLoss::micro_l2().forward(&pred, &y, &labels(&["a"])).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn test_empty_batch_is_invalid_input() {
    let y = Array2::zeros((0, 3));
    let pred = Tensor::zeros_matrix(0, 3, true);
    let err = PerturbationLoss::micro_l2().forward(&pred, &y, &[]).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn test_from_flags() {
    assert_eq!(PerturbationLoss::from_flags("l2", 0.0, "micro", 1.0).unwrap(), PerturbationLoss::micro_l2());
    let weighted = PerturbationLoss::from_flags("l2", 0.0, "macro", 4.0).unwrap();
    assert_eq!(weighted.kind(), LossType::Weighted { pert_weight: 4.0 });
    assert!(matches!(
        PerturbationLoss::from_flags("l4", 0.0, "micro", 1.0),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_unsupported_combinations_are_configuration_errors() {
    assert!(matches!(
        PerturbationLoss::from_flags("l3", 2.0, "weighted", 1.0),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        PerturbationLoss::new(LossMode::L3 { gamma: -1.0 }, LossType::Micro),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        PerturbationLoss::new(LossMode::L2, LossType::Weighted { pert_weight: f32::NAN }),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_gradient_flows_through_upstream_ops() {
    // pred = x·w, loss = mean over the single group of (pred - 0)²
    let x = Tensor::from_array2(&arr2(&[[1.0, 2.0]]), false);
    let w = Tensor::from_array2(&arr2(&[[0.5], [0.25]]), true);
    let pred = matmul(&x, &w);
    let y = Array2::zeros((1, 1));

    let mut loss = PerturbationLoss::micro_l2().forward(&pred, &y, &labels(&["A"])).unwrap();
    assert_abs_diff_eq!(loss.data()[0], 1.0, epsilon = 1e-6);
    backward(&mut loss, None);

    // ∂L/∂w = 2·r·x with r = 1
    let grad_w = w.grad().unwrap();
    assert_abs_diff_eq!(grad_w[0], 2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(grad_w[1], 4.0, epsilon = 1e-6);
}

#[test]
fn test_no_backward_op_without_grad() {
    let y = arr2(&[[1.0]]);
    let pred = Tensor::from_array2(&arr2(&[[2.0]]), false);
    let loss = PerturbationLoss::micro_l2().forward(&pred, &y, &labels(&["A"])).unwrap();
    assert!(loss.backward_op().is_none());
}

fn batch_strategy() -> impl Strategy<Value = (usize, usize, Vec<f32>, Vec<f32>, Vec<usize>)> {
    (1usize..6, 1usize..5).prop_flat_map(|(rows, cols)| {
        (
            Just(rows),
            Just(cols),
            prop::collection::vec(-1.5f32..1.5, rows * cols),
            prop::collection::vec(-1.5f32..1.5, rows * cols),
            prop::collection::vec(0usize..3, rows),
        )
    })
}

fn group_labels(ids: &[usize]) -> Vec<String> {
    ids.iter().map(|&i| if i == 0 { "ctrl".to_string() } else { format!("gene{i}") }).collect()
}

fn check_gradient(loss_fn: PerturbationLoss, rows: usize, cols: usize, pred: &[f32], y: &[f32], perts: &[String]) {
    let y = Array2::from_shape_vec((rows, cols), y.to_vec()).unwrap();
    let pred_arr = Array2::from_shape_vec((rows, cols), pred.to_vec()).unwrap();
    let pred_t = Tensor::from_array2(&pred_arr, true);
    let mut loss = loss_fn.forward(&pred_t, &y, perts).unwrap();
    backward(&mut loss, None);
    let analytical = pred_t.grad().unwrap();

    let numerical = finite_difference(
        |p| {
            let p = Array2::from_shape_vec((rows, cols), p.to_vec()).unwrap();
            loss_value(&loss_fn, &p, &y, perts)
        },
        pred,
        1e-3,
    );

    for (a, n) in analytical.iter().zip(numerical.iter()) {
        let tol = 5e-2 * n.abs().max(1.0);
        assert!((a - n).abs() <= tol, "analytical {a} vs numerical {n}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_exact_prediction_is_zero((rows, cols, y, _pred, ids) in batch_strategy(), weight in 0.1f32..5.0) {
        let y = Array2::from_shape_vec((rows, cols), y).unwrap();
        let perts = group_labels(&ids);
        let micro = PerturbationLoss::micro_l2();
        let weighted = PerturbationLoss::new(LossMode::L2, LossType::Weighted { pert_weight: weight }).unwrap();
        prop_assert_eq!(loss_value(&micro, &y, &y, &perts), 0.0);
        prop_assert_eq!(loss_value(&weighted, &y, &y, &perts), 0.0);
    }

    #[test]
    fn prop_micro_invariant_to_group_duplication(
        (rows, cols, y, pred, ids) in batch_strategy(),
        k in 2usize..4,
    ) {
        let perts = group_labels(&ids);
        let y = Array2::from_shape_vec((rows, cols), y).unwrap();
        let pred = Array2::from_shape_vec((rows, cols), pred).unwrap();
        let loss_fn = PerturbationLoss::micro_l2();
        let base = loss_value(&loss_fn, &pred, &y, &perts);

        // Repeat every row of the first row's group k times
        let target = perts[0].clone();
        let mut order = Vec::new();
        for (i, label) in perts.iter().enumerate() {
            let copies = if *label == target { k } else { 1 };
            order.extend(std::iter::repeat(i).take(copies));
        }
        let dup_y = y.select(ndarray::Axis(0), &order);
        let dup_pred = pred.select(ndarray::Axis(0), &order);
        let dup_perts: Vec<String> = order.iter().map(|&i| perts[i].clone()).collect();

        let duplicated = loss_value(&loss_fn, &dup_pred, &dup_y, &dup_perts);
        prop_assert!((base - duplicated).abs() <= 1e-4 * base.abs().max(1.0));
    }

    #[test]
    fn prop_weighted_unit_weight_is_mse((rows, cols, y, pred, ids) in batch_strategy()) {
        let perts = group_labels(&ids);
        let y = Array2::from_shape_vec((rows, cols), y).unwrap();
        let pred = Array2::from_shape_vec((rows, cols), pred).unwrap();
        let loss_fn = PerturbationLoss::new(LossMode::L2, LossType::Weighted { pert_weight: 1.0 }).unwrap();
        let loss = loss_value(&loss_fn, &pred, &y, &perts);
        prop_assert!((loss - mse(&pred, &y)).abs() <= 1e-5 * loss.abs().max(1.0));
    }

    #[test]
    fn prop_micro_l2_gradient_check((rows, cols, y, pred, ids) in batch_strategy()) {
        check_gradient(PerturbationLoss::micro_l2(), rows, cols, &pred, &y, &group_labels(&ids));
    }

    #[test]
    fn prop_micro_l3_gradient_check((rows, cols, y, pred, ids) in batch_strategy(), gamma in 0usize..3) {
        let loss_fn = PerturbationLoss::new(LossMode::L3 { gamma: gamma as f32 }, LossType::Micro).unwrap();
        check_gradient(loss_fn, rows, cols, &pred, &y, &group_labels(&ids));
    }

    #[test]
    fn prop_weighted_gradient_check((rows, cols, y, pred, ids) in batch_strategy(), weight in 0.1f32..3.0) {
        let loss_fn = PerturbationLoss::new(LossMode::L2, LossType::Weighted { pert_weight: weight }).unwrap();
        check_gradient(loss_fn, rows, cols, &pred, &y, &group_labels(&ids));
    }
}
