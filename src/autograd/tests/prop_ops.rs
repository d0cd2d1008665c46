//! Property-based gradient checks for matmul, bias, relu and propagation

use super::test_utils::finite_difference;
use crate::autograd::{add_bias, backward, matmul, propagate, relu, Tensor};
use crate::graph::Graph;
use ndarray::Array2;
use proptest::prelude::*;
use std::rc::Rc;

fn matrix(rows: usize, cols: usize, data: &[f32], requires_grad: bool) -> Tensor {
    let array = Array2::from_shape_vec((rows, cols), data.to_vec()).expect("valid shape");
    Tensor::from_array2(&array, requires_grad)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_matmul_backward_gradient_check(
        (m, k, n, a_data, b_data) in (1usize..5, 1usize..5, 1usize..5).prop_flat_map(|(m, k, n)| (
            Just(m),
            Just(k),
            Just(n),
            prop::collection::vec(-3.0f32..3.0, m * k),
            prop::collection::vec(-3.0f32..3.0, k * n),
        ))
    ) {
        let a = matrix(m, k, &a_data, true);
        let b = matrix(k, n, &b_data, false);
        let mut c = matmul(&a, &b);
        backward(&mut c, None);

        let analytical = a.grad().expect("gradient should be available");
        let numerical = finite_difference(
            |x_val| matmul(&matrix(m, k, x_val, false), &matrix(k, n, &b_data, false)).data().sum(),
            &a_data,
            1e-2,
        );

        for i in 0..a_data.len() {
            let diff = (analytical[i] - numerical[i]).abs();
            prop_assert!(diff < 0.05, "index {}: analytical={}, numerical={}", i, analytical[i], numerical[i]);
        }
    }

    #[test]
    fn prop_add_bias_gradient_is_row_count(
        rows in 1usize..8,
        bias in prop::collection::vec(-5.0f32..5.0, 1..6),
    ) {
        let cols = bias.len();
        let x = Tensor::zeros_matrix(rows, cols, false);
        let b = Tensor::from_vec(bias, true);
        let mut y = add_bias(&x, &b);
        backward(&mut y, None);

        for g in b.grad().expect("gradient should be available").iter() {
            prop_assert!((g - rows as f32).abs() < 1e-6);
        }
    }

    #[test]
    fn prop_relu_backward_gradient_check(
        values in prop::collection::vec((0.1f32..5.0, any::<bool>()), 1..30)
    ) {
        // Keep inputs away from the kink at zero
        let x: Vec<f32> = values.iter().map(|&(v, neg)| if neg { -v } else { v }).collect();
        let a = Tensor::from_vec(x.clone(), true);
        let mut r = relu(&a);
        backward(&mut r, None);

        let analytical = a.grad().expect("gradient should be available");
        let numerical = finite_difference(
            |x_val| relu(&Tensor::from_vec(x_val.to_vec(), false)).data().sum(),
            &x,
            1e-2,
        );

        for i in 0..x.len() {
            prop_assert!((analytical[i] - numerical[i]).abs() < 1e-2);
        }
    }

    #[test]
    fn prop_propagate_backward_gradient_check(
        num_graphs in 1usize..3,
        edges in prop::collection::vec((0usize..4, 0usize..4), 0..8),
        seed_values in prop::collection::vec(-2.0f32..2.0, 8),
    ) {
        let graph = Graph::new(4, edges).expect("edges are in range");
        let prop_op = Rc::new(graph.propagation(None).expect("unweighted"));
        let rows = num_graphs * 4;
        let x_data: Vec<f32> = (0..rows).map(|i| seed_values[i % seed_values.len()]).collect();
        // Weight each output differently so the check is not just a column sum
        let probe: Vec<f32> = (0..rows).map(|i| 1.0 + i as f32 * 0.25).collect();

        let x = matrix(rows, 1, &x_data, true);
        let mut out = propagate(&x, &prop_op);
        backward(&mut out, Some(ndarray::Array1::from(probe.clone())));

        let analytical = x.grad().expect("gradient should be available");
        let numerical = finite_difference(
            |x_val| {
                let y = propagate(&matrix(rows, 1, x_val, false), &prop_op);
                y.data().iter().zip(probe.iter()).map(|(a, b)| a * b).sum()
            },
            &x_data,
            1e-2,
        );

        for i in 0..rows {
            prop_assert!((analytical[i] - numerical[i]).abs() < 0.05);
        }
    }
}
