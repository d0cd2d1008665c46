//! Matrix multiplication and bias broadcast autograd operations

use crate::autograd::{BackwardOp, GradCell, Tensor};
use ndarray::{Array1, ArrayView2, Axis};
use std::rc::Rc;

fn grad_matrix(grad: &Array1<f32>, shape: (usize, usize)) -> ArrayView2<'_, f32> {
    grad.view()
        .into_shape_with_order(shape)
        .expect("gradient length matches output shape")
}

/// Matrix multiplication
///
/// Computes C = A @ B for A (m×k) and B (k×n), giving C (m×n).
pub fn matmul(a: &Tensor, b: &Tensor) -> Tensor {
    let (m, k) = a.shape();
    let (k_b, n) = b.shape();
    assert_eq!(k, k_b, "Inner dimensions must match: {m}x{k} @ {k_b}x{n}");

    let product = a.matrix().dot(&b.matrix());
    let data: Array1<f32> = product.iter().copied().collect();

    let requires_grad = a.requires_grad() || b.requires_grad();
    let mut result = Tensor::shaped(data, (m, n), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(MatmulBackward {
            a: a.clone(),
            b: b.clone(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct MatmulBackward {
    a: Tensor,
    b: Tensor,
    result_grad: GradCell,
}

impl BackwardOp for MatmulBackward {
    fn backward(&self) {
        if let Some(grad_output) = self.result_grad.borrow().as_ref() {
            let grad_c = grad_matrix(grad_output, (self.a.rows(), self.b.cols()));

            if self.a.requires_grad() {
                // ∂L/∂A = ∂L/∂C @ B^T
                let grad_a = grad_c.dot(&self.b.matrix().t());
                self.a.accumulate_grad(grad_a.iter().copied().collect());
            }

            if self.b.requires_grad() {
                // ∂L/∂B = A^T @ ∂L/∂C
                let grad_b = self.a.matrix().t().dot(&grad_c);
                self.b.accumulate_grad(grad_b.iter().copied().collect());
            }

            if let Some(op) = self.a.backward_op() {
                op.backward();
            }
            if let Some(op) = self.b.backward_op() {
                op.backward();
            }
        }
    }
}

/// Add a bias row (1×n) to every row of X (m×n)
pub fn add_bias(x: &Tensor, bias: &Tensor) -> Tensor {
    let (m, n) = x.shape();
    assert_eq!(bias.len(), n, "Bias length must equal column count");

    let mut out = x.to_array2();
    out += bias.data();
    let data: Array1<f32> = out.iter().copied().collect();

    let requires_grad = x.requires_grad() || bias.requires_grad();
    let mut result = Tensor::shaped(data, (m, n), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(AddBiasBackward {
            x: x.clone(),
            bias: bias.clone(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct AddBiasBackward {
    x: Tensor,
    bias: Tensor,
    result_grad: GradCell,
}

impl BackwardOp for AddBiasBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.x.requires_grad() {
                self.x.accumulate_grad(grad.clone());
            }
            if self.bias.requires_grad() {
                // ∂L/∂b = column sums of ∂L/∂out
                let grad_b = grad_matrix(grad, self.x.shape()).sum_axis(Axis(0));
                self.bias.accumulate_grad(grad_b);
            }

            if let Some(op) = self.x.backward_op() {
                op.backward();
            }
            if let Some(op) = self.bias.backward_op() {
                op.backward();
            }
        }
    }
}
