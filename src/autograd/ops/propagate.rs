//! Neighbourhood propagation over the gene-interaction graph

use crate::autograd::{BackwardOp, GradCell, Tensor};
use crate::graph::Propagation;
use ndarray::Array1;
use std::rc::Rc;

/// Apply a graph propagation operator to stacked node features
///
/// `x` has `num_graphs * num_nodes` rows; every graph copy is propagated
/// independently.
pub fn propagate(x: &Tensor, prop: &Rc<Propagation>) -> Tensor {
    let (rows, cols) = x.shape();
    assert!(
        prop.num_nodes() > 0 && rows % prop.num_nodes() == 0,
        "Feature rows ({rows}) must be a multiple of the graph size ({})",
        prop.num_nodes()
    );

    let out = prop.apply(x.matrix());
    let data: Array1<f32> = out.iter().copied().collect();

    let requires_grad = x.requires_grad();
    let mut result = Tensor::shaped(data, (rows, cols), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(PropagateBackward {
            x: x.clone(),
            prop: Rc::clone(prop),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct PropagateBackward {
    x: Tensor,
    prop: Rc<Propagation>,
    result_grad: GradCell,
}

impl BackwardOp for PropagateBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.x.requires_grad() {
                // ∂L/∂x = P^T ∂L/∂out
                let grad_view = grad
                    .view()
                    .into_shape_with_order(self.x.shape())
                    .expect("gradient length matches output shape");
                let grad_x = self.prop.apply_transpose(grad_view);
                self.x.accumulate_grad(grad_x.iter().copied().collect());
            }

            if let Some(op) = self.x.backward_op() {
                op.backward();
            }
        }
    }
}
