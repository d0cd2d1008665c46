//! Tensor with gradient tracking

use super::BackwardOp;
use ndarray::{Array1, Array2, ArrayView2};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared gradient cell, written by backward ops of downstream tensors
pub type GradCell = Rc<RefCell<Option<Array1<f32>>>>;

/// Row-major 2-D tensor with an attached gradient tape entry
///
/// Data is stored as a flat buffer; vectors are a single row. Cloning a
/// tensor shares its gradient cell and backward op, which is how forward
/// passes route gradients back to model parameters. Use [`Tensor::deep_copy`]
/// for an independent copy.
#[derive(Clone)]
pub struct Tensor {
    data: Array1<f32>,
    shape: (usize, usize),
    grad: GradCell,
    backward_op: Option<Rc<dyn BackwardOp>>,
    requires_grad: bool,
}

impl Tensor {
    /// Create a row tensor from a flat buffer
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        let len = data.len();
        Self {
            data,
            shape: (1, len),
            grad: Rc::new(RefCell::new(None)),
            backward_op: None,
            requires_grad,
        }
    }

    /// Create a row tensor from a vector
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), requires_grad)
    }

    /// Create a zero-filled row tensor
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(len), requires_grad)
    }

    /// Create a matrix tensor from a 2-D array
    pub fn from_array2(array: &Array2<f32>, requires_grad: bool) -> Self {
        let (rows, cols) = array.dim();
        let flat: Array1<f32> = array.iter().copied().collect();
        let mut tensor = Self::new(flat, requires_grad);
        tensor.shape = (rows, cols);
        tensor
    }

    /// Create a zero-filled matrix tensor
    pub fn zeros_matrix(rows: usize, cols: usize, requires_grad: bool) -> Self {
        let mut tensor = Self::zeros(rows * cols, requires_grad);
        tensor.shape = (rows, cols);
        tensor
    }

    /// Op output constructor; the caller guarantees `rows * cols == data.len()`
    pub(crate) fn shaped(data: Array1<f32>, shape: (usize, usize), requires_grad: bool) -> Self {
        debug_assert_eq!(shape.0 * shape.1, data.len());
        let mut tensor = Self::new(data, requires_grad);
        tensor.shape = shape;
        tensor
    }

    /// View the same buffer under another shape
    ///
    /// The result shares the gradient cell and backward op, so gradients flow
    /// through unchanged (the flat layout is identical). Returns `None` if the
    /// element counts differ.
    pub fn with_shape(&self, rows: usize, cols: usize) -> Option<Self> {
        if rows * cols != self.data.len() {
            return None;
        }
        let mut view = self.clone();
        view.shape = (rows, cols);
        Some(view)
    }

    /// Independent copy: same data and shape, fresh gradient cell, no tape
    pub fn deep_copy(&self) -> Self {
        let mut copy = Self::new(self.data.clone(), self.requires_grad);
        copy.shape = self.shape;
        if let Some(grad) = self.grad() {
            copy.set_grad(grad);
        }
        copy
    }

    /// Copy of the data that does not take part in gradient computation
    pub fn detach(&self) -> Self {
        let mut copy = Self::new(self.data.clone(), false);
        copy.shape = self.shape;
        copy
    }

    /// Flat data buffer
    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    /// Mutable flat data buffer
    pub fn data_mut(&mut self) -> &mut Array1<f32> {
        &mut self.data
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.0
    }

    pub fn cols(&self) -> usize {
        self.shape.1
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the data as a matrix
    pub fn matrix(&self) -> ArrayView2<'_, f32> {
        self.data
            .view()
            .into_shape_with_order(self.shape)
            .expect("tensor buffer length matches its shape")
    }

    /// Owned matrix copy of the data
    pub fn to_array2(&self) -> Array2<f32> {
        self.matrix().to_owned()
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Current gradient, if any has been accumulated
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// Overwrite the gradient
    pub fn set_grad(&self, grad: Array1<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Add to the gradient (initializing it if absent)
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut cell = self.grad.borrow_mut();
        match cell.as_mut() {
            Some(existing) => *existing += &grad,
            None => *cell = Some(grad),
        }
    }

    /// Drop the accumulated gradient
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    /// Shared handle to the gradient cell
    pub fn grad_cell(&self) -> GradCell {
        Rc::clone(&self.grad)
    }

    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.clone()
    }

    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        self.backward_op = Some(op);
    }

    /// Whether two tensors share the same gradient cell
    pub fn shares_grad_with(&self, other: &Tensor) -> bool {
        Rc::ptr_eq(&self.grad, &other.grad)
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("data", &self.data)
            .field("requires_grad", &self.requires_grad)
            .field("has_grad", &self.grad.borrow().is_some())
            .finish()
    }
}
