//! Adam optimizer with coupled L2 weight decay

use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// Adam optimizer
///
/// Weight decay is folded into the gradient before the moment updates
/// (`g ← g + λθ`), matching the classic L2-regularized Adam.
///
/// m_t = β1 m_{t-1} + (1 - β1) g
/// v_t = β2 v_{t-1} + (1 - β2) g²
/// θ_t = θ_{t-1} - lr · m̂_t / (√v̂_t + ε)
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>,
    v: Vec<Option<Array1<f32>>>,
}

impl Adam {
    /// Create a new Adam optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32, weight_decay: f32) -> Self {
        Self { lr, beta1, beta2, epsilon, weight_decay, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// Adam with the usual betas and epsilon
    pub fn default_params(lr: f32, weight_decay: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8, weight_decay)
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.t
    }

    #[must_use]
    pub fn weight_decay(&self) -> f32 {
        self.weight_decay
    }
}

impl Optimizer for Adam {
    fn step_refs(&mut self, params: &mut [&mut Tensor]) {
        if self.m.len() < params.len() {
            self.m.resize(params.len(), None);
            self.v.resize(params.len(), None);
        }
        self.t += 1;

        let bias1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias2 = 1.0 - self.beta2.powi(self.t as i32);

        for (i, param) in params.iter_mut().enumerate() {
            let Some(mut grad) = param.grad() else {
                continue;
            };
            if self.weight_decay != 0.0 {
                grad.scaled_add(self.weight_decay, param.data());
            }

            let m_t = match &self.m[i] {
                Some(m) => m * self.beta1 + &grad * (1.0 - self.beta1),
                None => &grad * (1.0 - self.beta1),
            };
            let grad_sq = &grad * &grad;
            let v_t = match &self.v[i] {
                Some(v) => v * self.beta2 + &grad_sq * (1.0 - self.beta2),
                None => &grad_sq * (1.0 - self.beta2),
            };

            let m_hat = &m_t / bias1;
            let denom = (&v_t / bias2).mapv(f32::sqrt) + self.epsilon;
            let update = &m_hat / &denom * self.lr;
            *param.data_mut() -= &update;

            self.m[i] = Some(m_t);
            self.v[i] = Some(v_t);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}
