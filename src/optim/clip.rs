//! Gradient clipping utilities

use crate::Tensor;

/// Clamp every gradient component into `[-clip_value, clip_value]`
///
/// Unlike norm clipping this changes the gradient direction; each element
/// is bounded independently. NaN components are left untouched, so callers
/// that care must check finiteness first.
///
/// # Returns
/// Number of components that were clamped
pub fn clip_grad_value_refs(params: &mut [&mut Tensor], clip_value: f32) -> usize {
    let mut clamped = 0;

    for param in params.iter() {
        if let Some(grad) = param.grad() {
            let over = grad.iter().filter(|g| g.abs() > clip_value).count();
            if over > 0 {
                clamped += over;
                param.set_grad(grad.mapv(|g| g.clamp(-clip_value, clip_value)));
            }
        }
    }

    clamped
}

/// Owned-slice form of [`clip_grad_value_refs`]
pub fn clip_grad_value(params: &mut [Tensor], clip_value: f32) -> usize {
    let mut refs: Vec<&mut Tensor> = params.iter_mut().collect();
    clip_grad_value_refs(&mut refs, clip_value)
}

/// Global L2 norm of all gradients, ignoring parameters without one
pub fn grad_norm(params: &[&mut Tensor]) -> f32 {
    params
        .iter()
        .filter_map(|p| p.grad())
        .map(|g| g.iter().map(|&x| x * x).sum::<f32>())
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;
    use proptest::prelude::*;

    #[test]
    fn test_clip_value_clamps_elementwise() {
        let mut params = vec![Tensor::from_vec(vec![0.0, 0.0, 0.0], true)];
        params[0].set_grad(arr1(&[3.0, -0.5, -4.0]));

        let clamped = clip_grad_value(&mut params, 1.0);

        assert_eq!(clamped, 2);
        assert_eq!(params[0].grad().unwrap().to_vec(), vec![1.0, -0.5, -1.0]);
    }

    #[test]
    fn test_clip_value_noop_within_bound() {
        let mut p = Tensor::from_vec(vec![0.0, 0.0], true);
        p.set_grad(arr1(&[0.25, -1.0]));

        let clamped = clip_grad_value_refs(&mut [&mut p], 1.0);

        assert_eq!(clamped, 0);
        assert_eq!(p.grad().unwrap().to_vec(), vec![0.25, -1.0]);
    }

    #[test]
    fn test_clip_value_skips_missing_grad() {
        let mut p = Tensor::from_vec(vec![5.0], true);
        assert_eq!(clip_grad_value_refs(&mut [&mut p], 1.0), 0);
        assert!(p.grad().is_none());
    }

    #[test]
    fn test_grad_norm() {
        let mut a = Tensor::from_vec(vec![0.0, 0.0], true);
        let mut b = Tensor::from_vec(vec![0.0], true);
        a.set_grad(arr1(&[3.0, 0.0]));
        b.set_grad(arr1(&[4.0]));
        assert!((grad_norm(&[&mut a, &mut b]) - 5.0).abs() < 1e-6);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_clipped_components_bounded(
            grads in prop::collection::vec(-100.0f32..100.0, 1..32),
            clip in 0.01f32..10.0,
        ) {
            let mut p = Tensor::from_vec(vec![0.0; grads.len()], true);
            p.set_grad(arr1(&grads));

            clip_grad_value_refs(&mut [&mut p], clip);

            let clipped = p.grad().unwrap();
            for (&g, &orig) in clipped.iter().zip(grads.iter()) {
                prop_assert!(g.abs() <= clip);
                if orig.abs() <= clip {
                    prop_assert_eq!(g, orig);
                }
            }
        }
    }
}
