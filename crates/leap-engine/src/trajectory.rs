// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use leap_tensor::{Tensor, TensorResult};

/// The ordered record of a trajectory run.
///
/// Holds `depth + 1` batches: the initial batch at index 0, then one batch
/// per operator step after its logical leap. Every entry is an independent
/// copy, safe to retain across further runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    history: Vec<Tensor>,
}

impl Trajectory {
    pub(crate) fn new(history: Vec<Tensor>) -> Self {
        debug_assert!(!history.is_empty());
        Self { history }
    }

    /// The batch after the final step (the initial batch for an empty
    /// operator sequence).
    pub fn final_states(&self) -> &Tensor {
        self.history
            .last()
            .expect("trajectory history always holds the initial batch")
    }

    /// The full history, initial batch first.
    pub fn history(&self) -> &[Tensor] {
        &self.history
    }

    /// Number of operator steps taken.
    pub fn depth(&self) -> usize {
        self.history.len() - 1
    }

    /// Consumes the trajectory, yielding the owned history.
    pub fn into_history(self) -> Vec<Tensor> {
        self.history
    }
}

/// Euclidean distance between two equally-shaped batches.
///
/// The scalar readout reporting layers use to exhibit path dependence:
/// strictly positive whenever two operator orders landed a batch in
/// different places.
pub fn path_divergence(a: &Tensor, b: &Tensor) -> TensorResult<f32> {
    Ok(a.sub(b)?.frobenius_norm())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leap_tensor::{Seed, TensorError};

    #[test]
    fn final_states_is_the_last_history_entry() {
        let first = Tensor::zeros(2, 3).unwrap();
        let second = Tensor::from_vec(2, 3, vec![1.0; 6]).unwrap();
        let trajectory = Trajectory::new(vec![first, second.clone()]);
        assert_eq!(trajectory.final_states(), &second);
        assert_eq!(trajectory.depth(), 1);
        assert_eq!(trajectory.history().len(), 2);
    }

    #[test]
    fn divergence_of_identical_batches_is_zero() {
        let batch = Tensor::random_uniform(3, 4, -1.0, 1.0, Seed::Explicit(3)).unwrap();
        assert_eq!(path_divergence(&batch, &batch).unwrap(), 0.0);
    }

    #[test]
    fn divergence_is_the_euclidean_distance() {
        let a = Tensor::from_vec(1, 2, vec![3.0, 0.0]).unwrap();
        let b = Tensor::from_vec(1, 2, vec![0.0, 4.0]).unwrap();
        assert!((path_divergence(&a, &b).unwrap() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn divergence_rejects_mismatched_shapes() {
        let a = Tensor::zeros(1, 2).unwrap();
        let b = Tensor::zeros(2, 2).unwrap();
        assert!(matches!(
            path_divergence(&a, &b),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }
}
