// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::trajectory::Trajectory;
use leap_tensor::{MatmulBackend, Tensor, TensorError};
use rayon::prelude::*;
use thiserror::Error;

/// Errors emitted by the trajectory engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Construction parameters that can never form a working engine.
    #[error("engine configuration invalid: {label}")]
    InvalidConfiguration { label: &'static str },
    /// An operator or batch whose shape disagrees with the engine's
    /// dimensionality. Raised before any step runs.
    #[error("dimension mismatch: engine is {expected}-dimensional, got a {rows}x{cols} tensor")]
    DimensionMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Batch-parallel engine for order-sensitive semantic evolution.
///
/// Holds only its fixed configuration — the manifold dimensionality, the
/// leap limit, and the dense-multiply backend — so a single engine is safely
/// shared across concurrent trajectory runs on different batches.
#[derive(Clone, Debug)]
pub struct SemanticEngine {
    n_dims: usize,
    c_limit: f32,
    threshold: f32,
    backend: MatmulBackend,
}

impl SemanticEngine {
    /// Creates an engine for `n_dims`-dimensional states with the given leap
    /// limit.
    ///
    /// The working threshold is `c_limit * sqrt(n_dims)`, scaled so the limit
    /// is comparable across dimensionalities. A non-positive `c_limit` is
    /// accepted: every nonzero row then leaps to unit norm on every step.
    pub fn new(n_dims: usize, c_limit: f32) -> EngineResult<Self> {
        if n_dims == 0 {
            return Err(EngineError::InvalidConfiguration {
                label: "n_dims_must_be_positive",
            });
        }
        Ok(Self {
            n_dims,
            c_limit,
            threshold: c_limit * (n_dims as f32).sqrt(),
            backend: MatmulBackend::Auto,
        })
    }

    /// Replaces the dense-multiply backend. Trajectory semantics are
    /// identical on every backend; only the execution path moves.
    pub fn with_backend(mut self, backend: MatmulBackend) -> Self {
        self.backend = backend;
        self
    }

    /// The manifold dimensionality this engine was built for.
    #[inline]
    pub fn n_dims(&self) -> usize {
        self.n_dims
    }

    /// The configured leap limit.
    #[inline]
    pub fn c_limit(&self) -> f32 {
        self.c_limit
    }

    /// The dimension-scaled working threshold.
    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    fn check_batch(&self, batch: &Tensor) -> EngineResult<()> {
        if batch.cols() != self.n_dims {
            return Err(EngineError::DimensionMismatch {
                expected: self.n_dims,
                rows: batch.rows(),
                cols: batch.cols(),
            });
        }
        Ok(())
    }

    fn check_operator(&self, op: &Tensor) -> EngineResult<()> {
        if op.rows() != self.n_dims || op.cols() != self.n_dims {
            return Err(EngineError::DimensionMismatch {
                expected: self.n_dims,
                rows: op.rows(),
                cols: op.cols(),
            });
        }
        Ok(())
    }

    /// Applies the logical leap to every row of a batch independently.
    ///
    /// A row whose Euclidean norm exceeds the threshold is divided by its own
    /// norm — it lands on the unit sphere, not on the threshold sphere. Rows
    /// at or below the threshold pass through untouched, and a zero row always
    /// passes through, whatever the sign of the threshold.
    pub fn logical_leap_batch(&self, states: &Tensor) -> EngineResult<Tensor> {
        self.check_batch(states)?;

        let mut leapt = states.clone();
        let cols = self.n_dims;
        let threshold = self.threshold;
        leapt
            .data_mut()
            .par_chunks_mut(cols)
            .for_each(|row| {
                let norm = row.iter().map(|&v| v * v).sum::<f32>().sqrt();
                // A negative threshold must not drag zero rows into the
                // rescale branch: 0 * inf is NaN.
                if norm > threshold && norm > 0.0 {
                    let inv = norm.recip();
                    for value in row.iter_mut() {
                        *value *= inv;
                    }
                }
            });
        Ok(leapt)
    }

    /// Evolves a batch through an ordered operator sequence, capturing every
    /// intermediate batch.
    ///
    /// Each step right-multiplies the current batch by the operator's
    /// transpose (so composition reads right-to-left on column-vector
    /// semantics) and then applies the logical leap. The batch and every
    /// operator are validated against the engine's dimensionality before the
    /// first step runs, so no partial history can be observed on failure.
    /// Caller-owned tensors are never mutated; the returned history holds
    /// independent copies, the initial batch at index 0.
    pub fn run_trajectory(
        &self,
        initial: &Tensor,
        operators: &[Tensor],
    ) -> EngineResult<Trajectory> {
        self.check_batch(initial)?;
        for op in operators {
            self.check_operator(op)?;
        }

        let span = tracing::debug_span!(
            "run_trajectory",
            depth = operators.len(),
            batch = initial.rows(),
            dims = self.n_dims
        );
        let _guard = span.enter();

        let mut current = initial.clone();
        let mut history = Vec::with_capacity(operators.len() + 1);
        history.push(current.clone());

        for (step, op) in operators.iter().enumerate() {
            let transformed = current.matmul_nt_with_backend(op, self.backend)?;
            current = self.logical_leap_batch(&transformed)?;
            tracing::trace!(step, "operator applied and leap taken");
            history.push(current.clone());
        }

        Ok(Trajectory::new(history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leap_tensor::Seed;

    #[test]
    fn zero_dimensional_engines_are_rejected() {
        assert!(matches!(
            SemanticEngine::new(0, 0.5),
            Err(EngineError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn threshold_scales_with_the_dimension() {
        let engine = SemanticEngine::new(16, 0.5).unwrap();
        assert!((engine.threshold() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn leap_leaves_rows_inside_the_threshold_untouched() {
        let engine = SemanticEngine::new(4, 1.0).unwrap();
        let batch = Tensor::from_vec(1, 4, vec![0.5, 0.5, 0.5, 0.5]).unwrap();
        let leapt = engine.logical_leap_batch(&batch).unwrap();
        assert_eq!(leapt, batch);
    }

    #[test]
    fn leap_projects_oversized_rows_onto_the_unit_sphere() {
        let engine = SemanticEngine::new(4, 0.5).unwrap();
        let batch = Tensor::from_vec(1, 4, vec![3.0, 0.0, 4.0, 0.0]).unwrap();
        let leapt = engine.logical_leap_batch(&batch).unwrap();
        let norm = leapt.row_norms()[0];
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((leapt.data()[0] - 0.6).abs() < 1e-6);
        assert!((leapt.data()[2] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn leap_passes_zero_rows_through() {
        let engine = SemanticEngine::new(3, 0.5).unwrap();
        let batch = Tensor::zeros(2, 3).unwrap();
        let leapt = engine.logical_leap_batch(&batch).unwrap();
        assert_eq!(leapt, batch);
    }

    #[test]
    fn non_positive_limits_leap_every_nonzero_row() {
        let engine = SemanticEngine::new(2, -1.0).unwrap();
        let batch = Tensor::from_vec(2, 2, vec![0.1, 0.0, 0.0, 0.0]).unwrap();
        let leapt = engine.logical_leap_batch(&batch).unwrap();
        assert!((leapt.data()[0] - 1.0).abs() < 1e-6);
        assert_eq!(leapt.data()[2], 0.0);
        assert_eq!(leapt.data()[3], 0.0);
    }

    #[test]
    fn leap_rejects_mismatched_batches() {
        let engine = SemanticEngine::new(4, 0.5).unwrap();
        let batch = Tensor::zeros(2, 3).unwrap();
        assert!(matches!(
            engine.logical_leap_batch(&batch),
            Err(EngineError::DimensionMismatch {
                expected: 4,
                rows: 2,
                cols: 3
            })
        ));
    }

    #[test]
    fn backends_produce_the_same_trajectory() {
        let engine = SemanticEngine::new(6, 0.4).unwrap();
        let batch = Tensor::random_normal(4, 6, 0.0, 1.0, Seed::Explicit(5)).unwrap();
        let op_a = Tensor::random_uniform(6, 6, -1.0, 1.0, Seed::Explicit(6)).unwrap();
        let op_b = Tensor::random_uniform(6, 6, -1.0, 1.0, Seed::Explicit(7)).unwrap();
        let ops = [op_a, op_b];

        let naive = engine
            .clone()
            .with_backend(MatmulBackend::CpuNaive)
            .run_trajectory(&batch, &ops)
            .unwrap();
        let parallel = engine
            .with_backend(MatmulBackend::CpuParallel)
            .run_trajectory(&batch, &ops)
            .unwrap();

        for (a, b) in naive
            .final_states()
            .data()
            .iter()
            .zip(parallel.final_states().data().iter())
        {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
