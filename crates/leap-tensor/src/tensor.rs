// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::backend::{cpu_dense, faer_dense};
use core::fmt;
use leap_config::determinism::{self, Seed};
use rand::distributions::{Distribution, Uniform};
use rand_distr::StandardNormal;

/// Result alias used throughout the tensor crate.
pub type TensorResult<T> = Result<T, TensorError>;

/// Errors emitted by tensor constructors and operations.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorError {
    /// A constructor received a zero-sized axis.
    InvalidDimensions { rows: usize, cols: usize },
    /// Raw data handed to a constructor does not fill the requested shape.
    DataLength { expected: usize, got: usize },
    /// Two tensors with incompatible shapes were combined.
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Generic parameter violation for tensor helpers.
    InvalidValue { label: &'static str },
    /// A dense backend refused or failed the requested operation.
    BackendFailure {
        backend: &'static str,
        message: String,
    },
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorError::InvalidDimensions { rows, cols } => {
                write!(
                    f,
                    "tensor axes must be non-zero, requested {rows} x {cols}"
                )
            }
            TensorError::DataLength { expected, got } => {
                write!(f, "data length mismatch: expected {expected}, got {got}")
            }
            TensorError::ShapeMismatch { left, right } => {
                write!(
                    f,
                    "shape mismatch: {:?} cannot be combined with {:?}",
                    left, right
                )
            }
            TensorError::InvalidValue { label } => {
                write!(f, "invalid value for {label}")
            }
            TensorError::BackendFailure { backend, message } => {
                write!(f, "{backend} backend failure: {message}")
            }
        }
    }
}

impl std::error::Error for TensorError {}

/// Dense multiply backend selection.
///
/// `Auto` walks the fallback chain: faer when compiled in and the problem is
/// large enough, the rayon row-parallel kernel for mid-size work, the naive
/// loop for tiny shapes. Every backend computes the same result; selection
/// only moves the work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatmulBackend {
    #[default]
    Auto,
    CpuNaive,
    CpuParallel,
    CpuFaer,
}

/// An owned row-major 2D `f32` tensor.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Tensor {
    /// Create a tensor filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> TensorResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(TensorError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        })
    }

    /// Create the `n x n` identity.
    pub fn identity(n: usize) -> TensorResult<Self> {
        let mut tensor = Self::zeros(n, n)?;
        for i in 0..n {
            tensor.data[i * n + i] = 1.0;
        }
        Ok(tensor)
    }

    /// Create a tensor from raw row-major data. The vector must hold exactly
    /// `rows * cols` elements.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> TensorResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(TensorError::InvalidDimensions { rows, cols });
        }
        let expected = rows * cols;
        if expected != data.len() {
            return Err(TensorError::DataLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Construct a tensor by applying a generator function to each coordinate.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> TensorResult<Self>
    where
        F: FnMut(usize, usize) -> f32,
    {
        let mut tensor = Self::zeros(rows, cols)?;
        for r in 0..rows {
            for c in 0..cols {
                tensor.data[r * cols + c] = f(r, c);
            }
        }
        Ok(tensor)
    }

    /// Construct a tensor by sampling a uniform distribution in `[min, max)`.
    ///
    /// A [`Seed::Explicit`] value replays bit-identically on its own; a
    /// [`Seed::Stream`] label follows the process replay policy, and distinct
    /// labels never share a stream.
    pub fn random_uniform(
        rows: usize,
        cols: usize,
        min: f32,
        max: f32,
        seed: Seed<'_>,
    ) -> TensorResult<Self> {
        if !(min < max) {
            return Err(TensorError::InvalidValue {
                label: "random_uniform_bounds",
            });
        }
        let mut tensor = Self::zeros(rows, cols)?;
        let mut rng = determinism::rng(seed);
        let distribution = Uniform::new(min, max);
        for value in tensor.data.iter_mut() {
            *value = distribution.sample(&mut rng);
        }
        Ok(tensor)
    }

    /// Construct a tensor by sampling a normal distribution. Seeded the same
    /// way as [`Tensor::random_uniform`].
    pub fn random_normal(
        rows: usize,
        cols: usize,
        mean: f32,
        std: f32,
        seed: Seed<'_>,
    ) -> TensorResult<Self> {
        if std <= 0.0 {
            return Err(TensorError::InvalidValue {
                label: "random_normal_std",
            });
        }
        let mut tensor = Self::zeros(rows, cols)?;
        let mut rng = determinism::rng(seed);
        let gaussian = StandardNormal;
        for value in tensor.data.iter_mut() {
            let sample: f64 = gaussian.sample(&mut rng);
            *value = mean + std * sample as f32;
        }
        Ok(tensor)
    }

    /// Returns the `(rows, cols)` pair of the tensor.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of elements stored in the tensor.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns a read-only view of the underlying row-major buffer.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns a mutable view of the underlying row-major buffer.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Returns row `r` as a slice. Panics when `r` is out of range.
    #[inline]
    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Element-wise sum.
    pub fn add(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Element-wise difference.
    pub fn sub(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.zip_with(other, |a, b| a - b)
    }

    fn zip_with<F>(&self, other: &Tensor, f: F) -> TensorResult<Tensor>
    where
        F: Fn(f32, f32) -> f32,
    {
        if self.shape() != other.shape() {
            return Err(TensorError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Tensor::from_vec(self.rows, self.cols, data)
    }

    /// Returns the tensor scaled by a uniform factor.
    pub fn scale(&self, factor: f32) -> Tensor {
        Tensor {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| v * factor).collect(),
        }
    }

    /// Returns the transposed tensor as a fresh row-major buffer.
    pub fn transpose(&self) -> Tensor {
        let mut data = vec![0.0; self.len()];
        for r in 0..self.rows {
            for c in 0..self.cols {
                data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        Tensor {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Euclidean norm over the whole buffer.
    pub fn frobenius_norm(&self) -> f32 {
        self.data.iter().map(|&v| v * v).sum::<f32>().sqrt()
    }

    /// Euclidean norm of each row, in row order.
    pub fn row_norms(&self) -> Vec<f32> {
        (0..self.rows)
            .map(|r| self.row(r).iter().map(|&v| v * v).sum::<f32>().sqrt())
            .collect()
    }

    /// Matrix multiply (`self @ other`).
    pub fn matmul(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.matmul_with_backend(other, MatmulBackend::Auto)
    }

    /// Matrix multiply with an explicit backend selection.
    pub fn matmul_with_backend(
        &self,
        other: &Tensor,
        backend: MatmulBackend,
    ) -> TensorResult<Tensor> {
        if self.cols != other.rows {
            return Err(TensorError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        let (rows, inner, cols) = (self.rows, self.cols, other.cols);
        let mut dst = Tensor::zeros(rows, cols)?;

        match backend {
            MatmulBackend::Auto => {
                if faer_dense::is_available() && faer_dense::should_use(rows, inner, cols) {
                    if faer_dense::matmul_into(
                        dst.data_mut(),
                        self.data(),
                        other.data(),
                        rows,
                        inner,
                        cols,
                    )
                    .is_ok()
                    {
                        return Ok(dst);
                    }
                }
                if cpu_dense::should_use(rows, inner, cols) {
                    cpu_dense::matmul_into(
                        dst.data_mut(),
                        self.data(),
                        other.data(),
                        rows,
                        inner,
                        cols,
                    )
                    .map_err(|message| TensorError::BackendFailure {
                        backend: "cpu_parallel",
                        message,
                    })?;
                } else {
                    matmul_naive_into(dst.data_mut(), self.data(), other.data(), rows, inner, cols);
                }
            }
            MatmulBackend::CpuNaive => {
                matmul_naive_into(dst.data_mut(), self.data(), other.data(), rows, inner, cols);
            }
            MatmulBackend::CpuParallel => {
                cpu_dense::matmul_into(dst.data_mut(), self.data(), other.data(), rows, inner, cols)
                    .map_err(|message| TensorError::BackendFailure {
                        backend: "cpu_parallel",
                        message,
                    })?;
            }
            MatmulBackend::CpuFaer => {
                faer_dense::matmul_into(dst.data_mut(), self.data(), other.data(), rows, inner, cols)
                    .map_err(|message| TensorError::BackendFailure {
                        backend: "faer",
                        message,
                    })?;
            }
        }

        Ok(dst)
    }

    /// Matrix multiply against the transpose of `other` (`self @ otherᵀ`)
    /// without materialising the transpose.
    ///
    /// This is the trajectory-step orientation: each row `v` of `self`
    /// becomes `v · otherᵀ`, i.e. `other · v` on column-vector semantics.
    pub fn matmul_nt(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.matmul_nt_with_backend(other, MatmulBackend::Auto)
    }

    /// Transposed-rhs multiply with an explicit backend selection.
    pub fn matmul_nt_with_backend(
        &self,
        other: &Tensor,
        backend: MatmulBackend,
    ) -> TensorResult<Tensor> {
        if self.cols != other.cols {
            return Err(TensorError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        let (rows, inner, cols) = (self.rows, self.cols, other.rows);
        let mut dst = Tensor::zeros(rows, cols)?;

        match backend {
            MatmulBackend::Auto => {
                if faer_dense::is_available() && faer_dense::should_use(rows, inner, cols) {
                    if faer_dense::matmul_nt_into(
                        dst.data_mut(),
                        self.data(),
                        other.data(),
                        rows,
                        inner,
                        cols,
                    )
                    .is_ok()
                    {
                        return Ok(dst);
                    }
                }
                if cpu_dense::should_use(rows, inner, cols) {
                    cpu_dense::matmul_nt_into(
                        dst.data_mut(),
                        self.data(),
                        other.data(),
                        rows,
                        inner,
                        cols,
                    )
                    .map_err(|message| TensorError::BackendFailure {
                        backend: "cpu_parallel",
                        message,
                    })?;
                } else {
                    matmul_nt_naive_into(
                        dst.data_mut(),
                        self.data(),
                        other.data(),
                        rows,
                        inner,
                        cols,
                    );
                }
            }
            MatmulBackend::CpuNaive => {
                matmul_nt_naive_into(dst.data_mut(), self.data(), other.data(), rows, inner, cols);
            }
            MatmulBackend::CpuParallel => {
                cpu_dense::matmul_nt_into(
                    dst.data_mut(),
                    self.data(),
                    other.data(),
                    rows,
                    inner,
                    cols,
                )
                .map_err(|message| TensorError::BackendFailure {
                    backend: "cpu_parallel",
                    message,
                })?;
            }
            MatmulBackend::CpuFaer => {
                faer_dense::matmul_nt_into(
                    dst.data_mut(),
                    self.data(),
                    other.data(),
                    rows,
                    inner,
                    cols,
                )
                .map_err(|message| TensorError::BackendFailure {
                    backend: "faer",
                    message,
                })?;
            }
        }

        Ok(dst)
    }
}

fn matmul_naive_into(
    dst: &mut [f32],
    lhs: &[f32],
    rhs: &[f32],
    rows: usize,
    inner: usize,
    cols: usize,
) {
    for r in 0..rows {
        let lhs_row = &lhs[r * inner..(r + 1) * inner];
        let dst_row = &mut dst[r * cols..(r + 1) * cols];
        for (k, &a) in lhs_row.iter().enumerate() {
            let rhs_row = &rhs[k * cols..(k + 1) * cols];
            for (out, &b) in dst_row.iter_mut().zip(rhs_row.iter()) {
                *out += a * b;
            }
        }
    }
}

fn matmul_nt_naive_into(
    dst: &mut [f32],
    lhs: &[f32],
    rhs_rows: &[f32],
    rows: usize,
    inner: usize,
    cols: usize,
) {
    for r in 0..rows {
        let lhs_row = &lhs[r * inner..(r + 1) * inner];
        let dst_row = &mut dst[r * cols..(r + 1) * cols];
        for (c, out) in dst_row.iter_mut().enumerate() {
            let rhs_row = &rhs_rows[c * inner..(c + 1) * inner];
            *out = lhs_row
                .iter()
                .zip(rhs_row.iter())
                .map(|(&a, &b)| a * b)
                .sum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_axes_are_rejected() {
        assert!(matches!(
            Tensor::zeros(0, 4),
            Err(TensorError::InvalidDimensions { rows: 0, cols: 4 })
        ));
        assert!(matches!(
            Tensor::from_vec(3, 0, vec![]),
            Err(TensorError::InvalidDimensions { rows: 3, cols: 0 })
        ));
    }

    #[test]
    fn from_vec_checks_the_data_length() {
        let result = Tensor::from_vec(2, 2, vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            result,
            Err(TensorError::DataLength {
                expected: 4,
                got: 3
            })
        ));
    }

    #[test]
    fn identity_has_unit_diagonal() {
        let eye = Tensor::identity(3).unwrap();
        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert_eq!(eye.data()[r * 3 + c], expected);
            }
        }
    }

    #[test]
    fn matmul_matches_hand_computed_product() {
        let a = Tensor::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = Tensor::from_vec(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
        let product = a.matmul(&b).unwrap();
        let expected = Tensor::from_vec(2, 2, vec![58.0, 64.0, 139.0, 154.0]).unwrap();
        assert_eq!(product, expected);
    }

    #[test]
    fn matmul_rejects_incompatible_shapes() {
        let a = Tensor::zeros(2, 3).unwrap();
        let b = Tensor::zeros(2, 2).unwrap();
        assert!(matches!(
            a.matmul(&b),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn matmul_nt_agrees_with_materialised_transpose() {
        let batch = Tensor::random_uniform(5, 4, -1.0, 1.0, Seed::Explicit(11)).unwrap();
        let op = Tensor::random_uniform(4, 4, -1.0, 1.0, Seed::Explicit(12)).unwrap();
        let fused = batch.matmul_nt(&op).unwrap();
        let reference = batch.matmul(&op.transpose()).unwrap();
        assert_eq!(fused.shape(), reference.shape());
        for (a, b) in fused.data().iter().zip(reference.data().iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn backends_agree_on_the_same_product() {
        let lhs = Tensor::random_uniform(9, 16, -2.0, 2.0, Seed::Explicit(21)).unwrap();
        let rhs = Tensor::random_uniform(16, 13, -2.0, 2.0, Seed::Explicit(22)).unwrap();
        let naive = lhs.matmul_with_backend(&rhs, MatmulBackend::CpuNaive).unwrap();
        let parallel = lhs
            .matmul_with_backend(&rhs, MatmulBackend::CpuParallel)
            .unwrap();
        for (a, b) in naive.data().iter().zip(parallel.data().iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn nt_backends_agree_on_the_same_product() {
        let lhs = Tensor::random_uniform(7, 12, -2.0, 2.0, Seed::Explicit(31)).unwrap();
        let rhs = Tensor::random_uniform(10, 12, -2.0, 2.0, Seed::Explicit(32)).unwrap();
        let naive = lhs
            .matmul_nt_with_backend(&rhs, MatmulBackend::CpuNaive)
            .unwrap();
        let parallel = lhs
            .matmul_nt_with_backend(&rhs, MatmulBackend::CpuParallel)
            .unwrap();
        for (a, b) in naive.data().iter().zip(parallel.data().iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[cfg(feature = "faer")]
    #[test]
    fn faer_backend_matches_the_naive_loop() {
        let lhs = Tensor::random_uniform(8, 8, -1.0, 1.0, Seed::Explicit(41)).unwrap();
        let rhs = Tensor::random_uniform(8, 8, -1.0, 1.0, Seed::Explicit(42)).unwrap();
        let naive = lhs.matmul_with_backend(&rhs, MatmulBackend::CpuNaive).unwrap();
        let faer = lhs.matmul_with_backend(&rhs, MatmulBackend::CpuFaer).unwrap();
        for (a, b) in naive.data().iter().zip(faer.data().iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[cfg(not(feature = "faer"))]
    #[test]
    fn faer_backend_reports_unavailability_when_not_compiled_in() {
        let lhs = Tensor::zeros(2, 2).unwrap();
        let rhs = Tensor::zeros(2, 2).unwrap();
        assert!(matches!(
            lhs.matmul_with_backend(&rhs, MatmulBackend::CpuFaer),
            Err(TensorError::BackendFailure { backend: "faer", .. })
        ));
    }

    #[test]
    fn add_sub_and_scale_are_elementwise() {
        let a = Tensor::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Tensor::from_vec(2, 2, vec![0.5, 0.5, 0.5, 0.5]).unwrap();
        assert_eq!(
            a.add(&b).unwrap(),
            Tensor::from_vec(2, 2, vec![1.5, 2.5, 3.5, 4.5]).unwrap()
        );
        assert_eq!(
            a.sub(&b).unwrap(),
            Tensor::from_vec(2, 2, vec![0.5, 1.5, 2.5, 3.5]).unwrap()
        );
        assert_eq!(
            a.scale(2.0),
            Tensor::from_vec(2, 2, vec![2.0, 4.0, 6.0, 8.0]).unwrap()
        );
    }

    #[test]
    fn row_norms_and_frobenius_norm_are_euclidean() {
        let t = Tensor::from_vec(2, 2, vec![3.0, 4.0, 0.0, 0.0]).unwrap();
        let norms = t.row_norms();
        assert!((norms[0] - 5.0).abs() < 1e-6);
        assert_eq!(norms[1], 0.0);
        assert!((t.frobenius_norm() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn seeded_initialisers_replay_bit_identically() {
        let first = Tensor::random_normal(4, 6, 0.0, 1.0, Seed::Explicit(77)).unwrap();
        let second = Tensor::random_normal(4, 6, 0.0, 1.0, Seed::Explicit(77)).unwrap();
        assert_eq!(first, second);

        let uniform_a = Tensor::random_uniform(4, 6, -1.0, 1.0, Seed::Explicit(78)).unwrap();
        let uniform_b = Tensor::random_uniform(4, 6, -1.0, 1.0, Seed::Explicit(78)).unwrap();
        assert_eq!(uniform_a, uniform_b);
    }

    #[test]
    fn invalid_sampling_parameters_are_rejected() {
        assert!(matches!(
            Tensor::random_uniform(2, 2, 1.0, 1.0, Seed::Explicit(0)),
            Err(TensorError::InvalidValue {
                label: "random_uniform_bounds"
            })
        ));
        assert!(matches!(
            Tensor::random_normal(2, 2, 0.0, 0.0, Seed::Explicit(0)),
            Err(TensorError::InvalidValue {
                label: "random_normal_std"
            })
        ));
    }

    #[test]
    fn transpose_round_trips() {
        let t = Tensor::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let tt = t.transpose();
        assert_eq!(tt.shape(), (3, 2));
        assert_eq!(tt.transpose(), t);
    }
}
