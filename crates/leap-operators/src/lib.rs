// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! The operator factory: named families of structured square matrices used as
//! trajectory steps.
//!
//! Every constructor is pure — it validates its parameters, allocates a fresh
//! identity-based tensor, and never touches shared state. Operators compose
//! right-to-left on column-vector semantics; the engine applies them to row
//! batches through the transposed orientation.

use leap_tensor::{Tensor, TensorError};
use thiserror::Error;

/// Errors emitted by the operator constructors.
#[derive(Debug, Error)]
pub enum OperatorError {
    /// Parameter combination that can never produce a valid operator.
    #[error("operator configuration invalid: {label}")]
    InvalidConfiguration { label: &'static str },
    /// An axis index beyond the operator's dimensionality.
    #[error("axis {axis} out of range for a {n_dims}-dimensional operator")]
    AxisOutOfRange { axis: usize, n_dims: usize },
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

/// Result alias for the operator factory.
pub type OperatorResult<T> = Result<T, OperatorError>;

fn check_axis(axis: usize, n_dims: usize) -> OperatorResult<()> {
    if axis >= n_dims {
        return Err(OperatorError::AxisOutOfRange { axis, n_dims });
    }
    Ok(())
}

/// Planar rotation by `theta` acting on the `(axis_i, axis_j)` plane.
///
/// The identity everywhere except the 2x2 block:
/// `[i,i] = cos θ`, `[i,j] = -sin θ`, `[j,i] = sin θ`, `[j,j] = cos θ`.
pub fn rotation(
    n_dims: usize,
    axis_i: usize,
    axis_j: usize,
    theta: f32,
) -> OperatorResult<Tensor> {
    check_axis(axis_i, n_dims)?;
    check_axis(axis_j, n_dims)?;
    if axis_i == axis_j {
        return Err(OperatorError::InvalidConfiguration {
            label: "rotation_plane_axes_must_differ",
        });
    }

    let mut op = Tensor::identity(n_dims)?;
    let (c, s) = (theta.cos(), theta.sin());
    let data = op.data_mut();
    data[axis_i * n_dims + axis_i] = c;
    data[axis_i * n_dims + axis_j] = -s;
    data[axis_j * n_dims + axis_i] = s;
    data[axis_j * n_dims + axis_j] = c;
    Ok(op)
}

/// Shear coupling axis `j` into axis `i` with the given factor.
///
/// The identity with the single off-diagonal entry `[i,j] = factor`. The
/// diagonal is reserved for the identity value, so `i == j` is rejected.
pub fn shear(n_dims: usize, i: usize, j: usize, factor: f32) -> OperatorResult<Tensor> {
    check_axis(i, n_dims)?;
    check_axis(j, n_dims)?;
    if i == j {
        return Err(OperatorError::InvalidConfiguration {
            label: "shear_axes_must_differ",
        });
    }

    let mut op = Tensor::identity(n_dims)?;
    op.data_mut()[i * n_dims + j] = factor;
    Ok(op)
}

/// Cyclic shift of the identity's rows, scaled uniformly.
///
/// Applied to a state this rotates coordinates one slot around the manifold
/// and stretches by `scale`; the rotation-like generator of the headline
/// path-dependence demonstration.
pub fn scaled_cycle(n_dims: usize, scale: f32) -> OperatorResult<Tensor> {
    Tensor::from_fn(n_dims, n_dims, |r, c| {
        if c == (r + n_dims - 1) % n_dims {
            scale
        } else {
            0.0
        }
    })
    .map_err(OperatorError::from)
}

/// Anti-diagonal reflection (the identity with reversed rows), scaled
/// uniformly; the reflection-like generator of the demonstration.
pub fn scaled_reflection(n_dims: usize, scale: f32) -> OperatorResult<Tensor> {
    Tensor::from_fn(n_dims, n_dims, |r, c| {
        if c == n_dims - 1 - r {
            scale
        } else {
            0.0
        }
    })
    .map_err(OperatorError::from)
}

/// The commutator `A·B - B·A`.
///
/// Zero exactly when the pair commutes; any nonzero entry witnesses that the
/// two operators produce order-dependent trajectories.
pub fn commutator(a: &Tensor, b: &Tensor) -> OperatorResult<Tensor> {
    let forward = a.matmul(b)?;
    let reverse = b.matmul(a)?;
    Ok(forward.sub(&reverse)?)
}

/// Frobenius norm of the commutator, the scalar non-commutativity witness.
pub fn commutator_norm(a: &Tensor, b: &Tensor) -> OperatorResult<f32> {
    Ok(commutator(a, b)?.frobenius_norm())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_4, PI};

    #[test]
    fn rotation_embeds_the_planar_block() {
        let theta = PI / 3.0;
        let op = rotation(4, 0, 2, theta).unwrap();
        let data = op.data();
        assert!((data[0] - theta.cos()).abs() < 1e-6);
        assert!((data[2] + theta.sin()).abs() < 1e-6);
        assert!((data[8] - theta.sin()).abs() < 1e-6);
        assert!((data[10] - theta.cos()).abs() < 1e-6);
        assert_eq!(data[5], 1.0);
        assert_eq!(data[15], 1.0);
    }

    #[test]
    fn rotation_is_orthogonal() {
        let op = rotation(5, 1, 3, 0.7).unwrap();
        let gram = op.matmul_nt(&op).unwrap();
        let eye = Tensor::identity(5).unwrap();
        for (a, b) in gram.data().iter().zip(eye.data().iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn rotation_rejects_a_degenerate_plane() {
        assert!(matches!(
            rotation(4, 2, 2, 0.5),
            Err(OperatorError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn rotation_rejects_out_of_range_axes() {
        assert!(matches!(
            rotation(4, 0, 4, 0.5),
            Err(OperatorError::AxisOutOfRange { axis: 4, n_dims: 4 })
        ));
    }

    #[test]
    fn shear_places_a_single_coupling() {
        let op = shear(3, 0, 2, 0.5).unwrap();
        let expected = Tensor::from_vec(
            3,
            3,
            vec![1.0, 0.0, 0.5, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        )
        .unwrap();
        assert_eq!(op, expected);
    }

    #[test]
    fn shear_keeps_the_diagonal_reserved() {
        assert!(matches!(
            shear(3, 1, 1, 0.5),
            Err(OperatorError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn scaled_cycle_shifts_coordinates_one_slot() {
        let op = scaled_cycle(4, 1.1).unwrap();
        let state = Tensor::from_vec(1, 4, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let moved = state.matmul_nt(&op).unwrap();
        let expected = [4.0 * 1.1, 1.0 * 1.1, 2.0 * 1.1, 3.0 * 1.1];
        for (a, b) in moved.data().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn scaled_reflection_reverses_coordinates() {
        let op = scaled_reflection(4, 2.0).unwrap();
        let state = Tensor::from_vec(1, 4, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let moved = state.matmul_nt(&op).unwrap();
        let expected = [8.0, 6.0, 4.0, 2.0];
        for (a, b) in moved.data().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn coplanar_rotations_commute() {
        let a = rotation(4, 0, 1, 0.3).unwrap();
        let b = rotation(4, 0, 1, 1.1).unwrap();
        assert!(commutator_norm(&a, &b).unwrap() < 1e-6);
    }

    #[test]
    fn rotation_and_shear_fail_to_commute() {
        let r = rotation(16, 0, 1, FRAC_PI_4).unwrap();
        let s = shear(16, 1, 2, 0.5).unwrap();
        assert!(commutator_norm(&r, &s).unwrap() > 0.1);
    }
}
