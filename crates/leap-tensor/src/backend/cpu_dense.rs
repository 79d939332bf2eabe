// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Rayon row-parallel dense kernels. Each destination row is produced by one
//! task, so results are bit-identical regardless of the worker count.

use rayon::prelude::*;

#[cfg(feature = "simd")]
use wide::f32x8;

#[cfg(feature = "simd")]
const LANES: usize = 8;

pub fn is_available() -> bool {
    true
}

pub fn should_use(rows: usize, inner: usize, cols: usize) -> bool {
    let volume = rows * inner * cols;
    volume >= 8 * 8 * 8 && rows >= 2
}

fn check_lengths(
    dst: &[f32],
    lhs: &[f32],
    rhs: &[f32],
    rows: usize,
    inner: usize,
    cols: usize,
) -> Result<(), String> {
    if dst.len() != rows * cols {
        return Err(format!(
            "destination length mismatch: expected {} elements, got {}",
            rows * cols,
            dst.len()
        ));
    }
    if lhs.len() != rows * inner {
        return Err(format!(
            "lhs length mismatch: expected {} elements, got {}",
            rows * inner,
            lhs.len()
        ));
    }
    if rhs.len() != inner * cols {
        return Err(format!(
            "rhs length mismatch: expected {} elements, got {}",
            inner * cols,
            rhs.len()
        ));
    }
    Ok(())
}

/// `dst = lhs @ rhs` with `rhs` stored row-major `(inner, cols)`.
pub fn matmul_into(
    dst: &mut [f32],
    lhs: &[f32],
    rhs: &[f32],
    rows: usize,
    inner: usize,
    cols: usize,
) -> Result<(), String> {
    check_lengths(dst, lhs, rhs, rows, inner, cols)?;
    dst.fill(0.0);

    dst.par_chunks_mut(cols)
        .zip(lhs.par_chunks(inner))
        .for_each(|(dst_row, lhs_row)| {
            for (k, &a) in lhs_row.iter().enumerate() {
                axpy(dst_row, a, &rhs[k * cols..(k + 1) * cols]);
            }
        });

    Ok(())
}

/// `dst = lhs @ rhsᵀ` with `rhs` stored row-major `(cols, inner)`, i.e. the
/// transpose is never materialised and both operands stream along rows.
pub fn matmul_nt_into(
    dst: &mut [f32],
    lhs: &[f32],
    rhs_rows: &[f32],
    rows: usize,
    inner: usize,
    cols: usize,
) -> Result<(), String> {
    if rhs_rows.len() != cols * inner {
        return Err(format!(
            "rhs length mismatch: expected {} elements, got {}",
            cols * inner,
            rhs_rows.len()
        ));
    }
    if dst.len() != rows * cols {
        return Err(format!(
            "destination length mismatch: expected {} elements, got {}",
            rows * cols,
            dst.len()
        ));
    }
    if lhs.len() != rows * inner {
        return Err(format!(
            "lhs length mismatch: expected {} elements, got {}",
            rows * inner,
            lhs.len()
        ));
    }

    dst.par_chunks_mut(cols)
        .zip(lhs.par_chunks(inner))
        .for_each(|(dst_row, lhs_row)| {
            for (c, out) in dst_row.iter_mut().enumerate() {
                *out = dot(lhs_row, &rhs_rows[c * inner..(c + 1) * inner]);
            }
        });

    Ok(())
}

#[cfg(feature = "simd")]
#[inline]
fn axpy(dst: &mut [f32], scale: f32, src: &[f32]) {
    let factor = f32x8::splat(scale);
    let mut dst_chunks = dst.chunks_exact_mut(LANES);
    let mut src_chunks = src.chunks_exact(LANES);
    for (d, s) in (&mut dst_chunks).zip(&mut src_chunks) {
        let mut d_lane = [0.0f32; LANES];
        let mut s_lane = [0.0f32; LANES];
        d_lane.copy_from_slice(d);
        s_lane.copy_from_slice(s);
        let result = f32x8::from(d_lane) + f32x8::from(s_lane) * factor;
        d.copy_from_slice(&result.to_array());
    }
    for (d, &s) in dst_chunks
        .into_remainder()
        .iter_mut()
        .zip(src_chunks.remainder().iter())
    {
        *d += s * scale;
    }
}

#[cfg(not(feature = "simd"))]
#[inline]
fn axpy(dst: &mut [f32], scale: f32, src: &[f32]) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d += s * scale;
    }
}

#[cfg(feature = "simd")]
#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = f32x8::splat(0.0);
    let mut a_chunks = a.chunks_exact(LANES);
    let mut b_chunks = b.chunks_exact(LANES);
    for (x, y) in (&mut a_chunks).zip(&mut b_chunks) {
        let mut x_lane = [0.0f32; LANES];
        let mut y_lane = [0.0f32; LANES];
        x_lane.copy_from_slice(x);
        y_lane.copy_from_slice(y);
        acc = acc + f32x8::from(x_lane) * f32x8::from(y_lane);
    }
    let mut total: f32 = acc.to_array().iter().sum();
    for (&x, &y) in a_chunks.remainder().iter().zip(b_chunks.remainder().iter()) {
        total += x * y;
    }
    total
}

#[cfg(not(feature = "simd"))]
#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}
