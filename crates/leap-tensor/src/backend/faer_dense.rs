// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

#[cfg(feature = "faer")]
mod imp {
    use faer::get_global_parallelism;
    use faer::linalg::matmul::matmul as faer_matmul;
    use faer::mat;

    pub fn is_available() -> bool {
        true
    }

    pub fn should_use(rows: usize, inner: usize, cols: usize) -> bool {
        rows * inner * cols >= 32 * 32 * 32
    }

    fn check_lengths(
        dst: &[f32],
        lhs: &[f32],
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
        Ok(())
    }

    pub fn matmul_into(
        dst: &mut [f32],
        lhs: &[f32],
        rhs: &[f32],
        rows: usize,
        inner: usize,
        cols: usize,
    ) -> Result<(), String> {
        check_lengths(dst, lhs, rows, inner, cols)?;
        if rhs.len() != inner * cols {
            return Err(format!(
                "rhs length mismatch: expected {} elements, got {}",
                inner * cols,
                rhs.len()
            ));
        }

        let lhs_view = mat::from_row_major_slice::<f32>(lhs, rows, inner);
        let rhs_view = mat::from_row_major_slice::<f32>(rhs, inner, cols);
        let mut dst_view = mat::from_row_major_slice_mut::<f32>(dst, rows, cols);

        faer_matmul(
            dst_view.as_mut(),
            lhs_view,
            rhs_view,
            None,
            1.0,
            get_global_parallelism(),
        );

        Ok(())
    }

    pub fn matmul_nt_into(
        dst: &mut [f32],
        lhs: &[f32],
        rhs_rows: &[f32],
        rows: usize,
        inner: usize,
        cols: usize,
    ) -> Result<(), String> {
        check_lengths(dst, lhs, rows, inner, cols)?;
        if rhs_rows.len() != cols * inner {
            return Err(format!(
                "rhs length mismatch: expected {} elements, got {}",
                cols * inner,
                rhs_rows.len()
            ));
        }

        let lhs_view = mat::from_row_major_slice::<f32>(lhs, rows, inner);
        let rhs_view = mat::from_row_major_slice::<f32>(rhs_rows, cols, inner).transpose();
        let mut dst_view = mat::from_row_major_slice_mut::<f32>(dst, rows, cols);

        faer_matmul(
            dst_view.as_mut(),
            lhs_view,
            rhs_view,
            None,
            1.0,
            get_global_parallelism(),
        );

        Ok(())
    }
}

#[cfg(not(feature = "faer"))]
mod imp {
    pub fn is_available() -> bool {
        false
    }

    pub fn should_use(_rows: usize, _inner: usize, _cols: usize) -> bool {
        false
    }

    pub fn matmul_into(
        _dst: &mut [f32],
        _lhs: &[f32],
        _rhs: &[f32],
        rows: usize,
        _inner: usize,
        cols: usize,
    ) -> Result<(), String> {
        Err(format!(
            "faer backend disabled at compile time (requested {rows}x{cols} multiply)"
        ))
    }

    pub fn matmul_nt_into(
        _dst: &mut [f32],
        _lhs: &[f32],
        _rhs_rows: &[f32],
        rows: usize,
        _inner: usize,
        cols: usize,
    ) -> Result<(), String> {
        Err(format!(
            "faer backend disabled at compile time (requested {rows}x{cols} transposed multiply)"
        ))
    }
}

pub use imp::*;
