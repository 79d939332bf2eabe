// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! The numeric substrate for LeapTorch: an owned, row-major 2D `f32` tensor
//! with explicit shape validation at every entry point and dense multiplies
//! dispatched through a pluggable backend selection.
//!
//! Batches of semantic states are `(batch_size, n_dims)` tensors whose rows
//! are independent; operators are `(n_dims, n_dims)` tensors. Nothing here is
//! shape-generic or broadcasting — a mismatch is an error, never a guess.

pub mod backend;
mod tensor;

pub use leap_config::determinism::Seed;
pub use tensor::{MatmulBackend, Tensor, TensorError, TensorResult};
