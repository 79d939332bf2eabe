// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! The trajectory engine: deterministic, order-sensitive evolution of batches
//! of semantic states.
//!
//! A [`SemanticEngine`] folds an ordered operator sequence over a batch,
//! applying the *logical leap* — a row-independent renormalization that keeps
//! trajectories bounded — after every step, and records the full history so
//! path dependence can be observed rather than inferred. Steps are strictly
//! sequential; within a step the batch rows are data-parallel.

mod engine;
mod trajectory;

pub use engine::{EngineError, EngineResult, SemanticEngine};
pub use trajectory::{path_divergence, Trajectory};

pub use leap_tensor::{MatmulBackend, Seed, Tensor, TensorError, TensorResult};
