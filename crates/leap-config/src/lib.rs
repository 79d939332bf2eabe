// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Process-wide configuration for the LeapTorch workspace: the seed policy
//! behind every random draw and the tracing subscriber bootstrap. Everything
//! is env-driven so demo runs and CI can flip behaviour without code changes.

pub mod determinism;
pub mod tracing;

pub use crate::tracing::{init_tracing, InitError, TracingGuard};
pub use determinism::Seed;
