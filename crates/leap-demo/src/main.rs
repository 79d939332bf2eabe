// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! The non-commutativity demonstration: push one batch through the
//! cycle/reflection generator pair in both orders and report how far the
//! endpoints drift apart.
//!
//! Construction is explicit end to end — the engine never prints, the driver
//! never computes. `LEAP_DIMS`, `LEAP_BATCH`, `LEAP_C_LIMIT` and `LEAP_SEED`
//! override the defaults; `LEAP_REPORT_JSON=1` swaps the human-readable
//! report for a JSON document on stdout.

use leap_engine::{path_divergence, SemanticEngine};
use leap_operators::{commutator_norm, rotation, scaled_cycle, scaled_reflection, shear};
use leap_tensor::{Seed, Tensor};
use serde::Serialize;
use std::error::Error;
use std::str::FromStr;

const DEFAULT_DIMS: usize = 8;
const DEFAULT_BATCH: usize = 3;
const DEFAULT_C_LIMIT: f32 = 0.4;
const GENERATOR_SCALE: f32 = 1.1;

/// Everything the report prints, in one serializable value.
#[derive(Debug, Serialize)]
struct PathDependenceReport {
    batch_size: usize,
    n_dims: usize,
    c_limit: f32,
    generator_scale: f32,
    alpha_first_sample: Vec<f32>,
    beta_first_sample: Vec<f32>,
    path_divergence: f32,
    commutator_norm: f32,
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|raw| matches!(raw.as_str(), "1" | "true" | "True" | "on" | "ON"))
        .unwrap_or(false)
}

fn main() -> Result<(), Box<dyn Error>> {
    let _tracing = leap_config::init_tracing()?;

    let n_dims = env_parsed("LEAP_DIMS", DEFAULT_DIMS);
    let batch_size = env_parsed("LEAP_BATCH", DEFAULT_BATCH);
    let c_limit = env_parsed("LEAP_C_LIMIT", DEFAULT_C_LIMIT);
    let seed = std::env::var("LEAP_SEED")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .map_or(Seed::Stream("leap-demo/batch"), Seed::Explicit);

    let engine = SemanticEngine::new(n_dims, c_limit)?;
    let batch = Tensor::random_normal(batch_size, n_dims, 0.0, 1.0, seed)?;

    let cycle = scaled_cycle(n_dims, GENERATOR_SCALE)?;
    let reflection = scaled_reflection(n_dims, GENERATOR_SCALE)?;

    tracing::info!(n_dims, batch_size, c_limit, "running competing trajectories");

    let alpha = engine.run_trajectory(&batch, &[cycle.clone(), reflection.clone()])?;
    let beta = engine.run_trajectory(&batch, &[reflection, cycle])?;

    // Algebraic witness alongside the trajectory evidence: a planar rotation
    // against a shear on an overlapping plane.
    let rot = rotation(n_dims, 0, 1, std::f32::consts::FRAC_PI_4)?;
    let drift = shear(n_dims, 1, 2, 0.5)?;

    let report = PathDependenceReport {
        batch_size,
        n_dims,
        c_limit,
        generator_scale: GENERATOR_SCALE,
        alpha_first_sample: alpha.final_states().row(0).to_vec(),
        beta_first_sample: beta.final_states().row(0).to_vec(),
        path_divergence: path_divergence(alpha.final_states(), beta.final_states())?,
        commutator_norm: commutator_norm(&rot, &drift)?,
    };

    if env_flag("LEAP_REPORT_JSON") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_sample(label: &str, row: &[f32]) {
    println!("[{label} (first sample)]");
    println!("  {row:?}");
}

fn print_report(report: &PathDependenceReport) {
    println!("--- LeapTorch path-dependence report ---");
    println!(
        "batch size: {} | manifold dims: {} | c_limit: {}",
        report.batch_size, report.n_dims, report.c_limit
    );
    println!();
    print_sample("trajectory alpha", &report.alpha_first_sample);
    println!();
    print_sample("trajectory beta", &report.beta_first_sample);
    println!();
    println!("path divergence: {:.6}", report.path_divergence);
    println!(
        "rotation/shear commutator norm: {:.6}",
        report.commutator_norm
    );
}
