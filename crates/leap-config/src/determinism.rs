// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Seed policy for reproducible batch generation.
//!
//! Trajectory runs are pure, so reproducibility hinges entirely on the
//! inputs. Every random draw in the workspace names its seed through
//! [`Seed`]: an explicit value replays bit-identically on its own, while a
//! named stream defers to the process policy — when `LEAP_DETERMINISTIC` is
//! set, each label derives its own seed from `LEAP_DETERMINISTIC_SEED`, so
//! callers drawing from distinct labels can never collide on a stream.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::OnceLock;

const REPLAY_ENV: &str = "LEAP_DETERMINISTIC";
const SEED_ENV: &str = "LEAP_DETERMINISTIC_SEED";
const REDUCTION_ENV: &str = "LEAP_DETERMINISTIC_REDUCTION";

const DEFAULT_BASE_SEED: u64 = 42;

/// Seed selection for a single random draw.
#[derive(Clone, Copy, Debug)]
pub enum Seed<'a> {
    /// A fixed seed. Replays bit-identically regardless of the process
    /// policy.
    Explicit(u64),
    /// A caller-named stream. Under replay the seed is derived from the base
    /// seed and the label; otherwise the draw comes from OS entropy.
    Stream(&'a str),
}

/// Snapshot of the process replay policy.
#[derive(Clone, Debug)]
pub struct SeedPolicy {
    replay: bool,
    base_seed: u64,
    pin_reductions: bool,
}

impl SeedPolicy {
    fn from_env() -> Self {
        let replay = env_flag(REPLAY_ENV).unwrap_or(false);
        let base_seed = std::env::var(SEED_ENV)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_BASE_SEED);
        let pin_reductions = env_flag(REDUCTION_ENV).unwrap_or(replay);
        Self {
            replay,
            base_seed,
            pin_reductions,
        }
    }

    /// Whether named streams replay deterministically.
    pub fn replay_enabled(&self) -> bool {
        self.replay
    }

    /// The base seed stream derivation starts from.
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Whether rayon reductions should be pinned to a single thread.
    pub fn pin_reductions(&self) -> bool {
        self.replay && self.pin_reductions
    }

    /// Stable seed for a named stream.
    ///
    /// The label bytes are folded FNV-1a style into the base seed and the
    /// result finished with a splitmix64 round. Deliberately independent of
    /// `std`'s hasher, whose output may change between Rust releases.
    pub fn stream_seed(&self, label: &str) -> u64 {
        let mut state = self.base_seed ^ 0xcbf2_9ce4_8422_2325;
        for &byte in label.as_bytes() {
            state = (state ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3);
        }
        splitmix64(state)
    }
}

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    let value = raw.trim().to_ascii_lowercase();
    Some(!matches!(value.as_str(), "" | "0" | "false" | "no" | "off"))
}

static POLICY: OnceLock<SeedPolicy> = OnceLock::new();

/// The lazily initialised process policy. The first read also applies the
/// rayon hint, which only takes effect if no pool has been built yet.
pub fn policy() -> &'static SeedPolicy {
    POLICY.get_or_init(|| {
        let policy = SeedPolicy::from_env();
        if policy.pin_reductions() {
            std::env::set_var("RAYON_NUM_THREADS", "1");
        }
        policy
    })
}

/// Builds the RNG for one draw according to the seed selection.
pub fn rng(seed: Seed<'_>) -> StdRng {
    match seed {
        Seed::Explicit(value) => StdRng::seed_from_u64(value),
        Seed::Stream(label) => {
            let policy = policy();
            if policy.replay_enabled() {
                StdRng::seed_from_u64(policy.stream_seed(label))
            } else {
                StdRng::from_entropy()
            }
        }
    }
}
