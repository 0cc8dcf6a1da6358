// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Seed Derivation
// ─────────────────────────────────────────────────────────────────────
//! One generator per sweep point, derived from the master seed by a
//! deterministic hash of (seed, sweep_index, sample_index). Generators
//! are never shared between threads.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generator type handed to every randomised builder.
pub type SampleRng = ChaCha8Rng;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 finaliser.
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derive the seed of sample `sample_index` at sweep point `sweep_index`.
///
/// Stable across platforms and releases; distinct inputs give
/// decorrelated outputs.
pub fn derive_seed(master: u64, sweep_index: u64, sample_index: u64) -> u64 {
    let a = mix64(master.wrapping_add(GOLDEN_GAMMA));
    let b = mix64(a ^ sweep_index.wrapping_mul(GOLDEN_GAMMA).wrapping_add(1));
    mix64(b ^ sample_index.wrapping_mul(GOLDEN_GAMMA).wrapping_add(2))
}

/// Generator for an explicit seed.
pub fn seeded_rng(seed: u64) -> SampleRng {
    ChaCha8Rng::seed_from_u64(seed)
}
