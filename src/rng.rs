//! Deterministic RNG derivation for VNS shakes and K3 worker fan-out.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Derive a reproducible per-worker RNG from the global seed and a
/// worker index, so K3's independent shaken copies are each driven by a
/// distinct but deterministic stream (§5: "Each worker uses an RNG
/// derived from (global seed, worker index)").
pub fn worker_rng(global_seed: u64, worker_index: usize) -> ChaCha8Rng {
    // Mix with a fixed odd constant (splitmix64-style) so nearby worker
    // indices don't produce correlated seeds.
    let mixed = global_seed
        .wrapping_add((worker_index as u64).wrapping_mul(0x9E3779B97F4A7C15));
    ChaCha8Rng::seed_from_u64(mixed)
}
