//! Random number generation helpers.
//!
//! All stochastic code in this crate is generic over [`rand::Rng`] and
//! receives its generator explicitly. [`create_rng`] builds the default
//! seedable generator used by the engine.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// The generator type used by the engine.
pub type EvolveRng = StdRng;

/// Creates a deterministic generator from a seed.
///
/// Two generators created from the same seed produce the same stream.
pub fn create_rng(seed: u64) -> EvolveRng {
    StdRng::seed_from_u64(seed)
}

/// Creates a generator from an optional seed, falling back to a random one.
pub fn rng_from_seed(seed: Option<u64>) -> EvolveRng {
    match seed {
        Some(seed) => create_rng(seed),
        None => create_rng(rand::random()),
    }
}
