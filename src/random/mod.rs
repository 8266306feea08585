//! The uniform random number source the simulation draws from.
//!
//! Every stochastic decision in the engine consumes exactly one value from a [`RandomSource`],
//! and the order of those calls is part of the model: a whole run is one continuous stream that
//! is seeded once, so reproducing a result requires the same seed and the same call order. The
//! source is passed explicitly to every operation that needs it rather than living in global
//! state.
mod replay;

pub use replay::ReplaySource;

use crate::log::trace;
use rand::distr::Open01;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A source of uniform deviates in the open interval (0, 1).
pub trait RandomSource {
    /// Returns the next value of the stream, strictly between 0 and 1.
    fn next_uniform(&mut self) -> f64;

    /// Draws an integer uniformly from `0..n` by truncating `n * u`.
    ///
    /// Consumes exactly one uniform value.
    fn next_below(&mut self, n: usize) -> usize {
        let index = (n as f64 * self.next_uniform()) as usize;
        // `u < 1` guarantees `index < n` except for rounding at the very top of the interval.
        index.min(n.saturating_sub(1))
    }
}

/// The production random source: a seedable `SmallRng` sampled through `Open01`.
#[derive(Clone, Debug)]
pub struct SimRng {
    rng: SmallRng,
}

impl SimRng {
    /// Creates a generator whose stream is fully determined by `seed`.
    #[must_use]
    pub fn seed_from(seed: u64) -> Self {
        trace!("seeding random source with {seed}");
        SimRng {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SimRng {
    fn next_uniform(&mut self) -> f64 {
        self.rng.sample(Open01)
    }
}
