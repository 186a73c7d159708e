//! Convenience observation sources.
//!
//! The controller only needs an [`ObservationSource`]; these types cover the
//! common cases of a seeded Bernoulli stream (simulation, calibration
//! studies, deterministic tests) and a fixed repeating pattern.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::controller::ObservationSource;
use crate::error::CsmError;

/// I.i.d. Bernoulli observations from a seeded generator.
///
/// Two sources built with the same probability and seed produce identical
/// streams, making runs reproducible.
#[derive(Debug, Clone)]
pub struct BernoulliSource {
    rng: Xoshiro256PlusPlus,
    p: f64,
}

impl BernoulliSource {
    /// Create a source emitting 1 with probability `p`.
    ///
    /// # Panics
    ///
    /// Panics if `p` is not in [0, 1].
    pub fn new(p: f64, seed: u64) -> Self {
        assert!((0.0..=1.0).contains(&p), "p must be in [0, 1]");
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            p,
        }
    }
}

impl ObservationSource for BernoulliSource {
    fn draw(&mut self) -> Result<u8, CsmError> {
        Ok(u8::from(self.rng.gen_bool(self.p)))
    }
}

/// Observations cycled from a fixed pattern.
///
/// Useful for pinning down controller behavior in tests; the controller
/// still validates that every value is 0 or 1.
#[derive(Debug, Clone)]
pub struct CycleSource {
    pattern: Vec<u8>,
    next: usize,
}

impl CycleSource {
    /// Create a source repeating `pattern` indefinitely.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is empty.
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        let pattern = pattern.into();
        assert!(!pattern.is_empty(), "pattern must not be empty");
        Self { pattern, next: 0 }
    }
}

impl ObservationSource for CycleSource {
    fn draw(&mut self) -> Result<u8, CsmError> {
        let value = self.pattern[self.next];
        self.next = (self.next + 1) % self.pattern.len();
        Ok(value)
    }
}
