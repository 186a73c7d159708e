//! Run configuration for the sequential CSM test.

use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryStrategy;
use crate::error::CsmError;

/// Parameters of a single run, fixed at invocation.
///
/// The defaults mirror the parameter set the method was published with:
/// alpha = 0.05, epsilon = 0.001, a cap of 10,000 observations, and a
/// 499-iteration warm-up before any stopping decision is permitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsmConfig {
    /// Significance level the estimated p-value is tested against.
    /// Must be strictly inside (0, 1).
    pub alpha: f64,

    /// Resampling-risk bound: the probability that an early stop yields the
    /// wrong conclusion. Must be strictly inside (0, 1); values from the
    /// CSM paper sit in [1e-4, 1e-2].
    pub epsilon: f64,

    /// Maximum number of observations to consume before giving up.
    pub max_n: u64,

    /// Minimum iterations before the stopping criterion is evaluated,
    /// guarding against small-sample noise. May be zero.
    pub warmup: u64,

    /// How the stopping interval is located when an escape occurs.
    pub strategy: BoundaryStrategy,
}

impl Default for CsmConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            epsilon: 1e-3,
            max_n: 10_000,
            warmup: 499,
            strategy: BoundaryStrategy::Exhaustive,
        }
    }
}

impl CsmConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tighter resampling-risk bound (epsilon = 1e-4) at the cost of longer
    /// runs; iteration cap raised accordingly.
    pub fn strict() -> Self {
        Self {
            epsilon: 1e-4,
            max_n: 100_000,
            ..Self::default()
        }
    }

    /// Set the significance level.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the resampling-risk bound.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the iteration cap.
    pub fn max_n(mut self, max_n: u64) -> Self {
        self.max_n = max_n;
        self
    }

    /// Set the warm-up iteration count.
    pub fn warmup(mut self, warmup: u64) -> Self {
        self.warmup = warmup;
        self
    }

    /// Set the boundary-search strategy.
    pub fn strategy(mut self, strategy: BoundaryStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Check every parameter against its documented domain.
    ///
    /// Called by [`run`](crate::run) before the first observation is drawn.
    pub fn validate(&self) -> Result<(), CsmError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(CsmError::invalid(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(self.epsilon > 0.0 && self.epsilon < 1.0) {
            return Err(CsmError::invalid(format!(
                "epsilon must be in (0, 1), got {}",
                self.epsilon
            )));
        }
        if self.max_n == 0 {
            return Err(CsmError::invalid("max_n must be positive"));
        }
        if self.warmup > self.max_n {
            return Err(CsmError::invalid(format!(
                "warmup ({}) exceeds max_n ({})",
                self.warmup, self.max_n
            )));
        }
        Ok(())
    }
}
