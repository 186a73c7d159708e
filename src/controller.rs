//! Sequential controller for the CSM test.
//!
//! Drives the observation loop: draw, update counts, evaluate the stopping
//! criterion, and on escape classify the stop through the boundary solver.
//! One observation is drawn and fully processed per iteration; iterations
//! are strictly sequential and data-dependent, so there is no intra-run
//! parallelism. Independent runs share no state and may be executed
//! concurrently by the caller.
//!
//! The run moves through the phases Accumulating -> Escaped -> Classified,
//! or Accumulating -> Exhausted -> Classified(Inconclusive) when the
//! iteration cap is reached without an escape.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::boundary::{find_interval, BoundaryStrategy, EXHAUSTIVE_LIMIT};
use crate::config::CsmConfig;
use crate::criteria::criteria;
use crate::error::CsmError;

/// A stream of binary outcomes from a resampling or permutation procedure.
///
/// Each call must yield exactly 0 or 1; the source may hold internal state
/// (for example a seeded random generator) across calls. Errors returned
/// from `draw` abort the run and are surfaced unchanged to the caller.
///
/// Infallible closures get a blanket implementation, so a plain
/// `FnMut() -> u8` works directly:
///
/// ```
/// use csm::{run, CsmConfig, Decision};
///
/// let mut source = || 1u8;
/// let outcome = run(&mut source, &CsmConfig::default().warmup(0)).unwrap();
/// assert_eq!(outcome.decision, Decision::FailToRejectNull);
/// ```
pub trait ObservationSource {
    /// Draw the next binary observation.
    fn draw(&mut self) -> Result<u8, CsmError>;
}

impl<F> ObservationSource for F
where
    F: FnMut() -> u8,
{
    fn draw(&mut self) -> Result<u8, CsmError> {
        Ok(self())
    }
}

/// Final classification of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The estimated p-value sits below alpha: reject the null hypothesis.
    RejectNull,
    /// The estimated p-value sits above alpha: fail to reject the null.
    FailToRejectNull,
    /// No conclusion: the iteration cap was exhausted, or the escape
    /// happened beyond the exhaustive boundary range.
    Inconclusive,
}

impl Decision {
    /// Whether the run ended with a definitive accept/reject classification.
    pub fn is_conclusive(&self) -> bool {
        !matches!(self, Decision::Inconclusive)
    }
}

/// Structured result of a completed run.
///
/// Replaces any printing: the run's behavior is fully captured by this
/// value, with diagnostics routed through `tracing` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Empirical proportion s/n at the stopping point.
    pub p_hat: f64,
    /// Three-way classification of the stop.
    pub decision: Decision,
    /// Iterations consumed.
    pub n_used: u64,
    /// Successes observed.
    pub s_count: u64,
    /// Stopping interval used for classification, when one was computed.
    /// `None` on timeout and on escapes beyond the exhaustive range.
    pub interval: Option<(i64, i64)>,
}

impl RunOutcome {
    /// Whether the run ended with a definitive accept/reject classification.
    pub fn is_conclusive(&self) -> bool {
        self.decision.is_conclusive()
    }
}

/// Accumulated run state: iteration and success counts.
#[derive(Debug, Clone, Copy, Default)]
struct RunState {
    n: u64,
    s: u64,
}

impl RunState {
    fn record(&mut self, observation: u8) {
        self.n += 1;
        self.s += u64::from(observation);
    }

    fn p_hat(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.s as f64 / self.n as f64
    }
}

/// Run the sequential CSM test against an observation source.
///
/// Draws one observation per iteration up to `config.max_n`, evaluating the
/// stopping criterion (with exact combinatorics) once the warm-up period has
/// passed. When the criterion drops to `config.epsilon` or below, the stop
/// is classified through the boundary solver; if the cap is exhausted first
/// the result is [`Decision::Inconclusive`] with the final empirical
/// proportion.
///
/// # Errors
///
/// - [`CsmError::InvalidParameter`] if the configuration is invalid
///   (checked before any observation is drawn).
/// - [`CsmError::Generator`] if the source yields anything but 0 or 1, or
///   fails; the run aborts with no partial result.
/// - [`CsmError::NumericInstability`] from the evaluator.
/// - [`CsmError::InvariantViolation`] if an escape lands strictly inside the
///   interval computed from the same inputs.
pub fn run<S>(source: &mut S, config: &CsmConfig) -> Result<RunOutcome, CsmError>
where
    S: ObservationSource + ?Sized,
{
    config.validate()?;

    let mut state = RunState::default();
    for _ in 0..config.max_n {
        let observation = source.draw()?;
        if observation > 1 {
            return Err(CsmError::Generator {
                message: format!("observation must be 0 or 1, got {observation}"),
            });
        }
        state.record(observation);

        // No stopping decision during warm-up: small-sample noise would
        // otherwise escape the envelope almost immediately.
        if state.n < config.warmup {
            continue;
        }

        let criterion = criteria(state.n, config.alpha, state.s, true)?;
        if criterion <= config.epsilon {
            debug!(
                n = state.n,
                s = state.s,
                criterion,
                p_hat = state.p_hat(),
                "left the confidence envelope"
            );
            return classify_escape(&state, config);
        }
    }

    debug!(
        n = state.n,
        s = state.s,
        p_hat = state.p_hat(),
        "iteration cap exhausted without escape"
    );
    Ok(RunOutcome {
        p_hat: state.p_hat(),
        decision: Decision::Inconclusive,
        n_used: state.n,
        s_count: state.s,
        interval: None,
    })
}

/// Classify an escape through the boundary solver.
fn classify_escape(state: &RunState, config: &CsmConfig) -> Result<RunOutcome, CsmError> {
    // The exhaustive scan is impractical at this scale; leave the
    // interpretation of the stop to the caller.
    if state.n >= EXHAUSTIVE_LIMIT && config.strategy == BoundaryStrategy::Exhaustive {
        debug!(n = state.n, "escape beyond exhaustive boundary range");
        return Ok(RunOutcome {
            p_hat: state.p_hat(),
            decision: Decision::Inconclusive,
            n_used: state.n,
            s_count: state.s,
            interval: None,
        });
    }

    let (lower, upper) = find_interval(config.alpha, state.n, config.epsilon, config.strategy)?;
    let s = state.s as i64;
    let decision = if s <= lower {
        Decision::RejectNull
    } else if s >= upper {
        Decision::FailToRejectNull
    } else {
        // The escape condition and the interval come from the same inputs;
        // disagreement is a defect, not a result.
        return Err(CsmError::InvariantViolation {
            message: format!(
                "escape at n = {}, s = {} lies strictly inside ({lower}, {upper})",
                state.n, state.s
            ),
        });
    };
    debug!(n = state.n, s = state.s, lower, upper, ?decision, "escape classified");
    Ok(RunOutcome {
        p_hat: state.p_hat(),
        decision,
        n_used: state.n,
        s_count: state.s,
        interval: Some((lower, upper)),
    })
}
