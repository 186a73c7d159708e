//! # csm
//!
//! Early stopping for Monte Carlo permutation tests via the Confidence
//! Sequence Method (CSM, Ding, Gandy & Hahn, arXiv:1611.01675).
//!
//! A permutation or resampling test estimates a p-value by repeatedly
//! drawing a binary outcome: did the resampled statistic meet or exceed the
//! observed one? Running a fixed, large number of resamples wastes work when
//! the answer is clear early. This crate consumes that binary stream
//! sequentially and stops as soon as enough evidence has accumulated to
//! place the p-value on one side of the significance level, while bounding
//! the probability that stopping early gives the wrong answer (the
//! "resampling risk" epsilon).
//!
//! The crate implements exactly one stopping rule, for a Bernoulli
//! observation stream with a fixed, pre-declared significance level. It does
//! not generate test statistics, run the permutation procedure, or report
//! results; the observation source and the result consumer are the caller's.
//!
//! ## Quick start
//!
//! ```
//! use csm::{helpers::BernoulliSource, run, CsmConfig};
//!
//! # fn main() -> Result<(), csm::CsmError> {
//! // An effect well above alpha = 0.05: the test stops long before the cap.
//! let mut source = BernoulliSource::new(0.30, 42);
//! let outcome = run(&mut source, &CsmConfig::default())?;
//!
//! assert!(outcome.decision.is_conclusive());
//! assert!(outcome.n_used < 10_000);
//! # Ok(())
//! # }
//! ```
//!
//! Diagnostics are emitted as `tracing` events; install a subscriber to see
//! them, or run headless and rely solely on the returned [`RunOutcome`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod boundary;
mod config;
mod controller;
mod criteria;
mod error;
pub mod helpers;

pub use boundary::{find_interval, BoundaryStrategy, EXHAUSTIVE_LIMIT};
pub use config::CsmConfig;
pub use controller::{run, Decision, ObservationSource, RunOutcome};
pub use criteria::criteria;
pub use error::CsmError;
