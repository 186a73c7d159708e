//! Error types for the sequential CSM test.
//!
//! Parameter and generator errors abort a run immediately with no partial
//! result. Numeric instability is detected inside the evaluator and raised
//! explicitly rather than propagated as a silent NaN. Everything else
//! resolves into the three-way [`Decision`](crate::Decision) enum.

use thiserror::Error;

/// Errors raised by the evaluator, boundary solver, or controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CsmError {
    /// A run parameter is outside its documented domain.
    ///
    /// Raised before any observation is drawn: alpha or epsilon outside
    /// (0, 1), a zero iteration cap, or a warm-up longer than the cap.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Which parameter failed validation and why.
        message: String,
    },

    /// The observation source returned a value outside {0, 1} or failed.
    ///
    /// The run is aborted with no partial result; source-raised errors are
    /// surfaced unchanged through this variant.
    #[error("observation source error: {message}")]
    Generator {
        /// What the source returned or reported.
        message: String,
    },

    /// A log-space computation received a non-positive argument or produced
    /// a non-finite value.
    #[error("numeric instability in {context}")]
    NumericInstability {
        /// The computation that became unstable.
        context: String,
    },

    /// The escape criterion and the boundary interval computed from the same
    /// inputs disagree.
    ///
    /// Signals a logic or numeric defect; raised for diagnosis rather than
    /// swallowed into an ambiguous result.
    #[error("invariant violation: {message}")]
    InvariantViolation {
        /// The inconsistent quantities, for diagnosis.
        message: String,
    },
}

impl CsmError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CsmError::InvalidParameter {
            message: message.into(),
        }
    }

    pub(crate) fn unstable(context: impl Into<String>) -> Self {
        CsmError::NumericInstability {
            context: context.into(),
        }
    }
}
