// Validation errors for the policy core.
//
// The evaluator and optimizer are pure functions over caller-supplied
// vectors. Anything malformed is rejected up front with one of these
// variants so callers can tell a bad sample apart from a bad argument.
// The guardrail-infeasible case is deliberately NOT here: that path returns
// a normal result with `fallback_used` set.

use thiserror::Error;

/// Errors raised by the policy evaluator and threshold optimizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// The evaluation sample has no events, so rates are undefined.
    #[error("Evaluation sample is empty")]
    EmptySample,

    /// Scores and labels are not aligned one-to-one.
    #[error("Sample length mismatch: {scores} scores, {labels} labels")]
    LengthMismatch { scores: usize, labels: usize },

    /// A label other than 0 (benign) or 1 (malicious).
    #[error("Invalid label {value} at index {index} (expected 0 or 1)")]
    InvalidLabel { index: usize, value: u8 },

    /// A score that is NaN or outside [0, 1].
    #[error("Invalid score {value} at index {index} (expected a probability in [0, 1])")]
    InvalidScore { index: usize, value: f64 },

    /// A threshold pair violating 0 <= tau1 < tau2 <= 1.
    #[error("Invalid thresholds tau1={tau1}, tau2={tau2} (need 0 <= tau1 < tau2 <= 1)")]
    InvalidThresholds { tau1: f64, tau2: f64 },

    /// A negative or non-finite cost weight.
    #[error("Invalid cost weight {name}={value} (must be finite and non-negative)")]
    InvalidCostWeight { name: &'static str, value: f64 },

    /// A guardrail rate outside [0, 1].
    #[error("Invalid guardrail {name}={value} (must be a rate in [0, 1])")]
    InvalidGuardrail { name: &'static str, value: f64 },

    /// A threshold grid that cannot produce any ordered pair.
    #[error("Invalid threshold grid: {message}")]
    InvalidGrid { message: String },
}

impl PolicyError {
    /// Create an InvalidGrid error.
    pub fn invalid_grid(message: impl Into<String>) -> Self {
        Self::InvalidGrid {
            message: message.into(),
        }
    }
}
