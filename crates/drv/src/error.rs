//! Error types for random variable construction and evaluation.

use thiserror::Error;

/// Why a set of probabilities was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistributionFault {
    /// Negative probability encountered.
    #[error("negative probability encountered")]
    NegativeProbability,

    /// A probability parameter greater than one.
    #[error("probability {p} is greater than 1")]
    ProbabilityAboveOne { p: f64 },

    /// NaN or infinite weight.
    #[error("probability is not a finite number")]
    NonFiniteProbability,

    /// All weights are zero (can't normalize).
    #[error("cannot normalize: all weights are zero")]
    ZeroWeights,

    /// No outcomes at all.
    #[error("support cannot be empty")]
    EmptySupport,

    /// Values and weights don't pair up.
    #[error("{values} values but {weights} weights")]
    LengthMismatch { values: usize, weights: usize },

    /// The mass function sums to infinity.
    #[error("probability mass diverges")]
    Diverging,
}

/// Errors that can occur when building or evaluating random variables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DrvError {
    /// The probabilities do not describe a distribution.
    #[error("Invalid distribution: {0}")]
    InvalidDistribution(#[from] DistributionFault),

    /// Reduction over zero random variables with no identity element.
    #[error("Operator {operator} applied to an empty pool")]
    EmptyPool { operator: String },

    /// The operator produced a value outside the target codomain.
    #[error("Operator {operator} has no representable result for inputs {inputs}")]
    InvalidOperatorResult { operator: String, inputs: String },

    /// The operation is not available for this kind of random variable.
    #[error("Unsupported operation {operation}: {reason}")]
    UnsupportedOperation { operation: String, reason: String },

    /// An infinite summation could not be resolved.
    #[error("Could not determine {what}")]
    Undetermined { what: String },

    /// Index out of bounds.
    #[error("Index {index} out of bounds for size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Quantile outside (0, 1].
    #[error("Quantile {q} outside (0, 1]")]
    InvalidQuantile { q: f64 },

    /// Engine configuration could not be read.
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// A report could not be written out.
    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },
}

impl From<serde_json::Error> for DrvError {
    fn from(e: serde_json::Error) -> Self {
        DrvError::Serialization {
            reason: e.to_string(),
        }
    }
}

impl DrvError {
    pub(crate) fn unsupported(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        DrvError::UnsupportedOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}
