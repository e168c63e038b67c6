//! Error types for pvalue-stats
//!
//! Every operation in this crate is a pure computation, so failures are
//! always about the arguments:
//! - Samples that are empty or hold values outside (0, 1]
//! - Weights that are non-positive, mismatched or singular
//! - Degenerate Monte Carlo / extension parameters

use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for p-value operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PvalueError {
    /// No p-values were supplied
    #[error("Invalid input: sample is empty")]
    EmptySample,

    /// A p-value lies outside (0, 1]
    #[error("Invalid input: p-value {value} at index {index} is outside (0, 1]")]
    OutOfRange { index: usize, value: f64 },

    /// A weight is not a positive finite number
    #[error("Invalid input: weight {value} at index {index} must be positive and finite")]
    InvalidWeight { index: usize, value: f64 },

    /// p-values and weights differ in length
    #[error("Invalid input: {pvalues} p-values but {weights} weights")]
    LengthMismatch { pvalues: usize, weights: usize },

    /// Any other invalid argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two weights are equal, so the Good cross-product vanishes
    #[error("Singular weights: weights at index {first} and {second} are equal")]
    SingularWeights { first: usize, second: usize },

    /// No positive spacing exists to extend the analytic curve
    #[error("Cannot extend uniform EDF: no positive step between {size} observed values")]
    UndefinedStep { size: usize },

    /// A weighted method was dispatched without weights
    #[error("Method '{method}' requires weights")]
    MissingWeights { method: String },

    /// Distribution construction failed
    #[error("Distribution error: {0}")]
    Distribution(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl PvalueError {
    /// True for the argument-validation family of errors
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PvalueError::EmptySample
                | PvalueError::OutOfRange { .. }
                | PvalueError::InvalidWeight { .. }
                | PvalueError::LengthMismatch { .. }
                | PvalueError::InvalidInput(_)
        )
    }
}

/// Result type alias for p-value operations
pub type PvalueResult<T> = Result<T, PvalueError>;
