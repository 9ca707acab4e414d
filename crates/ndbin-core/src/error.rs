//! Error types for N-dimensional binning
//!
//! Provides a unified error type for all ndbin crates.

use thiserror::Error;

/// Core error type for binning operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a function (axis parameters, bin count, ...)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// A name that was never registered as an axis or variable
    #[error("Unknown axis or variable: {0}")]
    UnknownName(String),

    /// An action name missing from the registry
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for empty input
    pub fn empty_input(operation: &str) -> Self {
        tracing::trace!("empty input in {operation}");
        Self::InsufficientData {
            expected: 1,
            actual: 0,
        }
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for a floating-point axis whose range collapsed to a point
    pub fn zero_range(axis: &str, value: f64) -> Self {
        Self::InvalidParameter(format!(
            "Axis '{axis}' has zero range (min = max = {value})"
        ))
    }

    /// Create an error for an integral axis asked for more bins than values
    pub fn too_many_bins(axis: &str, n: usize, distinct: f64) -> Self {
        Self::InvalidParameter(format!(
            "Axis '{axis}' requests {n} bins but spans only {distinct} distinct integral values"
        ))
    }

    /// Create an error for an action name the registry does not know
    pub fn unknown_action(name: &str) -> Self {
        Self::UnknownAction(name.to_string())
    }
}
