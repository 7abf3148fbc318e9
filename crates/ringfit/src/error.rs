//! Error type shared by all ringfit modules.

use thiserror::Error;

/// Errors produced while building filters, images, divergences and
/// extraction contexts.
#[derive(Error, Debug)]
pub enum FilterError {
    /// A template parameter violates its construction guard.
    #[error("invalid {kind}.{field} = {value}: {reason}")]
    InvalidParameter {
        /// Filter kind name.
        kind: &'static str,
        /// Parameter name.
        field: String,
        /// Offending value.
        value: f64,
        /// Human readable guard description.
        reason: &'static str,
    },

    /// Flat parameter vector length disagrees with the shape arity.
    #[error("parameter count mismatch: shape expects {expected}, got {got}")]
    ParameterCountMismatch {
        /// Arity of the shape descriptor.
        expected: usize,
        /// Length of the supplied vector.
        got: usize,
    },

    /// A distribution with zero or non-finite total intensity.
    #[error("degenerate distribution: {0}")]
    DegenerateDistribution(String),

    /// Bounds or initial guess out of order for one coordinate.
    #[error("invalid bounds at index {index}: lower={lower}, initial={initial}, upper={upper}")]
    InvalidBounds {
        /// Coordinate in the flat parameter vector.
        index: usize,
        /// Lower bound.
        lower: f64,
        /// Initial guess.
        initial: f64,
        /// Upper bound.
        upper: f64,
    },

    /// Bound vectors of the wrong length.
    #[error("bounds length mismatch: expected {expected}, got {got}")]
    BoundsLengthMismatch {
        /// Arity of the extraction shape.
        expected: usize,
        /// Length of the supplied bound vector.
        got: usize,
    },

    /// Filter trees that should share a shape do not.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Description of the expected shape.
        expected: String,
        /// Description of the supplied shape.
        got: String,
    },

    /// Malformed intensity grid.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, FilterError>;
