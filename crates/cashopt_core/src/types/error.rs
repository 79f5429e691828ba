//! Error types for the foundation layer.
//!
//! This module provides:
//! - `PricingError`: Categorised errors for pricing operations
//! - `SolverError`: Errors from root-finding solvers

use thiserror::Error;

/// Categorised pricing errors.
///
/// Higher layers convert their own errors into this type at API boundaries.
///
/// # Examples
/// ```
/// use cashopt_core::types::PricingError;
///
/// let err = PricingError::InvalidInput("Negative spot price".to_string());
/// assert_eq!(format!("{}", err), "Invalid input: Negative spot price");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PricingError {
    /// Invalid input data or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Numerical instability during computation
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Model failed to produce valid result
    #[error("Model failure: {0}")]
    ModelFailure(String),

    /// Instrument type not supported
    #[error("Unsupported instrument: {0}")]
    UnsupportedInstrument(String),
}

/// Root-finding solver errors.
///
/// # Examples
/// ```
/// use cashopt_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100 };
/// assert!(format!("{}", err).contains("100 iterations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// Solver failed to converge within maximum iterations.
    #[error("Failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Number of iterations attempted
        iterations: usize,
    },

    /// Derivative near zero (division by zero risk in Newton-Raphson).
    #[error("Derivative near zero at x = {x}")]
    DerivativeNearZero {
        /// The x value where derivative was near zero
        x: f64,
    },

    /// No valid bracket (function values at endpoints have same sign).
    #[error("No bracket: f({a}) and f({b}) have same sign")]
    NoBracket {
        /// Left bracket endpoint
        a: f64,
        /// Right bracket endpoint
        b: f64,
    },

    /// An iterate left the admissible interval.
    #[error("Iterate x = {x} left the interval [{lower}, {upper}]")]
    OutOfBounds {
        /// The offending iterate
        x: f64,
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },

    /// Numerical instability during computation.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

impl From<SolverError> for PricingError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::MaxIterationsExceeded { .. } => PricingError::ModelFailure(err.to_string()),
            _ => PricingError::NumericalInstability(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_error_display() {
        assert_eq!(
            PricingError::NumericalInstability("d1 is NaN".to_string()).to_string(),
            "Numerical instability: d1 is NaN"
        );
        assert_eq!(
            PricingError::ModelFailure("x".to_string()).to_string(),
            "Model failure: x"
        );
        assert_eq!(
            PricingError::UnsupportedInstrument("digital".to_string()).to_string(),
            "Unsupported instrument: digital"
        );
    }

    #[test]
    fn test_solver_error_display() {
        let err = SolverError::NoBracket { a: 0.0001, b: 5.0 };
        assert_eq!(err.to_string(), "No bracket: f(0.0001) and f(5) have same sign");

        let err = SolverError::OutOfBounds {
            x: 7.5,
            lower: 0.0,
            upper: 5.0,
        };
        assert_eq!(err.to_string(), "Iterate x = 7.5 left the interval [0, 5]");
    }

    #[test]
    fn test_solver_error_into_pricing_error() {
        let err: PricingError = SolverError::MaxIterationsExceeded { iterations: 10 }.into();
        assert!(matches!(err, PricingError::ModelFailure(msg) if msg.contains("10 iterations")));

        let err: PricingError = SolverError::DerivativeNearZero { x: 0.0 }.into();
        assert!(matches!(err, PricingError::NumericalInstability(_)));
    }

    #[test]
    fn test_error_trait_object() {
        let err = SolverError::NumericalInstability("overflow".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
