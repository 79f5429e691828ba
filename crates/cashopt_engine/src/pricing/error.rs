//! Error types for implied volatility solving.

use cashopt_core::types::{PricingError, SolverError};
use thiserror::Error;

/// Implied volatility errors.
///
/// # Examples
/// ```
/// use cashopt_engine::pricing::ImpliedVolError;
///
/// let err = ImpliedVolError::NonConvergent { iterations: 100 };
/// assert!(err.to_string().contains("100 iterations"));
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImpliedVolError {
    /// The iteration cap was reached without meeting the tolerance.
    #[error("Implied volatility did not converge after {iterations} iterations")]
    NonConvergent {
        /// Iterations attempted
        iterations: usize,
    },

    /// No volatility inside the search bounds reproduces the price.
    #[error("Price {price} outside attainable range [{lower}, {upper}]")]
    PriceOutOfRange {
        /// Observed price
        price: f64,
        /// Model price at the lower volatility bound
        lower: f64,
        /// Model price at the upper volatility bound
        upper: f64,
    },

    /// Price carries no volatility information at or after expiry.
    #[error("Option expired: T = {time_to_expiry}")]
    Expired {
        /// Time to expiry in years
        time_to_expiry: f64,
    },

    /// Observed price is negative or not finite.
    #[error("Invalid observed price: {price}")]
    InvalidPrice {
        /// The rejected price
        price: f64,
    },

    /// Solver settings are unusable.
    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),

    /// The underlying root finder failed for another reason.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

impl From<ImpliedVolError> for PricingError {
    fn from(err: ImpliedVolError) -> Self {
        match err {
            ImpliedVolError::NonConvergent { .. } => PricingError::ModelFailure(err.to_string()),
            ImpliedVolError::PriceOutOfRange { .. }
            | ImpliedVolError::Expired { .. }
            | ImpliedVolError::InvalidPrice { .. }
            | ImpliedVolError::InvalidConfig(_) => PricingError::InvalidInput(err.to_string()),
            ImpliedVolError::Solver(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ImpliedVolError::PriceOutOfRange {
            price: 20.0,
            lower: 0.5,
            upper: 17.5,
        };
        assert_eq!(err.to_string(), "Price 20 outside attainable range [0.5, 17.5]");
        assert_eq!(
            ImpliedVolError::Expired { time_to_expiry: 0.0 }.to_string(),
            "Option expired: T = 0"
        );
    }

    #[test]
    fn test_into_pricing_error() {
        let err: PricingError = ImpliedVolError::NonConvergent { iterations: 7 }.into();
        assert!(matches!(err, PricingError::ModelFailure(_)));

        let err: PricingError = ImpliedVolError::InvalidPrice { price: -1.0 }.into();
        assert!(matches!(err, PricingError::InvalidInput(msg) if msg.contains("-1")));

        let err: PricingError =
            ImpliedVolError::Solver(SolverError::DerivativeNearZero { x: 0.1 }).into();
        assert!(matches!(err, PricingError::NumericalInstability(_)));
    }

    #[test]
    fn test_from_solver_error() {
        let err: ImpliedVolError = SolverError::NoBracket { a: 0.0, b: 1.0 }.into();
        assert!(matches!(err, ImpliedVolError::Solver(SolverError::NoBracket { .. })));
    }
}
