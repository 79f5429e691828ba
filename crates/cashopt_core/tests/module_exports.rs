//! Integration tests for module exports.
//!
//! Verify that the public modules and types are reachable via absolute paths
//! and compose the way the engine uses them.

use approx::assert_relative_eq;

#[test]
fn test_distribution_exports() {
    use cashopt_core::math::distributions::{norm_cdf, norm_pdf};
    use cashopt_core::math::norm_cdf as reexported_cdf;

    assert_relative_eq!(norm_cdf(0.0_f64), reexported_cdf(0.0_f64));
    assert!(norm_pdf(0.0_f64) > norm_pdf(1.0_f64));
}

#[test]
fn test_solver_exports() {
    use cashopt_core::math::solvers::{BrentSolver, NewtonRaphsonSolver, SolverConfig};
    use cashopt_core::types::SolverError;

    let config = SolverConfig::new(1e-12_f64, 60);
    let f = |x: f64| x.powi(3) - 27.0;

    let newton = NewtonRaphsonSolver::new(config);
    assert_relative_eq!(newton.find_root(f, |x| 3.0 * x * x, 4.0).unwrap(), 3.0, epsilon = 1e-9);

    let brent = BrentSolver::new(config);
    assert_relative_eq!(brent.find_root(f, 0.0, 10.0).unwrap(), 3.0, epsilon = 1e-9);

    let no_bracket: Result<f64, SolverError> = brent.find_root(f, 4.0, 10.0);
    assert!(matches!(no_bracket, Err(SolverError::NoBracket { .. })));
}

/// A bounded Newton search that overshoots can be retried with Brent on the
/// same interval, which is the pattern the implied-vol solver follows.
#[test]
fn test_newton_then_brent_fallback() {
    use cashopt_core::math::solvers::{BrentSolver, NewtonRaphsonSolver, SolverConfig};

    let config = SolverConfig::new(1e-10_f64, 100);
    let f = |x: f64| x.atan() - 0.5;
    let f_prime = |x: f64| 1.0 / (1.0 + x * x);

    let newton = NewtonRaphsonSolver::new(config);
    let root = newton
        .find_root_bounded(f, f_prime, 4.0, -5.0, 5.0)
        .or_else(|_| BrentSolver::new(config).find_root(f, -5.0, 5.0))
        .unwrap();
    assert_relative_eq!(root, 0.5_f64.tan(), epsilon = 1e-8);
}

#[test]
fn test_types_exports() {
    use cashopt_core::schedule::SettlementSchedule;
    use cashopt_core::types::{time_to_expiry, CollateralAsset, PricingError, MS_PER_DAY};

    assert_relative_eq!(time_to_expiry(0, 73 * MS_PER_DAY), 0.2, epsilon = 1e-12);
    assert_eq!(CollateralAsset::Underlying.to_base_units(1.0), 100_000_000);
    assert_eq!(SettlementSchedule::default().cutoff_hour_utc, 8);

    let err = PricingError::InvalidInput("strike".to_string());
    assert!(err.to_string().contains("strike"));
}
