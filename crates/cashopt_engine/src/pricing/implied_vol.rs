//! Implied volatility: the σ at which the pricer reproduces an observed price.
//!
//! The default strategy takes Newton steps on analytic vega from the
//! configured initial guess. Newton is fast near the root but can stall on a
//! flat vega or jump outside the search bounds; either way the solve falls
//! back to Brent's method on `[lower_bound, upper_bound]`, which always
//! converges once the observed price lies between the model prices at the
//! two bounds. Every path is capped at `max_iterations`.

use cashopt_core::math::solvers::{BrentSolver, NewtonRaphsonSolver, SolverConfig};
use cashopt_core::types::SolverError;

use super::black_scholes::BlackScholes;
use super::error::ImpliedVolError;
use crate::config::{ImpliedVolConfig, ImpliedVolMethod};
use crate::contract::OptionKind;

/// Divisor of the pricing error in the fixed-step update.
const FIXED_STEP_DIVISOR: f64 = 100.0;

/// Volatility resolution requested from Brent, independent of the price tolerance.
const BRACKET_TOLERANCE: f64 = 1e-10;

/// Newton keeps stepping until σ moves less than this, even inside the price tolerance.
const NEWTON_STEP_TOLERANCE: f64 = 1e-8;

/// Solves for the volatility that reproduces `observed`.
///
/// # Errors
///
/// - [`ImpliedVolError::InvalidConfig`] if `config` fails validation
/// - [`ImpliedVolError::InvalidPrice`] if `observed` is negative or not finite
/// - [`ImpliedVolError::Expired`] if `expiry <= 0`
/// - [`ImpliedVolError::PriceOutOfRange`] if no σ within the bounds fits
/// - [`ImpliedVolError::NonConvergent`] if the iteration cap is reached
///
/// # Examples
/// ```
/// use cashopt_engine::config::ImpliedVolConfig;
/// use cashopt_engine::contract::OptionKind;
/// use cashopt_engine::pricing::{implied_vol, price};
///
/// let t = 30.0 / 365.0;
/// let observed = price(OptionKind::Call, 18.0, 18.0, 0.0475, 0.75, t);
/// let sigma = implied_vol(observed, OptionKind::Call, 18.0, 18.0, 0.0475, t, &ImpliedVolConfig::default()).unwrap();
/// assert!((sigma - 0.75).abs() < 1e-3);
/// ```
pub fn implied_vol(
    observed: f64,
    kind: OptionKind,
    spot: f64,
    strike: f64,
    rate: f64,
    expiry: f64,
    config: &ImpliedVolConfig,
) -> Result<f64, ImpliedVolError> {
    config
        .validate()
        .map_err(|err| ImpliedVolError::InvalidConfig(err.to_string()))?;

    if !observed.is_finite() || observed < 0.0 {
        return Err(ImpliedVolError::InvalidPrice { price: observed });
    }
    if expiry.is_nan() || expiry <= 0.0 {
        return Err(ImpliedVolError::Expired {
            time_to_expiry: expiry,
        });
    }

    let problem = Problem {
        observed,
        kind,
        strike,
        expiry,
        model: BlackScholes::new(spot, rate, config.initial_guess),
        config,
    };

    match config.method {
        ImpliedVolMethod::NewtonWithBisection => problem.newton().or_else(|err| {
            tracing::debug!(error = %err, "newton failed, falling back to bracketing");
            problem.bracketed()
        }),
        ImpliedVolMethod::Bisection => problem.bracketed(),
        ImpliedVolMethod::FixedStep => problem.fixed_step(),
    }
}

struct Problem<'a> {
    observed: f64,
    kind: OptionKind,
    strike: f64,
    expiry: f64,
    model: BlackScholes,
    config: &'a ImpliedVolConfig,
}

impl Problem<'_> {
    fn model_price(&self, sigma: f64) -> f64 {
        self.model
            .with_volatility(sigma)
            .quote(self.kind, self.strike, self.expiry)
            .value()
            .unwrap_or(f64::NAN)
    }

    fn objective(&self, sigma: f64) -> f64 {
        self.model_price(sigma) - self.observed
    }

    fn solver_config(&self, tolerance: f64) -> SolverConfig<f64> {
        SolverConfig {
            tolerance,
            max_iterations: self.config.max_iterations,
        }
    }

    fn newton(&self) -> Result<f64, SolverError> {
        let config = self.config;
        let solver = NewtonRaphsonSolver::new(self.solver_config(config.tolerance))
            .with_step_tolerance(NEWTON_STEP_TOLERANCE);
        let x0 = config.initial_guess.clamp(config.lower_bound, config.upper_bound);

        solver.find_root_bounded(
            |sigma| self.objective(sigma),
            |sigma| self.model.with_volatility(sigma).vega(self.strike, self.expiry),
            x0,
            config.lower_bound,
            config.upper_bound,
        )
    }

    fn bracketed(&self) -> Result<f64, ImpliedVolError> {
        let config = self.config;
        let (lo, hi) = (config.lower_bound, config.upper_bound);
        let floor = self.model_price(lo);
        let cap = self.model_price(hi);

        let out_of_range = || ImpliedVolError::PriceOutOfRange {
            price: self.observed,
            lower: floor,
            upper: cap,
        };

        if !(floor.is_finite() && cap.is_finite()) {
            return Err(out_of_range());
        }
        if self.observed < floor {
            return if floor - self.observed <= config.tolerance {
                Ok(lo)
            } else {
                Err(out_of_range())
            };
        }
        if self.observed > cap {
            return if self.observed - cap <= config.tolerance {
                Ok(hi)
            } else {
                Err(out_of_range())
            };
        }

        let brent_tolerance = config.tolerance.min(BRACKET_TOLERANCE);
        BrentSolver::new(self.solver_config(brent_tolerance))
            .find_root(|sigma| self.objective(sigma), lo, hi)
            .map_err(|err| match err {
                SolverError::MaxIterationsExceeded { iterations } => {
                    tracing::warn!(iterations, observed = self.observed, "implied vol did not converge");
                    ImpliedVolError::NonConvergent { iterations }
                }
                SolverError::NoBracket { .. } => out_of_range(),
                other => ImpliedVolError::Solver(other),
            })
    }

    fn fixed_step(&self) -> Result<f64, ImpliedVolError> {
        let config = self.config;
        let mut sigma = config.initial_guess;

        for _ in 0..config.max_iterations {
            let diff = self.observed - self.model.with_volatility(sigma).price(self.kind, self.strike, self.expiry);
            if diff.abs() <= config.tolerance {
                return Ok(sigma);
            }
            sigma += diff / FIXED_STEP_DIVISOR;
        }

        tracing::warn!(
            iterations = config.max_iterations,
            last_sigma = sigma,
            "fixed-step implied vol did not converge"
        );
        Err(ImpliedVolError::NonConvergent {
            iterations: config.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::price;
    use approx::assert_relative_eq;

    const S: f64 = 18.0;
    const R: f64 = 0.0475;
    const T: f64 = 30.0 / 365.0;

    fn solve(observed: f64, kind: OptionKind, strike: f64, config: &ImpliedVolConfig) -> Result<f64, ImpliedVolError> {
        implied_vol(observed, kind, S, strike, R, T, config)
    }

    #[test]
    fn test_round_trip_reference() {
        let observed = price(OptionKind::Call, S, 18.0, R, 0.75, T);
        let sigma = solve(observed, OptionKind::Call, 18.0, &ImpliedVolConfig::default()).unwrap();
        assert_relative_eq!(sigma, 0.75, epsilon = 1e-3);
    }

    #[test]
    fn test_round_trip_all_methods() {
        let base = ImpliedVolConfig::default().with_max_iterations(2_000);
        for method in [
            ImpliedVolMethod::NewtonWithBisection,
            ImpliedVolMethod::Bisection,
            ImpliedVolMethod::FixedStep,
        ] {
            let config = base.with_method(method);
            for (kind, strike) in [(OptionKind::Call, 18.5), (OptionKind::Put, 17.5)] {
                let observed = price(kind, S, strike, R, 0.6, T);
                let sigma = solve(observed, kind, strike, &config).unwrap();
                assert_relative_eq!(sigma, 0.6, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_flat_vega_round_trip_recovers_volatility() {
        // Short-dated out of the money: prices this small meet the price
        // tolerance well before σ settles.
        let config = ImpliedVolConfig::default();
        for (kind, strike, sigma, days) in [
            (OptionKind::Put, 17.0, 0.15, 7.0),
            (OptionKind::Put, 17.5, 0.12, 3.0),
        ] {
            let expiry = days / 365.0;
            let observed = price(kind, S, strike, R, sigma, expiry);
            let solved = implied_vol(observed, kind, S, strike, R, expiry, &config).unwrap();
            assert_relative_eq!(solved, sigma, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_bisection_meets_price_tolerance() {
        let config = ImpliedVolConfig::default().with_method(ImpliedVolMethod::Bisection);
        let observed = price(OptionKind::Put, S, 19.0, R, 1.2, T);
        let sigma = solve(observed, OptionKind::Put, 19.0, &config).unwrap();
        let repriced = price(OptionKind::Put, S, 19.0, R, sigma, T);
        assert!((repriced - observed).abs() <= config.tolerance);
    }

    #[test]
    fn test_fixed_step_is_capped() {
        let config = ImpliedVolConfig::default().with_method(ImpliedVolMethod::FixedStep);
        let observed = price(OptionKind::Call, S, 18.0, R, 0.75, T);
        assert_eq!(
            solve(observed, OptionKind::Call, 18.0, &config),
            Err(ImpliedVolError::NonConvergent { iterations: 100 })
        );
    }

    #[test]
    fn test_newton_overshoot_falls_back() {
        // Deep out of the money: vega at the initial guess is tiny, so the
        // first Newton step leaves the bounds.
        let observed = price(OptionKind::Call, S, 24.0, R, 0.9, T);
        let sigma = solve(observed, OptionKind::Call, 24.0, &ImpliedVolConfig::default()).unwrap();
        let repriced = price(OptionKind::Call, S, 24.0, R, sigma, T);
        assert!((repriced - observed).abs() <= 1e-4);
    }

    #[test]
    fn test_price_above_attainable_range() {
        let err = solve(S + 1.0, OptionKind::Call, 18.0, &ImpliedVolConfig::default()).unwrap_err();
        assert!(matches!(err, ImpliedVolError::PriceOutOfRange { price, .. } if price == S + 1.0));
    }

    #[test]
    fn test_price_below_intrinsic() {
        // An in-the-money call cannot trade below its discounted intrinsic value.
        let err = solve(0.5, OptionKind::Call, 16.0, &ImpliedVolConfig::default()).unwrap_err();
        assert!(matches!(err, ImpliedVolError::PriceOutOfRange { .. }));
    }

    #[test]
    fn test_invalid_inputs() {
        let config = ImpliedVolConfig::default();
        assert_eq!(
            solve(-1.0, OptionKind::Call, 18.0, &config),
            Err(ImpliedVolError::InvalidPrice { price: -1.0 })
        );
        assert!(matches!(
            solve(f64::NAN, OptionKind::Call, 18.0, &config),
            Err(ImpliedVolError::InvalidPrice { .. })
        ));
        assert_eq!(
            implied_vol(1.0, OptionKind::Call, S, 18.0, R, 0.0, &config),
            Err(ImpliedVolError::Expired { time_to_expiry: 0.0 })
        );
        assert!(matches!(
            solve(1.0, OptionKind::Call, 18.0, &config.with_tolerance(0.0)),
            Err(ImpliedVolError::InvalidConfig(_))
        ));
    }
}
