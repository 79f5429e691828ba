//! Newton-Raphson root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;

/// Newton-Raphson root finder.
///
/// Iterates `x_{n+1} = x_n - f(x_n) / f'(x_n)`. Converges quadratically near
/// a simple root but can stall on a flat derivative or overshoot from a poor
/// starting point; [`find_root_bounded`](Self::find_root_bounded) reports the
/// overshoot instead of following it.
///
/// # Example
///
/// ```
/// use cashopt_core::math::solvers::{NewtonRaphsonSolver, SolverConfig};
///
/// let solver = NewtonRaphsonSolver::new(SolverConfig::default());
/// let f = |x: f64| x * x * x - x - 2.0;
/// let f_prime = |x: f64| 3.0 * x * x - 1.0;
///
/// let root = solver.find_root(f, f_prime, 1.5).unwrap();
/// assert!(f(root).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct NewtonRaphsonSolver<T: Float> {
    config: SolverConfig<T>,
    step_tolerance: Option<T>,
}

impl<T: Float> NewtonRaphsonSolver<T> {
    /// Create a solver with the given configuration.
    pub fn new(config: SolverConfig<T>) -> Self {
        Self {
            config,
            step_tolerance: None,
        }
    }

    /// Keep refining after `|f(x)| < tolerance` until the Newton step is
    /// also below `step_tolerance`.
    ///
    /// Useful where `f` is flat near the root, so a residual within tolerance
    /// still leaves `x` far from it. Once the residual test has passed, a
    /// refinement step that fails (flat derivative, leaving the bounds,
    /// running out of iterations) returns the last iterate that passed it
    /// instead of an error.
    ///
    /// # Example
    ///
    /// ```
    /// use cashopt_core::math::solvers::{NewtonRaphsonSolver, SolverConfig};
    ///
    /// let f = |x: f64| 1e-6 * (x - 2.0);
    /// let f_prime = |_: f64| 1e-6;
    /// let config = SolverConfig::new(1e-4, 50);
    ///
    /// assert_eq!(NewtonRaphsonSolver::new(config).find_root(f, f_prime, 0.0).unwrap(), 0.0);
    ///
    /// let refined = NewtonRaphsonSolver::new(config).with_step_tolerance(1e-10);
    /// assert!((refined.find_root(f, f_prime, 0.0).unwrap() - 2.0).abs() < 1e-10);
    /// ```
    pub fn with_step_tolerance(self, step_tolerance: T) -> Self {
        Self {
            step_tolerance: Some(step_tolerance),
            ..self
        }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SolverConfig::default())
    }

    /// Find a root of `f` from `x0` using the explicit derivative `f_prime`.
    ///
    /// # Errors
    ///
    /// * `SolverError::MaxIterationsExceeded` - tolerance not met within the cap
    /// * `SolverError::DerivativeNearZero` - `|f'(x)|` fell below 1e-30
    /// * `SolverError::NumericalInstability` - an iterate became non-finite
    pub fn find_root<F, G>(&self, f: F, f_prime: G, x0: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
        G: Fn(T) -> T,
    {
        self.iterate(f, f_prime, x0, None)
    }

    /// Like [`find_root`](Self::find_root), but every iterate must stay inside
    /// `[lower, upper]`.
    ///
    /// # Errors
    ///
    /// Everything `find_root` returns, plus `SolverError::OutOfBounds` as soon
    /// as an update lands outside the interval.
    ///
    /// # Example
    ///
    /// ```
    /// use cashopt_core::math::solvers::{NewtonRaphsonSolver, SolverConfig};
    /// use cashopt_core::types::SolverError;
    ///
    /// let solver = NewtonRaphsonSolver::new(SolverConfig::default());
    ///
    /// // The first step from 0.5 jumps to 2.25, past the upper bound.
    /// let result = solver.find_root(|x: f64| x * x - 2.0, |x| 2.0 * x, 0.5);
    /// assert!(result.is_ok());
    /// let bounded = solver.find_root_bounded(|x: f64| x * x - 2.0, |x| 2.0 * x, 0.5, 0.1, 2.0);
    /// assert!(matches!(bounded, Err(SolverError::OutOfBounds { .. })));
    /// ```
    pub fn find_root_bounded<F, G>(
        &self,
        f: F,
        f_prime: G,
        x0: T,
        lower: T,
        upper: T,
    ) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
        G: Fn(T) -> T,
    {
        self.iterate(f, f_prime, x0, Some((lower, upper)))
    }

    fn iterate<F, G>(&self, f: F, f_prime: G, x0: T, bounds: Option<(T, T)>) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
        G: Fn(T) -> T,
    {
        let epsilon = T::from(1e-30).unwrap_or_else(T::min_positive_value);
        let mut x = x0;
        // Last iterate whose residual met the tolerance.
        let mut accepted: Option<T> = None;

        for _ in 0..self.config.max_iterations {
            let f_val = f(x);
            let converged = f_val.abs() < self.config.tolerance;
            if converged {
                if self.step_tolerance.is_none() {
                    return Ok(x);
                }
                accepted = Some(x);
            }

            let slope = f_prime(x);
            if slope.is_nan() || slope.abs() < epsilon {
                return accepted.ok_or_else(|| SolverError::DerivativeNearZero { x: to_f64(x) });
            }

            let step = f_val / slope;
            if converged && self.step_tolerance.is_some_and(|tol| step.abs() < tol) {
                return Ok(x);
            }
            x = x - step;

            if !x.is_finite() {
                return accepted.ok_or_else(|| {
                    SolverError::NumericalInstability("Newton iteration produced non-finite value".to_string())
                });
            }
            if let Some((lower, upper)) = bounds {
                if x < lower || x > upper {
                    return accepted.ok_or_else(|| SolverError::OutOfBounds {
                        x: to_f64(x),
                        lower: to_f64(lower),
                        upper: to_f64(upper),
                    });
                }
            }
        }

        accepted.ok_or(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }

    /// Returns the solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }
}

fn to_f64<T: Float>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}
