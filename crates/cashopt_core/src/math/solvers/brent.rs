//! Brent's method root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;

/// Brent's method root finder.
///
/// Keeps a bracket `[b, c]` with a sign change and at each step picks
/// inverse quadratic interpolation, a secant step, or plain bisection,
/// falling back to bisection whenever the interpolated step would not shrink
/// the bracket fast enough. Needs no derivative and cannot leave the bracket.
///
/// # Example
///
/// ```
/// use cashopt_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
/// let f = |x: f64| x * x * x - x - 2.0;
///
/// let root = solver.find_root(f, 1.0, 2.0).unwrap();
/// assert!(f(root).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver<T: Float> {
    config: SolverConfig<T>,
}

impl<T: Float> BrentSolver<T> {
    /// Create a solver with the given configuration.
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SolverConfig::default())
    }

    /// Find a root of `f` inside `[a, b]`.
    ///
    /// Returns as soon as `|f(x)| < tolerance` or the bracket half-width drops
    /// below `tolerance`.
    ///
    /// # Errors
    ///
    /// * `SolverError::NoBracket` - `f(a)` and `f(b)` have the same sign
    /// * `SolverError::NumericalInstability` - `f` returned NaN at an endpoint
    /// * `SolverError::MaxIterationsExceeded` - cap reached first
    pub fn find_root<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        let two = T::one() + T::one();
        let three = two + T::one();
        let tol = self.config.tolerance;

        let (mut a, mut b) = (a, b);
        let (mut fa, mut fb) = (f(a), f(b));

        if fa.is_nan() || fb.is_nan() {
            return Err(SolverError::NumericalInstability(
                "objective is NaN at a bracket endpoint".to_string(),
            ));
        }
        if fa.abs() < tol {
            return Ok(a);
        }
        if fb.abs() < tol {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(SolverError::NoBracket {
                a: a.to_f64().unwrap_or(f64::NAN),
                b: b.to_f64().unwrap_or(f64::NAN),
            });
        }

        // c is the contrapoint: f(b) and f(c) always straddle zero.
        let (mut c, mut fc) = (a, fa);
        let mut step = b - a;
        let mut prev_step = step;

        for _ in 0..self.config.max_iterations {
            if fb.signum() == fc.signum() {
                c = a;
                fc = fa;
                step = b - a;
                prev_step = step;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let half = (c - b) / two;
            if fb.abs() < tol || half.abs() <= tol {
                return Ok(b);
            }

            let mut bisect = true;
            if prev_step.abs() >= tol && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (p, q) = if a == c {
                    // secant
                    (two * half * s, T::one() - s)
                } else {
                    // inverse quadratic interpolation
                    let q = fa / fc;
                    let r = fb / fc;
                    (
                        s * (two * half * q * (q - r) - (b - a) * (r - T::one())),
                        (q - T::one()) * (r - T::one()) * (s - T::one()),
                    )
                };
                let (p, q) = if p > T::zero() { (p, -q) } else { (-p, q) };

                let limit_interp = three * half * q - (tol * q).abs();
                let limit_prev = (prev_step * q).abs();
                if two * p < limit_interp.min(limit_prev) {
                    prev_step = step;
                    step = p / q;
                    bisect = false;
                }
            }
            if bisect {
                step = half;
                prev_step = half;
            }

            a = b;
            fa = fb;
            b = if step.abs() > tol {
                b + step
            } else if half > T::zero() {
                b + tol
            } else {
                b - tol
            };
            fb = f(b);
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }

    /// Returns the solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }
}
