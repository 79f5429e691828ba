//! Solver configuration types.

use num_traits::Float;

/// Configuration shared by the root finders.
///
/// # Example
///
/// ```
/// use cashopt_core::math::solvers::SolverConfig;
///
/// let config: SolverConfig<f64> = SolverConfig::default();
/// assert_eq!(config.max_iterations, 100);
///
/// let loose = SolverConfig::new(1e-4, 50);
/// assert_eq!(loose.max_iterations, 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig<T: Float> {
    /// The solver stops when `|f(x)| < tolerance`.
    pub tolerance: T,

    /// Iterations attempted before returning `SolverError::MaxIterationsExceeded`.
    pub max_iterations: usize,
}

impl<T: Float> Default for SolverConfig<T> {
    /// `tolerance = 1e-10`, `max_iterations = 100`.
    fn default() -> Self {
        Self {
            tolerance: T::from(1e-10).unwrap_or_else(T::epsilon),
            max_iterations: 100,
        }
    }
}

impl<T: Float> SolverConfig<T> {
    /// Create a configuration with the given tolerance and iteration cap.
    ///
    /// # Panics
    ///
    /// Panics if `tolerance <= 0` or `max_iterations == 0`. Callers building
    /// a config from user input should validate first.
    pub fn new(tolerance: T, max_iterations: usize) -> Self {
        assert!(tolerance > T::zero(), "tolerance must be positive");
        assert!(max_iterations > 0, "max_iterations must be > 0");
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Same configuration with a different iteration cap.
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self::new(self.tolerance, max_iterations)
    }
}
