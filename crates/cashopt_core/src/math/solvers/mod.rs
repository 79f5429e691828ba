//! Root-finding solvers with a hard iteration cap.
//!
//! Every solver here terminates: either it meets its tolerance or it returns
//! [`SolverError::MaxIterationsExceeded`](crate::types::SolverError) after
//! `max_iterations` steps. The implied-volatility solver in the engine is
//! built on top of them.
//!
//! ## Available Solvers
//!
//! - [`NewtonRaphsonSolver`]: quadratic convergence given an analytic derivative,
//!   optionally confined to a bracket
//! - [`BrentSolver`]: bracketing method, no derivative needed, guaranteed to
//!   converge on a continuous function with a sign change
//!
//! ## Configuration
//!
//! Both use [`SolverConfig`]:
//! - `tolerance`: stop when `|f(x)| < tolerance` (default: 1e-10)
//! - `max_iterations`: iteration cap (default: 100)
//!
//! ## Example
//!
//! ```
//! use cashopt_core::math::solvers::{BrentSolver, NewtonRaphsonSolver, SolverConfig};
//!
//! let f = |x: f64| x * x - 2.0;
//!
//! let newton = NewtonRaphsonSolver::new(SolverConfig::default());
//! let root = newton.find_root(f, |x| 2.0 * x, 1.0).unwrap();
//! assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
//!
//! let brent = BrentSolver::new(SolverConfig::default());
//! let root = brent.find_root(f, 0.0, 2.0).unwrap();
//! assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
//! ```

mod brent;
mod config;
mod newton_raphson;

pub use brent::BrentSolver;
pub use config::SolverConfig;
pub use newton_raphson::NewtonRaphsonSolver;
