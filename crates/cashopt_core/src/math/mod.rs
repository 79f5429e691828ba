//! Numerical primitives.
//!
//! - [`distributions`]: Gaussian CDF and PDF
//! - [`solvers`]: Newton-Raphson and Brent root finders

pub mod distributions;
pub mod solvers;

pub use distributions::{norm_cdf, norm_pdf};
