//! # cashopt_core: Numerical Foundation for the Option Engine
//!
//! ## Layer 1 (Foundation) Role
//!
//! cashopt_core is the bottom layer of the workspace, providing:
//! - Standard normal distribution functions (`math::distributions`)
//! - Root-finding solvers with bounded iteration (`math::solvers`)
//! - Collateral assets and base-unit conversion (`types::asset`)
//! - Millisecond timestamps and year fractions (`types::time`)
//! - The daily settlement cutoff rules (`schedule`)
//! - Error types: `PricingError`, `SolverError` (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other cashopt_* crates, with minimal external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - chrono: UTC timestamps and cutoff arithmetic
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use cashopt_core::math::distributions::norm_cdf;
//! use cashopt_core::types::time::time_to_expiry;
//!
//! // Thirty days out, in years
//! let t = time_to_expiry(0, 30 * 86_400_000);
//! assert!((t - 30.0 / 365.0).abs() < 1e-12);
//!
//! assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-7);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for assets, errors and schedule types

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod math;
pub mod schedule;
pub mod types;
