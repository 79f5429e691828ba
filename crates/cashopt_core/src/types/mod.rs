//! Core value types.
//!
//! This module provides:
//! - `asset`: Collateral assets and base-unit conversion
//! - `time`: Millisecond timestamps and year fractions
//! - `error`: Structured error types for pricing and solver operations
//!
//! # Re-exports
//!
//! - [`CollateralAsset`] from `asset`
//! - [`time_to_expiry`], [`MS_PER_DAY`] from `time`
//! - [`PricingError`], [`SolverError`] from `error`

pub mod asset;
pub mod error;
pub mod time;

pub use asset::CollateralAsset;
pub use error::{PricingError, SolverError};
pub use time::{time_to_expiry, MS_PER_DAY};
