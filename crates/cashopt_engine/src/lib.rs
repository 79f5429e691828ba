//! # Cashopt Engine
//!
//! Pricing and lifecycle engine for cash-settled options on a single
//! underlying.
//!
//! This crate provides:
//! - Black-Scholes fair values with a tagged priced/unpriceable outcome
//! - Implied volatility with bounded Newton, Brent and capped fixed-step solvers
//! - Option records with a set-once settlement price and bounded consumption
//! - Moneyness and payouts that exhaust the pledged collateral
//! - Early closure of opposing positions found by structured key
//! - Call/put volume per maturity or strike, zero-filled for every requested key
//! - Decoding of indexer ownership rows into records
//!
//! ## Design Principles
//!
//! - **Pure functions**: no I/O, no clocks; the caller supplies the current
//!   time, spot and settlement prices
//! - **Explicit configuration**: rate, default volatility and solver settings
//!   travel in [`config::EngineConfig`] rather than globals
//! - **Total where it matters**: payouts, matching and aggregation never fail on
//!   well-formed records; pricing reports unpriceable inputs instead of panicking
//!
//! ## Example
//!
//! ```
//! use cashopt_engine::config::EngineConfig;
//! use cashopt_engine::contract::OptionKind;
//! use cashopt_engine::pricing::price;
//!
//! let config = EngineConfig::default();
//! let call = price(
//!     OptionKind::Call,
//!     18.0,
//!     18.0,
//!     config.market.risk_free_rate,
//!     config.market.default_volatility,
//!     30.0 / 365.0,
//! );
//! assert!((call - 1.57).abs() < 0.02);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytics;
pub mod config;
pub mod contract;
#[cfg(feature = "serde")]
pub mod indexer;
pub mod matching;
pub mod pricing;
pub mod records;
pub mod settlement;

pub use config::{EngineConfig, ImpliedVolConfig, ImpliedVolMethod, MarketParams};
pub use contract::{ContractKey, Direction, OptionKind, PositionKey, TokenName};
pub use records::{LifecycleError, LifecycleState, OptionRecord};
