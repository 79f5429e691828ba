//! Closed-form pricing and implied volatility.
//!
//! This module provides:
//! - Black-Scholes prices as a tagged [`PriceOutcome`], plus the zero-on-failure
//!   [`price`] shortcut
//! - Analytic vega
//! - Implied volatility with Newton, bracketing and capped fixed-step methods
//! - Fair-value quotes for contracts, singly or in parallel batches

pub mod black_scholes;
pub mod error;
pub mod fair_value;
pub mod implied_vol;

// Re-export main types at module level
pub use black_scholes::{price, quote, vega, BlackScholes, PriceOutcome, UnpriceableReason};
pub use error::ImpliedVolError;
pub use fair_value::{quote_batch, quote_contract, Quote, QuoteRequest};
pub use implied_vol::implied_vol;
