//! Fair-value quotes for contracts at a point in time.

use rayon::prelude::*;

use super::black_scholes::{BlackScholes, PriceOutcome};
use super::error::ImpliedVolError;
use super::implied_vol::implied_vol;
use crate::config::{ImpliedVolConfig, MarketParams};
use crate::contract::ContractKey;

/// A contract to quote against a spot observation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuoteRequest {
    /// Contract to quote.
    pub contract: ContractKey,
    /// Spot price of the underlying.
    pub spot: f64,
    /// Valuation time, UTC milliseconds.
    pub now_ms: i64,
}

/// Fair value and the volatility implied by it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Quote {
    /// Contract quoted.
    pub contract: ContractKey,
    /// Years to maturity at valuation time.
    pub time_to_expiry: f64,
    /// Fair value at the default volatility.
    pub price: PriceOutcome,
    /// Volatility recovered from `price`, when one exists.
    pub implied_vol: Option<f64>,
}

impl Quote {
    /// Fair value or 0.
    pub fn value_or_zero(&self) -> f64 {
        self.price.value_or_zero()
    }
}

/// Quotes one contract.
///
/// The price uses `market.default_volatility`; the implied volatility is
/// then solved back from that price, so it only differs from the default
/// when the solver cannot recover it (expired contracts, for instance).
///
/// # Examples
/// ```
/// use cashopt_engine::config::{ImpliedVolConfig, MarketParams};
/// use cashopt_engine::contract::{ContractKey, OptionKind};
/// use cashopt_engine::pricing::{quote_contract, QuoteRequest};
///
/// let day = 86_400_000;
/// let request = QuoteRequest {
///     contract: ContractKey::new(OptionKind::Call, 18.0, 30 * day),
///     spot: 18.0,
///     now_ms: 0,
/// };
/// let quote = quote_contract(&request, &MarketParams::default(), &ImpliedVolConfig::default());
/// assert!((quote.value_or_zero() - 1.57).abs() < 0.02);
/// assert!((quote.implied_vol.unwrap() - 0.75).abs() < 1e-3);
/// ```
pub fn quote_contract(
    request: &QuoteRequest,
    market: &MarketParams,
    iv_config: &ImpliedVolConfig,
) -> Quote {
    let contract = request.contract;
    let strike = contract.strike();
    let expiry = cashopt_core::types::time_to_expiry(request.now_ms, contract.maturity_ms);

    let model = BlackScholes::new(request.spot, market.risk_free_rate, market.default_volatility);
    let price = model.quote(contract.kind, strike, expiry);

    let solved = price.value().and_then(|value| {
        implied_vol(
            value,
            contract.kind,
            request.spot,
            strike,
            market.risk_free_rate,
            expiry,
            iv_config,
        )
        .inspect_err(|err| log_unsolved(&contract, err))
        .ok()
    });

    Quote {
        contract,
        time_to_expiry: expiry,
        price,
        implied_vol: solved,
    }
}

fn log_unsolved(contract: &ContractKey, err: &ImpliedVolError) {
    match err {
        ImpliedVolError::Expired { .. } => {}
        _ => tracing::debug!(?contract, error = %err, "no implied vol for quote"),
    }
}

/// Quotes many contracts in parallel, preserving input order.
pub fn quote_batch(
    requests: &[QuoteRequest],
    market: &MarketParams,
    iv_config: &ImpliedVolConfig,
) -> Vec<Quote> {
    requests
        .par_iter()
        .map(|request| quote_contract(request, market, iv_config))
        .collect()
}
