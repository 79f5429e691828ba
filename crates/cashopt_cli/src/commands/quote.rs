//! Quote command implementation
//!
//! Prices contracts at the configured rate and volatility. Without explicit
//! strikes the default ladder around the spot is quoted.

use cashopt_engine::analytics::strike_ladder;
use cashopt_engine::config::EngineConfig;
use cashopt_engine::contract::{ContractKey, OptionKind};
use cashopt_engine::pricing::{quote_batch, vega, PriceOutcome, QuoteRequest};
use serde::Serialize;
use tracing::info;

use super::{days_to_ms, emit, fmt_num, OutputFormat, TableRow};
use crate::{CliError, Result};

/// One quoted contract
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteRow {
    pub kind: OptionKind,
    pub strike: f64,
    pub time_to_expiry: f64,
    pub volatility: f64,
    pub price: PriceOutcome,
    pub vega: f64,
    pub implied_vol: Option<f64>,
}

impl TableRow for QuoteRow {
    fn headers() -> &'static [&'static str] {
        &["Kind", "Strike", "T (years)", "Vol", "Price", "Vega", "Implied Vol"]
    }

    fn cells(&self) -> Vec<String> {
        let price = match &self.price {
            PriceOutcome::Priced(value) => fmt_num(*value),
            PriceOutcome::Unpriceable(reason) => format!("unpriceable ({})", reason),
        };
        vec![
            self.kind.to_string(),
            format!("{:.2}", self.strike),
            fmt_num(self.time_to_expiry),
            format!("{:.4}", self.volatility),
            price,
            fmt_num(self.vega),
            self.implied_vol.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string()),
        ]
    }
}

/// Quote `kinds` at every strike, `days` from `now_ms`
pub fn compute(
    config: &EngineConfig,
    kinds: &[OptionKind],
    spot: f64,
    strikes: &[f64],
    days: f64,
    now_ms: i64,
) -> Result<Vec<QuoteRow>> {
    if !(spot.is_finite() && spot >= 0.0) {
        return Err(CliError::InvalidArgument(format!("spot must be a non-negative price, got {}", spot)));
    }
    if !days.is_finite() {
        return Err(CliError::InvalidArgument(format!("days must be finite, got {}", days)));
    }

    let strikes = if strikes.is_empty() {
        strike_ladder(spot)
    } else {
        strikes.to_vec()
    };
    let maturity_ms = now_ms
        .checked_add(days_to_ms(days))
        .ok_or_else(|| CliError::InvalidArgument(format!("days out of range: {}", days)))?;

    let requests: Vec<QuoteRequest> = kinds
        .iter()
        .flat_map(|&kind| {
            strikes.iter().map(move |&strike| QuoteRequest {
                contract: ContractKey::new(kind, strike, maturity_ms),
                spot,
                now_ms,
            })
        })
        .collect();

    let market = &config.market;
    let quotes = quote_batch(&requests, market, &config.implied_vol);

    Ok(quotes
        .into_iter()
        .map(|q| QuoteRow {
            kind: q.contract.kind,
            strike: q.contract.strike(),
            time_to_expiry: q.time_to_expiry,
            volatility: market.default_volatility,
            vega: vega(
                spot,
                q.contract.strike(),
                market.risk_free_rate,
                market.default_volatility,
                q.time_to_expiry,
            ),
            price: q.price,
            implied_vol: q.implied_vol,
        })
        .collect())
}

/// Run the quote command
pub fn run(
    config: &EngineConfig,
    kind: Option<OptionKind>,
    spot: f64,
    strikes: &[f64],
    days: f64,
    now_ms: i64,
    format: OutputFormat,
) -> Result<()> {
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => vec![OptionKind::Call, OptionKind::Put],
    };
    info!(
        spot,
        days,
        rate = config.market.risk_free_rate,
        vol = config.market.default_volatility,
        "Quoting"
    );
    let rows = compute(config, &kinds, spot, strikes, days, now_ms)?;
    emit(&rows, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_quote() {
        let rows = compute(&EngineConfig::default(), &[OptionKind::Call, OptionKind::Put], 18.0, &[18.0], 30.0, 0).unwrap();
        assert_eq!(rows.len(), 2);
        assert_relative_eq!(rows[0].price.value_or_zero(), 1.5734, epsilon = 1e-3);
        assert_relative_eq!(rows[1].price.value_or_zero(), 1.5033, epsilon = 1e-3);
        assert_relative_eq!(rows[0].implied_vol.unwrap(), 0.75, epsilon = 1e-3);
        assert!(rows[0].vega > 0.0);
    }

    #[test]
    fn test_default_ladder() {
        let rows = compute(&EngineConfig::default(), &[OptionKind::Call], 18.3, &[], 7.0, 0).unwrap();
        let strikes: Vec<f64> = rows.iter().map(|r| r.strike).collect();
        assert_eq!(strikes, vec![16.5, 17.0, 17.5, 18.0, 18.5, 19.0, 19.5]);
        assert!(rows.windows(2).all(|w| w[1].price.value_or_zero() <= w[0].price.value_or_zero()));
    }

    #[test]
    fn test_expired_quote_is_intrinsic() {
        let rows = compute(&EngineConfig::default(), &[OptionKind::Put], 15.0, &[18.0], 0.0, 0).unwrap();
        assert_eq!(rows[0].price, PriceOutcome::Priced(3.0));
        assert_eq!(rows[0].implied_vol, None);
        assert_eq!(rows[0].vega, 0.0);
    }

    #[test]
    fn test_rejects_bad_spot() {
        assert!(compute(&EngineConfig::default(), &[OptionKind::Call], f64::NAN, &[18.0], 1.0, 0).is_err());
    }

    #[test]
    fn test_rejects_days_past_the_timestamp_range() {
        let config = EngineConfig::default();
        let result = compute(&config, &[OptionKind::Call], 18.0, &[18.0], 1e300, 1_675_411_200_000);
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
        let result = compute(&config, &[OptionKind::Call], 18.0, &[18.0], -1e300, -1);
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_table_cells() {
        let rows = compute(&EngineConfig::default(), &[OptionKind::Call], 18.0, &[18.0], 30.0, 0).unwrap();
        let cells = rows[0].cells();
        assert_eq!(cells.len(), QuoteRow::headers().len());
        assert_eq!(cells[0], "CALL");
        assert_eq!(cells[1], "18.00");
    }
}
