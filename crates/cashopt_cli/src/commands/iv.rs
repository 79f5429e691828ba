//! Implied volatility command implementation

use cashopt_core::types::time::time_to_expiry;
use cashopt_engine::config::{EngineConfig, ImpliedVolMethod};
use cashopt_engine::contract::OptionKind;
use cashopt_engine::pricing::{implied_vol, price};
use serde::Serialize;
use tracing::info;

use super::{days_to_ms, emit, fmt_num, OutputFormat, TableRow};
use crate::Result;

/// Solved volatility for one observed price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpliedVolRow {
    pub kind: OptionKind,
    pub observed: f64,
    pub strike: f64,
    pub time_to_expiry: f64,
    pub method: ImpliedVolMethod,
    pub implied_vol: f64,
    pub repriced: f64,
}

impl TableRow for ImpliedVolRow {
    fn headers() -> &'static [&'static str] {
        &["Kind", "Observed", "Strike", "T (years)", "Method", "Implied Vol", "Repriced"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.kind.to_string(),
            fmt_num(self.observed),
            format!("{:.2}", self.strike),
            fmt_num(self.time_to_expiry),
            self.method.to_string(),
            format!("{:.6}", self.implied_vol),
            fmt_num(self.repriced),
        ]
    }
}

/// Solve the volatility that reproduces `observed`
pub fn compute(
    config: &EngineConfig,
    kind: OptionKind,
    observed: f64,
    spot: f64,
    strike: f64,
    days: f64,
) -> Result<ImpliedVolRow> {
    let expiry = time_to_expiry(0, days_to_ms(days));
    let rate = config.market.risk_free_rate;
    let iv_config = &config.implied_vol;

    let sigma = implied_vol(observed, kind, spot, strike, rate, expiry, iv_config)?;
    Ok(ImpliedVolRow {
        kind,
        observed,
        strike,
        time_to_expiry: expiry,
        method: iv_config.method,
        implied_vol: sigma,
        repriced: price(kind, spot, strike, rate, sigma, expiry),
    })
}

/// Run the iv command
pub fn run(
    config: &EngineConfig,
    kind: OptionKind,
    observed: f64,
    spot: f64,
    strike: f64,
    days: f64,
    format: OutputFormat,
) -> Result<()> {
    info!(
        method = %config.implied_vol.method,
        max_iterations = config.implied_vol.max_iterations,
        days,
        "Solving implied volatility"
    );
    let row = compute(config, kind, observed, spot, strike, days)?;
    emit(&[row], format)
}
