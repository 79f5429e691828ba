//! Settle command implementation
//!
//! Classifies every record against a settlement price and computes what each
//! side is owed. Matured records are settled; records still live are shown as
//! a preview of the payout at that price.

use std::path::Path;

use cashopt_core::types::CollateralAsset;
use cashopt_engine::records::{LifecycleState, OptionRecord};
use cashopt_engine::settlement::{moneyness, payout, settle, Moneyness, SettlementPath};
use cashopt_engine::TokenName;
use serde::Serialize;
use tracing::{info, warn};

use super::{emit, fmt_num, read_records, OutputFormat, RecordFormat, TableRow};
use crate::Result;

/// Payout of one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettleRow {
    pub token: String,
    pub state: LifecycleState,
    pub moneyness: Moneyness,
    pub amount: u64,
    pub asset: CollateralAsset,
    pub quantity: f64,
    pub base_units: u64,
    pub value: f64,
    pub path: SettlementPath,
    pub preview: bool,
}

impl TableRow for SettleRow {
    fn headers() -> &'static [&'static str] {
        &["Token", "State", "Moneyness", "Amount", "Asset", "Quantity", "Value", "Path"]
    }

    fn cells(&self) -> Vec<String> {
        let path = match (self.path, self.preview) {
            (SettlementPath::Settlement, false) => "settlement",
            (SettlementPath::Disposal, false) => "disposal",
            (SettlementPath::Settlement, true) => "settlement (preview)",
            (SettlementPath::Disposal, true) => "disposal (preview)",
        };
        vec![
            self.token.clone(),
            format!("{:?}", self.state).to_lowercase(),
            self.moneyness.to_string(),
            self.amount.to_string(),
            self.asset.to_string(),
            fmt_num(self.quantity),
            fmt_num(self.value),
            path.to_string(),
        ]
    }
}

/// Settle or preview every record at `price`
///
/// Records already closed or settled are skipped.
pub fn compute(
    underlying: &str,
    records: &mut [OptionRecord],
    price: f64,
    now_ms: i64,
) -> Result<Vec<SettleRow>> {
    let mut rows = Vec::with_capacity(records.len());

    for record in records.iter_mut() {
        let state = record.state(now_ms);
        if state.is_terminal() {
            continue;
        }

        let amount = record.remaining();
        let token = TokenName::new(underlying, record.position_key()).to_string();
        let (owed, preview) = if state == LifecycleState::Matured {
            (settle(record, price, now_ms)?, false)
        } else {
            let owed = payout(record.kind(), record.direction(), record.strike(), price, amount);
            (owed, true)
        };

        rows.push(SettleRow {
            token,
            state: record.state(now_ms),
            moneyness: moneyness(record.kind(), record.strike(), price),
            amount,
            asset: owed.asset,
            quantity: owed.quantity,
            base_units: owed.base_units(),
            value: owed.value,
            path: owed.path,
            preview,
        });
    }
    Ok(rows)
}

/// Run the settle command
pub fn run(
    underlying: &str,
    records_path: &Path,
    layout: RecordFormat,
    price: f64,
    now_ms: i64,
    format: OutputFormat,
) -> Result<()> {
    let mut records = read_records(records_path, layout)?;
    info!(records = records.len(), price, now_ms, "Settling");

    let rows = compute(underlying, &mut records, price, now_ms)?;
    let previews = rows.iter().filter(|r| r.preview).count();
    if previews > 0 {
        warn!(previews, "Some records have not matured; payouts shown as preview");
    }
    emit(&rows, format)
}
