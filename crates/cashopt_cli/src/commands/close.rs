//! Close command implementation
//!
//! Pairs every Long record with the first opposing Short record that still
//! has quantity left and cancels the overlap before maturity.

use std::path::Path;

use cashopt_core::types::CollateralAsset;
use cashopt_engine::contract::Direction;
use cashopt_engine::matching::{close_pair, find_opposing_index, MatchError};
use cashopt_engine::records::OptionRecord;
use cashopt_engine::TokenName;
use serde::Serialize;
use tracing::{debug, info};

use super::{emit, fmt_num, read_records, OutputFormat, RecordFormat, TableRow};
use crate::Result;

/// One early closure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloseRow {
    pub long: String,
    pub short: String,
    pub quantity: u64,
    pub asset: CollateralAsset,
    pub released: f64,
}

impl TableRow for CloseRow {
    fn headers() -> &'static [&'static str] {
        &["Long", "Short", "Quantity", "Asset", "Released"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.long.clone(),
            self.short.clone(),
            self.quantity.to_string(),
            self.asset.to_string(),
            fmt_num(self.released),
        ]
    }
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (head, tail) = items.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

/// Close every opposing pair in `records`
///
/// Matured contracts are left alone; they settle instead.
pub fn compute(underlying: &str, records: &mut [OptionRecord], now_ms: i64) -> Result<Vec<CloseRow>> {
    let mut rows = Vec::new();

    for i in 0..records.len() {
        if records[i].direction() != Direction::Long {
            continue;
        }
        while records[i].remaining() > 0 {
            let Some(j) = find_opposing_index(&records[i], records) else {
                break;
            };
            let (long, short) = pair_mut(records, i, j);
            let closure = match close_pair(long, short, now_ms) {
                Ok(closure) => closure,
                Err(MatchError::Matured { maturity_ms }) => {
                    debug!(maturity_ms, "skipping matured contract");
                    break;
                }
                Err(err) => return Err(err.into()),
            };

            rows.push(CloseRow {
                long: TokenName::new(underlying, long.position_key()).to_string(),
                short: TokenName::new(underlying, short.position_key()).to_string(),
                quantity: closure.quantity,
                asset: closure.asset,
                released: closure.released,
            });
        }
    }
    Ok(rows)
}

/// Run the close command
pub fn run(
    underlying: &str,
    records_path: &Path,
    layout: RecordFormat,
    now_ms: i64,
    format: OutputFormat,
) -> Result<()> {
    let mut records = read_records(records_path, layout)?;
    info!(records = records.len(), now_ms, "Matching opposing positions");

    let rows = compute(underlying, &mut records, now_ms)?;
    info!(closures = rows.len(), "Matching complete");
    emit(&rows, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashopt_engine::contract::OptionKind;

    const MATURITY: i64 = 1_675_411_200_000;

    fn record(kind: OptionKind, direction: Direction, strike: f64, amount: u64) -> OptionRecord {
        OptionRecord::new(kind, direction, strike, MATURITY, amount).unwrap()
    }

    #[test]
    fn test_closes_across_several_shorts() {
        let mut records = vec![
            record(OptionKind::Put, Direction::Short, 18.0, 2),
            record(OptionKind::Put, Direction::Long, 18.0, 5),
            record(OptionKind::Call, Direction::Short, 18.0, 4),
            record(OptionKind::Put, Direction::Short, 18.0, 1),
        ];
        let rows = compute("APT", &mut records, MATURITY - 1).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].quantity, 2);
        assert_eq!(rows[1].quantity, 1);
        assert_eq!(rows[0].asset, CollateralAsset::Stable);
        assert_eq!(rows[0].released, 36.0);
        assert_eq!(rows[0].long, "APT_1675411200000_1800_PUT_LONG");
        assert_eq!(records[1].remaining(), 2);
        assert_eq!(records[2].remaining(), 4);
    }

    #[test]
    fn test_no_pairs() {
        let mut records = vec![
            record(OptionKind::Call, Direction::Long, 18.0, 1),
            record(OptionKind::Call, Direction::Short, 18.5, 1),
        ];
        assert!(compute("APT", &mut records, MATURITY - 1).unwrap().is_empty());
    }

    #[test]
    fn test_matured_contracts_are_skipped() {
        let mut records = vec![
            record(OptionKind::Call, Direction::Long, 18.0, 1),
            record(OptionKind::Call, Direction::Short, 18.0, 1),
        ];
        assert!(compute("APT", &mut records, MATURITY).unwrap().is_empty());
        assert_eq!(records[0].remaining(), 1);
    }

    #[test]
    fn test_pair_mut_either_order() {
        let mut items = [1, 2, 3];
        let (a, b) = pair_mut(&mut items, 2, 0);
        std::mem::swap(a, b);
        assert_eq!(items, [3, 2, 1]);
    }
}
