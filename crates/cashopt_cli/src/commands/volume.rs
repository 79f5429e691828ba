//! Volume command implementation
//!
//! Sums call and put volume per maturity or strike. Every requested key gets
//! a row, zero-filled when no record falls into it.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use cashopt_core::types::time::format_timestamp;
use cashopt_engine::analytics::{aggregate_by, aggregate_par, strike_ladder_keys, totals, BucketBy};
use cashopt_engine::contract::{cents_to_strike, strike_to_cents};
use cashopt_engine::records::OptionRecord;
use serde::Serialize;
use tracing::info;

use super::{emit, parse_timestamp, read_records, OutputFormat, RecordFormat, TableRow};
use crate::{CliError, Result};

/// Record count above which buckets are filled in parallel.
const PARALLEL_THRESHOLD: usize = 10_000;

/// Parse `--by`
pub fn parse_bucket_by(s: &str) -> Result<BucketBy> {
    match s.to_lowercase().as_str() {
        "maturity" => Ok(BucketBy::Maturity),
        "strike" => Ok(BucketBy::Strike),
        other => Err(CliError::InvalidArgument(format!(
            "Unknown bucket: {}. Supported: maturity, strike",
            other
        ))),
    }
}

/// Volume of one bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeRow {
    pub bucket: String,
    pub key: Option<i64>,
    pub call: u64,
    pub put: u64,
    pub total: u64,
}

impl TableRow for VolumeRow {
    fn headers() -> &'static [&'static str] {
        &["Bucket", "Call", "Put", "Total"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.bucket.clone(),
            self.call.to_string(),
            self.put.to_string(),
            self.total.to_string(),
        ]
    }
}

fn label(by: BucketBy, key: i64) -> String {
    match by {
        BucketBy::Maturity => format_timestamp(key).unwrap_or_else(|| key.to_string()),
        BucketBy::Strike => format!("{:.2}", cents_to_strike(key.max(0) as u64)),
    }
}

/// Bucket keys from `--keys`, the strike ladder, or the records themselves
pub fn resolve_keys(
    by: BucketBy,
    keys: &[String],
    spot: Option<f64>,
    records: &[OptionRecord],
) -> Result<Vec<i64>> {
    if !keys.is_empty() {
        return keys
            .iter()
            .map(|text| match by {
                BucketBy::Maturity => parse_timestamp(text),
                BucketBy::Strike => f64::from_str(text.trim())
                    .ok()
                    .filter(|strike| strike.is_finite() && *strike > 0.0)
                    .and_then(|strike| i64::try_from(strike_to_cents(strike)).ok())
                    .ok_or_else(|| CliError::InvalidArgument(format!("Invalid strike key: {}", text))),
            })
            .collect();
    }

    if let (BucketBy::Strike, Some(spot)) = (by, spot) {
        return Ok(strike_ladder_keys(spot));
    }

    let present: BTreeSet<i64> = records.iter().map(|r| by.key(r)).collect();
    Ok(present.into_iter().collect())
}

/// Volume rows for `keys`, followed by the total over all records
pub fn compute(records: &[OptionRecord], by: BucketBy, keys: &[i64]) -> Vec<VolumeRow> {
    let buckets = if records.len() >= PARALLEL_THRESHOLD {
        aggregate_par(records, keys, |record| by.key(record))
    } else {
        aggregate_by(records, keys, by)
    };

    let all = totals(records);
    buckets
        .into_iter()
        .map(|(key, bucket)| VolumeRow {
            bucket: label(by, key),
            key: Some(key),
            call: bucket.call,
            put: bucket.put,
            total: bucket.total(),
        })
        .chain(std::iter::once(VolumeRow {
            bucket: "all records".to_string(),
            key: None,
            call: all.call,
            put: all.put,
            total: all.total(),
        }))
        .collect()
}

/// Run the volume command
pub fn run(
    records_path: &Path,
    layout: RecordFormat,
    by: &str,
    keys: &[String],
    spot: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let by = parse_bucket_by(by)?;
    let records = read_records(records_path, layout)?;
    let keys = resolve_keys(by, keys, spot, &records)?;
    info!(records = records.len(), buckets = keys.len(), ?by, "Aggregating volume");

    emit(&compute(&records, by, &keys), format)
}
