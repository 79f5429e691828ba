//! Check command implementation
//!
//! Prints the effective configuration after file, environment and flag
//! layering, together with where `now` sits in the daily settlement schedule.

use cashopt_core::types::time::{format_timestamp, timestamp_to_datetime};
use serde::Serialize;
use tracing::info;

use super::{emit, OutputFormat, TableRow};
use crate::config::CliConfig;
use crate::{CliError, Result};

/// One configuration setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingRow {
    pub setting: &'static str,
    pub value: String,
}

impl TableRow for SettingRow {
    fn headers() -> &'static [&'static str] {
        &["Setting", "Value"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.setting.to_string(), self.value.clone()]
    }
}

fn row(setting: &'static str, value: impl ToString) -> SettingRow {
    SettingRow {
        setting,
        value: value.to_string(),
    }
}

/// Settings and schedule status at `now_ms`
pub fn compute(config: &CliConfig, now_ms: i64) -> Result<Vec<SettingRow>> {
    let now = timestamp_to_datetime(now_ms)
        .ok_or_else(|| CliError::InvalidArgument(format!("Timestamp out of range: {}", now_ms)))?;
    let engine = &config.engine;
    let iv = &engine.implied_vol;
    let schedule = &engine.schedule;

    let cutoff = schedule
        .settlement_target_ms(now)
        .and_then(format_timestamp)
        .unwrap_or_else(|| "-".to_string());

    Ok(vec![
        row("log_level", config.log_level),
        row("underlying", &engine.underlying),
        row("market.risk_free_rate", engine.market.risk_free_rate),
        row("market.default_volatility", engine.market.default_volatility),
        row("implied_vol.method", iv.method),
        row("implied_vol.tolerance", iv.tolerance),
        row("implied_vol.initial_guess", iv.initial_guess),
        row("implied_vol.max_iterations", iv.max_iterations),
        row("implied_vol.bounds", format!("[{}, {}]", iv.lower_bound, iv.upper_bound)),
        row("schedule.cutoff_hour_utc", schedule.cutoff_hour_utc),
        row("schedule.feed_window_secs", schedule.feed_window_secs),
        row("today.cutoff", cutoff),
        row("today.feed_window_open", schedule.is_feed_window_open(now)),
        row("today.settlement_due", schedule.is_settlement_due(now)),
    ])
}

/// Run the check command
pub fn run(config: &CliConfig, now_ms: i64, format: OutputFormat) -> Result<()> {
    info!("Checking configuration...");
    let rows = compute(config, now_ms)?;
    emit(&rows, format)?;
    info!("Configuration valid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUTOFF: i64 = 1_675_411_200_000;

    fn value(rows: &[SettingRow], setting: &str) -> String {
        rows.iter()
            .find(|r| r.setting == setting)
            .map(|r| r.value.clone())
            .unwrap()
    }

    #[test]
    fn test_reports_defaults() {
        let rows = compute(&CliConfig::default(), CUTOFF + 10_000).unwrap();
        assert_eq!(value(&rows, "market.risk_free_rate"), "0.0475");
        assert_eq!(value(&rows, "implied_vol.method"), "newton_with_bisection");
        assert_eq!(value(&rows, "log_level"), "info");
        assert_eq!(value(&rows, "today.cutoff"), "3 Feb 2023 08:00 UTC+0");
        assert_eq!(value(&rows, "today.feed_window_open"), "true");
        assert_eq!(value(&rows, "today.settlement_due"), "true");
    }

    #[test]
    fn test_before_cutoff() {
        let rows = compute(&CliConfig::default(), CUTOFF - 3_600_000).unwrap();
        assert_eq!(value(&rows, "today.feed_window_open"), "false");
        assert_eq!(value(&rows, "today.settlement_due"), "false");
    }

    #[test]
    fn test_out_of_range_time() {
        assert!(compute(&CliConfig::default(), i64::MAX).is_err());
    }
}
