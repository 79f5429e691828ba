//! CLI command implementations
//!
//! Each submodule implements a specific CLI command. Commands compute rows
//! first and render them second, so the computation is testable without
//! capturing stdout.

pub mod check;
pub mod close;
pub mod iv;
pub mod quote;
pub mod settle;
pub mod volume;

use std::path::Path;
use std::str::FromStr;

use cashopt_core::types::MS_PER_DAY;
use cashopt_engine::indexer::{decode_rows, IndexedToken};
use cashopt_engine::OptionRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{CliError, Result};

/// Output format shared by every command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(CliError::InvalidArgument(format!(
                "Unknown format: {}. Supported: json, table",
                other
            ))),
        }
    }
}

/// A row that can be drawn in a table
pub trait TableRow {
    /// Column headings
    fn headers() -> &'static [&'static str];
    /// Cell text, one per heading
    fn cells(&self) -> Vec<String>;
}

/// Render rows in the requested format
pub fn render<R: TableRow + Serialize>(rows: &[R], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        OutputFormat::Table => Ok(table(R::headers(), rows.iter().map(TableRow::cells).collect())),
    }
}

/// Print rows to stdout
pub fn emit<R: TableRow + Serialize>(rows: &[R], format: OutputFormat) -> Result<()> {
    println!("{}", render(rows, format)?);
    Ok(())
}

fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}", left, segments.join(mid), right)
    };
    let line = |cells: Vec<String>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!(" {:<width$} ", cell, width = w))
            .collect();
        format!("│{}│", padded.join("│"))
    };

    let mut out = vec![
        rule("┌", "┬", "┐"),
        line(headers.iter().map(|h| h.to_string()).collect()),
        rule("├", "┼", "┤"),
    ];
    if rows.is_empty() {
        out.push(line(widths.iter().map(|_| String::new()).collect()));
    }
    out.extend(rows.into_iter().map(line));
    out.push(rule("└", "┴", "┘"));
    out.join("\n")
}

/// Layout of a records file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// Array of engine records
    #[default]
    Records,
    /// Array of indexer ownership rows; undecodable rows are skipped
    Indexer,
}

/// Load records from a JSON array file
pub fn read_records(path: &Path, layout: RecordFormat) -> Result<Vec<OptionRecord>> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(CliError::FileNotFound(display));
    }
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: display.clone(),
        source,
    })?;
    parse_records(&content, layout).map_err(|source| CliError::Records { path: display, source })
}

fn parse_records(
    content: &str,
    layout: RecordFormat,
) -> std::result::Result<Vec<OptionRecord>, serde_json::Error> {
    match layout {
        RecordFormat::Records => serde_json::from_str(content),
        RecordFormat::Indexer => {
            let rows: Vec<IndexedToken> = serde_json::from_str(content)?;
            Ok(decode_rows(rows))
        }
    }
}

/// Current time in UTC milliseconds, or the `--now` override
///
/// Accepts RFC 3339 timestamps or raw milliseconds.
pub fn resolve_now(now: Option<&str>) -> Result<i64> {
    match now {
        None => Ok(Utc::now().timestamp_millis()),
        Some(text) => parse_timestamp(text),
    }
}

/// Parse an RFC 3339 timestamp or a millisecond count
pub fn parse_timestamp(text: &str) -> Result<i64> {
    if let Ok(ms) = text.trim().parse::<i64>() {
        return Ok(ms);
    }
    DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
        .map_err(|e| CliError::InvalidArgument(format!("Invalid timestamp {:?}: {}", text, e)))
}

/// Days to maturity as a millisecond offset
pub fn days_to_ms(days: f64) -> i64 {
    (days * MS_PER_DAY as f64).round() as i64
}

/// Fixed-precision number cell
pub fn fmt_num(value: f64) -> String {
    format!("{:.6}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        value: f64,
    }

    impl TableRow for Row {
        fn headers() -> &'static [&'static str] {
            &["Name", "Value"]
        }

        fn cells(&self) -> Vec<String> {
            vec![self.name.to_string(), fmt_num(self.value)]
        }
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("table").unwrap(), OutputFormat::Table);
        assert!(OutputFormat::from_str("csv").is_err());
    }

    #[test]
    fn test_render_table() {
        let rows = [Row { name: "call", value: 1.5 }];
        let text = render(&rows, OutputFormat::Table).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("Name"));
        assert!(lines[3].contains("1.500000"));
        assert!(lines.iter().all(|l| l.chars().count() == lines[0].chars().count()));
    }

    #[test]
    fn test_render_json() {
        let rows = [Row { name: "put", value: 2.0 }];
        let text = render(&rows, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["name"], "put");
        assert_eq!(value[0]["value"], 2.0);
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1675411200000").unwrap(), 1_675_411_200_000);
        assert_eq!(
            parse_timestamp("2023-02-03T08:00:00Z").unwrap(),
            1_675_411_200_000
        );
        assert!(parse_timestamp("tomorrow").is_err());
    }

    #[test]
    fn test_parse_records() {
        let records = parse_records(
            r#"[
                {"kind": "call", "direction": "long", "strike": 18.0, "maturity_ms": 100, "amount": 5},
                {"kind": "put", "direction": "short", "strike": 17.5, "maturity_ms": 100, "amount": 5, "remaining": 2}
            ]"#,
            RecordFormat::Records,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].remaining(), 2);

        let bad = parse_records(
            r#"[{"kind": "call", "direction": "long", "strike": -1.0, "maturity_ms": 100, "amount": 5}]"#,
            RecordFormat::Records,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_parse_indexer_rows() {
        let records = parse_records(
            r#"[
                {"amount": "2", "current_token_data": {"default_properties": {
                    "direction_type": "true", "option_type": "false",
                    "strike_price": "0x31383530", "maturity": "100"}}},
                {"amount": "1", "current_token_data": {"default_properties": {}}}
            ]"#,
            RecordFormat::Indexer,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].strike(), 18.5);
        assert_eq!(records[0].amount(), 2);
    }

    #[test]
    fn test_missing_records_file() {
        assert!(matches!(
            read_records(Path::new("does/not/exist.json"), RecordFormat::Records),
            Err(CliError::FileNotFound(_))
        ));
    }
}
