//! Cashopt CLI - command-line operations over the option engine
//!
//! # Commands
//!
//! - `cashopt quote --spot 18 --strike 18 --days 30` - Fair values and implied vols
//! - `cashopt iv --kind call --price 1.57 --spot 18 --strike 18 --days 30` - Implied volatility
//! - `cashopt settle --records FILE --price P` - Moneyness and payout per record
//! - `cashopt close --records FILE` - Early closure of opposing positions
//! - `cashopt volume --records FILE --by maturity` - Call/put volume per bucket
//! - `cashopt check` - Effective configuration
//!
//! Record files are JSON arrays of records, or of indexer ownership rows with
//! `--indexer`.
//!
//! # Architecture
//!
//! The **Service** layer: it reads local JSON and TOML files and hands plain
//! values to `cashopt_engine`, which does no I/O of its own.

use std::path::PathBuf;

use cashopt_engine::config::ImpliedVolMethod;
use cashopt_engine::contract::OptionKind;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;

use commands::{resolve_now, OutputFormat, RecordFormat};
use config::{build_config, CliArgs, LogLevel};
pub use error::{CliError, Result};

/// Cash-settled option engine CLI
#[derive(Parser)]
#[command(name = "cashopt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (TOML); defaults to ./cashopt.toml if present
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Risk-free rate override
    #[arg(long, global = true)]
    rate: Option<f64>,

    /// Default volatility override
    #[arg(long = "vol", global = true)]
    volatility: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Output format (json, table)
    #[arg(short, long, global = true, default_value = "table")]
    format: String,

    /// Read record files as indexer ownership rows
    #[arg(long, global = true)]
    indexer: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fair value, vega and implied volatility of calls and puts
    Quote {
        /// Option kind (call, put); both when omitted
        #[arg(short, long)]
        kind: Option<OptionKind>,

        /// Spot price of the underlying
        #[arg(short, long)]
        spot: f64,

        /// Strike price; repeat for several, defaults to the ladder around spot
        #[arg(long)]
        strike: Vec<f64>,

        /// Days to maturity
        #[arg(short, long, default_value = "7")]
        days: f64,
    },

    /// Implied volatility from an observed price
    Iv {
        /// Option kind (call, put)
        #[arg(short, long)]
        kind: OptionKind,

        /// Observed option price
        #[arg(short, long)]
        price: f64,

        /// Spot price of the underlying
        #[arg(short, long)]
        spot: f64,

        /// Strike price
        #[arg(long)]
        strike: f64,

        /// Days to maturity
        #[arg(short, long)]
        days: f64,

        /// Solver (newton, bisection, fixed-step)
        #[arg(short, long)]
        method: Option<ImpliedVolMethod>,
    },

    /// Moneyness and payout of every record at a settlement price
    Settle {
        /// JSON file holding an array of records
        #[arg(short, long)]
        records: PathBuf,

        /// Settlement price
        #[arg(short, long)]
        price: f64,

        /// Evaluation time (RFC 3339 or UTC milliseconds); defaults to now
        #[arg(long)]
        now: Option<String>,
    },

    /// Close opposing positions before maturity
    Close {
        /// JSON file holding an array of records
        #[arg(short, long)]
        records: PathBuf,

        /// Evaluation time (RFC 3339 or UTC milliseconds); defaults to now
        #[arg(long)]
        now: Option<String>,
    },

    /// Call and put volume per maturity or strike
    Volume {
        /// JSON file holding an array of records
        #[arg(short, long)]
        records: PathBuf,

        /// Bucket by (maturity, strike)
        #[arg(short, long, default_value = "maturity")]
        by: String,

        /// Bucket keys: timestamps for maturity, prices for strike
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,

        /// Spot price; strike buckets default to the ladder around it
        #[arg(short, long)]
        spot: Option<f64>,
    },

    /// Check configuration and schedule status
    Check {
        /// Evaluation time (RFC 3339 or UTC milliseconds); defaults to now
        #[arg(long)]
        now: Option<String>,
    },
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let method = match &cli.command {
        Commands::Iv { method, .. } => *method,
        _ => None,
    };
    let args = CliArgs {
        config_file: cli.config.clone(),
        risk_free_rate: cli.rate,
        volatility: cli.volatility,
        log_level: cli.log_level,
        method,
    };
    let config = build_config(&args)?;

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        config.log_level
    };
    init_tracing(level.as_filter_str());

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let format: OutputFormat = cli.format.parse()?;
    let engine = &config.engine;
    let layout = if cli.indexer {
        RecordFormat::Indexer
    } else {
        RecordFormat::Records
    };

    match cli.command {
        Commands::Quote {
            kind,
            spot,
            strike,
            days,
        } => commands::quote::run(engine, kind, spot, &strike, days, resolve_now(None)?, format),
        Commands::Iv {
            kind,
            price,
            spot,
            strike,
            days,
            ..
        } => commands::iv::run(engine, kind, price, spot, strike, days, format),
        Commands::Settle { records, price, now } => {
            let now_ms = resolve_now(now.as_deref())?;
            commands::settle::run(&engine.underlying, &records, layout, price, now_ms, format)
        }
        Commands::Close { records, now } => {
            let now_ms = resolve_now(now.as_deref())?;
            commands::close::run(&engine.underlying, &records, layout, now_ms, format)
        }
        Commands::Volume {
            records,
            by,
            keys,
            spot,
        } => commands::volume::run(&records, layout, &by, &keys, spot, format),
        Commands::Check { now } => commands::check::run(&config, resolve_now(now.as_deref())?, format),
    }
}
