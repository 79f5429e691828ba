//! Benchmarks for cashopt_engine.

use cashopt_engine::analytics::{aggregate, aggregate_par, strike_ladder_keys, BucketBy};
use cashopt_engine::config::{ImpliedVolConfig, ImpliedVolMethod, MarketParams};
use cashopt_engine::contract::{ContractKey, Direction, OptionKind};
use cashopt_engine::pricing::{implied_vol, price, quote_batch, QuoteRequest};
use cashopt_engine::records::OptionRecord;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const DAY_MS: i64 = 86_400_000;

fn benchmark_price(c: &mut Criterion) {
    c.bench_function("black_scholes_call", |b| {
        b.iter(|| {
            price(
                OptionKind::Call,
                black_box(18.0),
                black_box(18.5),
                0.0475,
                0.75,
                30.0 / 365.0,
            )
        })
    });
}

fn benchmark_implied_vol(c: &mut Criterion) {
    let mut group = c.benchmark_group("implied_vol");
    let observed = price(OptionKind::Call, 18.0, 18.5, 0.0475, 0.6, 30.0 / 365.0);

    for method in [ImpliedVolMethod::NewtonWithBisection, ImpliedVolMethod::Bisection] {
        let config = ImpliedVolConfig::default().with_method(method);
        group.bench_with_input(BenchmarkId::from_parameter(method), &config, |b, config| {
            b.iter(|| {
                implied_vol(
                    black_box(observed),
                    OptionKind::Call,
                    18.0,
                    18.5,
                    0.0475,
                    30.0 / 365.0,
                    config,
                )
            })
        });
    }

    group.finish();
}

/// Quote requests across the strike ladder for a run of weekly maturities.
fn generate_requests(weeks: i64) -> Vec<QuoteRequest> {
    let strikes = cashopt_engine::analytics::strike_ladder(18.0);
    (1..=weeks)
        .flat_map(|week| {
            let strikes = strikes.clone();
            [OptionKind::Call, OptionKind::Put].into_iter().flat_map(move |kind| {
                strikes.clone().into_iter().map(move |strike| QuoteRequest {
                    contract: ContractKey::new(kind, strike, week * 7 * DAY_MS),
                    spot: 18.0,
                    now_ms: 0,
                })
            })
        })
        .collect()
}

fn benchmark_quote_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("quote_batch");
    let market = MarketParams::default();
    let iv_config = ImpliedVolConfig::default();

    for weeks in [1, 4, 12] {
        let requests = generate_requests(weeks);
        group.bench_with_input(BenchmarkId::from_parameter(requests.len()), &requests, |b, reqs| {
            b.iter(|| quote_batch(black_box(reqs), &market, &iv_config))
        });
    }

    group.finish();
}

fn generate_records(count: usize) -> Vec<OptionRecord> {
    (0..count)
        .filter_map(|i| {
            let kind = if i % 2 == 0 { OptionKind::Call } else { OptionKind::Put };
            let strike = 16.5 + (i % 7) as f64 * 0.5;
            OptionRecord::new(kind, Direction::Long, strike, 0, (i % 5 + 1) as u64).ok()
        })
        .collect()
}

fn benchmark_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_by_strike");
    let keys = strike_ladder_keys(18.0);

    for size in [1_000, 10_000, 100_000] {
        let records = generate_records(size);

        group.bench_with_input(BenchmarkId::new("sequential", size), &records, |b, records| {
            b.iter(|| aggregate(black_box(records), &keys, |r| BucketBy::Strike.key(r)))
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &records, |b, records| {
            b.iter(|| aggregate_par(black_box(records), &keys, |r| BucketBy::Strike.key(r)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_price,
    benchmark_implied_vol,
    benchmark_quote_batch,
    benchmark_aggregate
);
criterion_main!(benches);
