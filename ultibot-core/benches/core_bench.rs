//! Criterion benchmarks for the evaluation hot paths.
//!
//! Benchmarks:
//! 1. Volatility gate (sort + percentile over ATR histories)
//! 2. Indicator precompute for a mixed strategy set
//! 3. Strategy evaluation against a prepared snapshot
//! 4. Signal aggregation over a batch of signals

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ultibot_core::aggregator::SignalAggregator;
use ultibot_core::components::{
    create_strategy, indicator_set, Indicator, IndicatorCache, MaType, StrategyKind,
    VolatilityGate,
};
use ultibot_core::domain::{Bar, Direction, MarketSnapshot, Signal, StrategyParameters, Timeframe};
use ultibot_core::policy::{ConfidencePolicy, TradingMode};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Bar {
                timestamp: base + Duration::minutes(15 * i as i64),
                open,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000.0 + (i % 500) as f64,
            }
        })
        .collect()
}

fn kinds() -> Vec<StrategyKind> {
    vec![
        StrategyKind::TrendFollowing {
            fast_period: 12,
            slow_period: 26,
            ma_type: MaType::Ema,
            atr_period: 14,
            name: None,
        },
        StrategyKind::MeanReversion {
            period: 20,
            multiplier: 2.0,
            rsi_period: 14,
            atr_period: 14,
            name: None,
        },
        StrategyKind::Breakout {
            period: 20,
            atr_period: 14,
            name: None,
        },
    ]
}

fn compute_cache(bars: &[Bar], kinds: &[StrategyKind]) -> IndicatorCache {
    let indicators = indicator_set(kinds);
    let refs: Vec<&dyn Indicator> = indicators.iter().map(|b| b.as_ref()).collect();
    IndicatorCache::compute(bars, &refs)
}

// ── 1. Volatility Gate ───────────────────────────────────────────────

fn bench_volatility_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("volatility_gate");

    for &len in &[100, 500, 2000] {
        let series: Vec<f64> = (0..len).map(|i| 1.0 + (i as f64 * 0.37).sin().abs()).collect();
        group.bench_with_input(BenchmarkId::new("band_10_90", len), &len, |b, _| {
            b.iter(|| VolatilityGate::evaluate(black_box(&series), 10.0, 90.0));
        });
    }

    group.finish();
}

// ── 2. Indicator Precompute ──────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_precompute");
    let kinds = kinds();

    for &bar_count in &[500, 2000] {
        let bars = make_bars(bar_count);
        group.bench_with_input(
            BenchmarkId::new("mixed_strategy_set", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| compute_cache(black_box(&bars), &kinds));
            },
        );
    }

    group.finish();
}

// ── 3. Strategy Evaluation ───────────────────────────────────────────

fn bench_strategy_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_evaluation");
    let kinds = kinds();
    let bars = make_bars(500);
    let cache = compute_cache(&bars, &kinds);
    let snapshot = MarketSnapshot::new("BTCUSDT", Timeframe::M15, bars, cache);

    for kind in &kinds {
        let strategy = create_strategy(kind).unwrap();
        let params = StrategyParameters::new(kind.name()).with_volatility_band(10.0, 90.0);
        group.bench_function(kind.name().to_string(), |b| {
            b.iter(|| strategy.evaluate(black_box(&snapshot), black_box(&params)));
        });
    }

    group.finish();
}

// ── 4. Aggregation ───────────────────────────────────────────────────

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let policy = ConfidencePolicy::default();
    let aggregator = SignalAggregator::new();

    for &count in &[4, 32, 256] {
        let signals: Vec<Signal> = (0..count)
            .map(|i| {
                let direction = match i % 3 {
                    0 => Direction::Buy,
                    1 => Direction::Sell,
                    _ => Direction::Hold,
                };
                let symbol = format!("SYM{}", i % 8);
                Signal::new(format!("s{i}"), symbol, direction, (i % 100) as f64 / 100.0, ts)
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("single", count), &count, |b, _| {
            b.iter(|| aggregator.aggregate(black_box(&signals), TradingMode::Paper, &policy));
        });
        group.bench_with_input(BenchmarkId::new("by_symbol", count), &count, |b, _| {
            b.iter(|| {
                aggregator.aggregate_by_symbol(black_box(&signals), TradingMode::Paper, &policy)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_volatility_gate,
    bench_indicators,
    bench_strategy_evaluation,
    bench_aggregation,
);
criterion_main!(benches);
