//! Pipeline integration tests: TOML desk → indicators → cycle report.

use chrono::{Duration, TimeZone, Utc};
use std::io::Write;
use std::sync::Arc;

use ultibot_core::components::{Indicator, SpreadReversion};
use ultibot_core::domain::{Bar, Direction, MarketSnapshot, StrategyParameters, Timeframe};
use ultibot_core::policy::{ConfidencePolicy, TradingMode};
use ultibot_core::registry::StrategyRegistry;
use ultibot_runner::{DeskConfig, EvaluationPipeline, SymbolOutcome};

const DESK: &str = r#"
mode = "paper"

[thresholds]
paper_trading_min = 0.75

[[strategies]]
kind = { type = "trend_following", fast_period = 5, slow_period = 20 }
params = { spread_saturation_pct = 2.0 }

[[strategies]]
kind = { type = "breakout", period = 20 }

[[strategies]]
kind = { type = "mean_reversion" }
"#;

fn bars_from(closes: &[f64]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 250.0,
            }
        })
        .collect()
}

fn market(cfg: &DeskConfig, symbol: &str, closes: &[f64]) -> MarketSnapshot {
    let indicators = cfg.indicators();
    let refs: Vec<&dyn Indicator> = indicators.iter().map(|b| b.as_ref()).collect();
    MarketSnapshot::with_indicators(symbol, Timeframe::H1, bars_from(closes), &refs)
}

#[test]
fn desk_from_file_runs_a_cycle() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DESK.as_bytes()).unwrap();
    let cfg = DeskConfig::from_file(file.path()).unwrap();
    let pipeline = cfg.build().unwrap();

    let rising: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 1.5).collect();
    let flat = vec![50.0; 60];
    let report = pipeline.run_cycle(&[
        market(&cfg, "ETHUSDT", &flat),
        market(&cfg, "BTCUSDT", &rising),
    ]);

    assert_eq!(report.mode, TradingMode::Paper);
    assert_eq!(
        report.strategies,
        ["trend_following", "breakout", "mean_reversion"]
    );
    assert_eq!(report.symbols[0].symbol, "BTCUSDT");
    assert_eq!(report.symbols[1].symbol, "ETHUSDT");

    let btc = &report.symbols[0];
    assert!(btc.failures.is_empty());
    assert_eq!(btc.signals.len(), 3);
    let winner = btc.accepted().expect("steady uptrend should be accepted");
    assert_eq!(winner.direction(), Direction::Buy);
    assert_eq!(winner.strategy_name(), "trend_following");

    // Flat market: every strategy holds, nothing to accept.
    let eth = &report.symbols[1];
    assert!(eth.accepted().is_none());
    assert!(eth.signals.iter().all(|s| s.direction() == Direction::Hold));

    assert_eq!(report.accepted().count(), 1);
}

#[test]
fn missing_file_has_context() {
    let err = DeskConfig::from_file(std::path::Path::new("/nonexistent/desk.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read desk config"));
}

#[test]
fn malformed_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"mode = \"sideways\"\n").unwrap();
    let err = DeskConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Invalid desk config"));
}

#[test]
fn short_history_is_skipped_not_fatal() {
    let cfg = DeskConfig::from_toml(DESK).unwrap();
    let pipeline = cfg.build().unwrap();
    // Too few bars for any indicator to warm up.
    let report = pipeline.run_cycle(&[market(&cfg, "DOGEUSDT", &[1.0, 1.1, 1.2])]);
    let doge = &report.symbols[0];
    assert_eq!(doge.outcome, SymbolOutcome::NoSignals);
    assert_eq!(doge.failures.len(), 3);
    assert!(doge.failures.iter().all(|f| f.recoverable));
}

#[test]
fn cycle_sees_one_registry_state() {
    let registry = Arc::new(StrategyRegistry::new());
    registry
        .register(
            Arc::new(SpreadReversion::new("basis_z").unwrap()),
            StrategyParameters::new("spread_reversion"),
        )
        .unwrap();
    let pipeline = EvaluationPipeline::new(
        Arc::clone(&registry),
        ConfidencePolicy::default(),
        TradingMode::Paper,
    );

    let mut cache = ultibot_core::components::IndicatorCache::new();
    cache.insert("basis_z", vec![0.0, 4.0]);
    let snap = MarketSnapshot::new("BTCUSDT", Timeframe::M1, bars_from(&[10.0, 10.0]), cache);

    let before = pipeline.run_cycle(std::slice::from_ref(&snap));
    assert_eq!(before.accepted().count(), 1);

    registry.set_enabled("spread_reversion", false).unwrap();
    let after = pipeline.run_cycle(std::slice::from_ref(&snap));
    assert!(after.strategies.is_empty());
    assert_eq!(after.symbols[0].outcome, SymbolOutcome::NoSignals);
}

#[test]
fn report_serializes_to_json() {
    let cfg = DeskConfig::from_toml(DESK).unwrap();
    let pipeline = cfg.build().unwrap();
    let rising: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 1.5).collect();
    let report = pipeline.run_cycle(&[market(&cfg, "BTCUSDT", &rising)]);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["mode"], "paper");
    assert_eq!(json["symbols"][0]["outcome"]["outcome"], "aggregated");
    assert_eq!(json["symbols"][0]["outcome"]["result"]["verdict"], "accepted");
    assert_eq!(json["symbols"][0]["timeframe"], "1h");
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn spread_pipeline() -> EvaluationPipeline {
        let registry = StrategyRegistry::new();
        registry
            .register(
                Arc::new(SpreadReversion::new("basis_z").unwrap()),
                StrategyParameters::new("spread_reversion"),
            )
            .unwrap();
        EvaluationPipeline::new(Arc::new(registry), ConfidencePolicy::default(), TradingMode::Paper)
    }

    fn spread_snapshot(i: usize, z: f64) -> MarketSnapshot {
        let mut cache = ultibot_core::components::IndicatorCache::new();
        cache.insert("basis_z", vec![0.0, z]);
        MarketSnapshot::new(format!("SYM{i:02}"), Timeframe::M5, bars_from(&[10.0, 10.0]), cache)
    }

    proptest! {
        /// Parallel and sequential cycles produce identical reports, and an
        /// accepted signal always clears the paper threshold.
        #[test]
        fn parallel_matches_sequential(zs in prop::collection::vec(-6.0..6.0_f64, 1..24)) {
            let snaps: Vec<MarketSnapshot> =
                zs.iter().enumerate().map(|(i, &z)| spread_snapshot(i, z)).collect();
            let pipeline = spread_pipeline();

            let parallel = pipeline.run_cycle(&snaps);
            let sequential = pipeline.clone().with_parallelism(false).run_cycle(&snaps);
            prop_assert_eq!(&parallel, &sequential);
            prop_assert_eq!(parallel.symbols.len(), zs.len());

            for signal in parallel.accepted() {
                prop_assert!(signal.confidence() >= 0.75);
                prop_assert!(signal.direction() != Direction::Hold);
            }
        }
    }
}
