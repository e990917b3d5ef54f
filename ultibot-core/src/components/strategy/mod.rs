//! Strategy evaluation — the polymorphic signal producers.
//!
//! A strategy reads a market snapshot and its own parameters and returns one
//! signal. Strategies hold only construction-time settings (indicator keys),
//! never mutable state, so the same strategy can be evaluated for many symbols
//! at once.

pub mod breakout;
pub mod mean_reversion;
pub mod spread_reversion;
pub mod trend_following;

pub use breakout::Breakout;
pub use mean_reversion::MeanReversion;
pub use spread_reversion::SpreadReversion;
pub use trend_following::{MaType, TrendFollowing};

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::components::volatility::{VolatilityGate, VolatilityGateResult};
use crate::domain::{MarketSnapshot, Signal, StrategyParameters, VOLATILITY_FILTER_FAILED};
use crate::error::{Error, Result};

/// Trait for strategies.
///
/// # Architecture invariant
/// `evaluate` must be a pure function of the snapshot and parameters: same
/// inputs, same signal. Implementations must not use interior mutability.
pub trait Strategy: Send + Sync {
    /// Registry key (e.g., "trend_following").
    fn name(&self) -> &str;

    /// Indicator keys the snapshot's cache must contain.
    fn required_indicators(&self) -> BTreeSet<String>;

    /// Evaluate the latest bar of `snapshot`.
    ///
    /// Fails with `MissingIndicator` when the cache lacks a required key and
    /// with `InvalidParameter` when `params` break their invariants.
    fn evaluate(&self, snapshot: &MarketSnapshot, params: &StrategyParameters) -> Result<Signal>;
}

/// Shared checks every strategy runs first.
///
/// Validates the parameters, confirms the required indicators are present and
/// returns the timestamp the signal will carry.
pub fn preflight(
    strategy: &dyn Strategy,
    snapshot: &MarketSnapshot,
    params: &StrategyParameters,
) -> Result<DateTime<Utc>> {
    params.validate()?;
    let missing = snapshot
        .indicators()
        .missing(&strategy.required_indicators());
    if !missing.is_empty() {
        return Err(Error::MissingIndicator(missing));
    }
    snapshot.as_of().ok_or_else(|| {
        Error::InsufficientData(format!(
            "{}: snapshot for {} has no bars",
            strategy.name(),
            snapshot.symbol()
        ))
    })
}

/// Run the volatility gate over `key` with the parameters' percentile band.
///
/// With `volatility_lookback` set, only that many trailing values form the band.
pub fn check_volatility(
    snapshot: &MarketSnapshot,
    key: &str,
    params: &StrategyParameters,
) -> Result<VolatilityGateResult> {
    let (min_p, max_p) = params.volatility_band()?;
    let series = snapshot
        .indicators()
        .series(key)
        .ok_or_else(|| Error::MissingIndicator(vec![key.to_string()]))?;
    let window = match params.volatility_lookback()? {
        Some(lookback) => &series[series.len().saturating_sub(lookback)..],
        None => series,
    };
    VolatilityGate::evaluate(window, min_p, max_p)
}

/// The HOLD signal emitted when the volatility gate fails.
pub fn volatility_veto(
    strategy_name: &str,
    symbol: &str,
    timestamp: DateTime<Utc>,
    gate: &VolatilityGateResult,
) -> Signal {
    Signal::hold(strategy_name, symbol, timestamp)
        .with_rationale("reason", VOLATILITY_FILTER_FAILED)
        .with_rationale("volatility", gate.tested_value)
        .with_rationale("volatility_min_threshold", gate.min_threshold)
        .with_rationale("volatility_max_threshold", gate.max_threshold)
}

/// Latest value of an indicator series; NaN or absent is `InsufficientData`.
pub fn latest_finite(snapshot: &MarketSnapshot, key: &str) -> Result<f64> {
    nth_from_end(snapshot, key, 0)
}

/// Second-to-last value of an indicator series.
pub fn previous_finite(snapshot: &MarketSnapshot, key: &str) -> Result<f64> {
    nth_from_end(snapshot, key, 1)
}

fn nth_from_end(snapshot: &MarketSnapshot, key: &str, back: usize) -> Result<f64> {
    let series = snapshot
        .indicators()
        .series(key)
        .ok_or_else(|| Error::MissingIndicator(vec![key.to_string()]))?;
    let value = series
        .len()
        .checked_sub(back + 1)
        .and_then(|i| series.get(i).copied());
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(Error::InsufficientData(format!(
            "{key} has no finite value {back} bar(s) back"
        ))),
    }
}

/// Latest close price.
///
/// A missing, void (NaN) or malformed latest bar is `InsufficientData`.
pub fn latest_close(snapshot: &MarketSnapshot) -> Result<f64> {
    match snapshot.latest_bar() {
        Some(bar) if bar.is_sane() => Ok(bar.close),
        Some(bar) if bar.is_void() => Err(Error::InsufficientData(format!(
            "{}: latest bar at {} is void",
            snapshot.symbol(),
            bar.timestamp
        ))),
        Some(bar) => Err(Error::InsufficientData(format!(
            "{}: latest bar at {} fails OHLC sanity checks",
            snapshot.symbol(),
            bar.timestamp
        ))),
        None => Err(Error::InsufficientData(format!(
            "{} has no bars",
            snapshot.symbol()
        ))),
    }
}

/// Numeric parameter that must be strictly positive.
pub fn positive_param(params: &StrategyParameters, name: &str, default: f64) -> Result<f64> {
    let value = params.number_or(name, default)?;
    if value <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "{}: `{name}` must be > 0, got {value}",
            params.strategy_id
        )));
    }
    Ok(value)
}


#[cfg(test)]
mod tests {
    use super::test_support::snapshot;
    use super::*;

    #[test]
    fn latest_and_previous() {
        let snap = snapshot(&[1.0, 2.0, 3.0], &[("x", vec![f64::NAN, 5.0, 6.0])]);
        assert_eq!(latest_finite(&snap, "x").unwrap(), 6.0);
        assert_eq!(previous_finite(&snap, "x").unwrap(), 5.0);
    }

    #[test]
    fn nan_latest_is_insufficient() {
        let snap = snapshot(&[1.0, 2.0], &[("x", vec![1.0, f64::NAN])]);
        assert!(matches!(
            latest_finite(&snap, "x"),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn previous_of_single_value_is_insufficient() {
        let snap = snapshot(&[1.0], &[("x", vec![1.0])]);
        assert!(matches!(
            previous_finite(&snap, "x"),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn absent_key_is_missing_indicator() {
        let snap = snapshot(&[1.0], &[]);
        assert_eq!(
            latest_finite(&snap, "atr_14"),
            Err(Error::MissingIndicator(vec!["atr_14".into()]))
        );
    }

    #[test]
    fn volatility_lookback_limits_the_band() {
        // Quiet history, then a recent regime of higher ATR.
        let atr: Vec<f64> = (0..30).map(|i| if i < 20 { 1.0 } else { 5.0 }).collect();
        let snap = snapshot(&[100.0; 30], &[("atr_14", atr)]);

        let full = StrategyParameters::new("s").with_volatility_band(0.0, 50.0);
        let gate = check_volatility(&snap, "atr_14", &full).unwrap();
        assert_eq!(gate.tested_value, 5.0);
        assert_eq!(gate.max_threshold, 1.0);
        assert!(!gate.passed);

        let recent = full.clone().with(crate::domain::VOLATILITY_LOOKBACK, 10.0);
        let gate = check_volatility(&snap, "atr_14", &recent).unwrap();
        assert_eq!((gate.min_threshold, gate.max_threshold), (5.0, 5.0));
        assert!(gate.passed);

        // Longer than the series: same as no lookback.
        let long = full.clone().with(crate::domain::VOLATILITY_LOOKBACK, 500.0);
        assert_eq!(
            check_volatility(&snap, "atr_14", &long).unwrap(),
            check_volatility(&snap, "atr_14", &full).unwrap()
        );
    }

    #[test]
    fn latest_close_requires_a_sane_bar() {
        let snap = snapshot(&[100.0, 101.0], &[]);
        assert_eq!(latest_close(&snap).unwrap(), 101.0);

        let mut bars = snap.bars().to_vec();
        bars[1].high = bars[1].low - 5.0;
        let crossed = MarketSnapshot::new("BTCUSDT", snap.timeframe(), bars.clone(), Default::default());
        assert!(matches!(
            latest_close(&crossed),
            Err(Error::InsufficientData(msg)) if msg.contains("sanity")
        ));

        bars[1] = snap.bars()[1].clone();
        bars[1].close = f64::NAN;
        let void = MarketSnapshot::new("BTCUSDT", snap.timeframe(), bars, Default::default());
        assert!(matches!(
            latest_close(&void),
            Err(Error::InsufficientData(msg)) if msg.contains("void")
        ));
    }

    #[test]
    fn positive_param_rejects_zero() {
        let p = StrategyParameters::new("s").with("k", 0.0);
        assert!(positive_param(&p, "k", 1.0).is_err());
        assert_eq!(positive_param(&p, "other", 1.5).unwrap(), 1.5);
    }
}
