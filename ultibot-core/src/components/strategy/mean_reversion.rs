//! Mean-reversion strategy — Bollinger band stretch confirmed by RSI.
//!
//! BUY when the close is below the lower band and RSI is at or under
//! `oversold`; SELL when the close is above the upper band and RSI is at or
//! over `overbought`. Confidence starts at 0.5 and grows with how far RSI has
//! pushed past its threshold.

use std::collections::BTreeSet;

use crate::domain::{Direction, MarketSnapshot, Signal, StrategyParameters};
use crate::error::{Error, Result};

use super::{
    check_volatility, latest_close, latest_finite, preflight, volatility_veto, Strategy,
};

/// Bollinger + RSI mean reversion.
///
/// # Indicator dependencies
/// - `bollinger_upper_{period}_{multiplier}`, `bollinger_lower_{period}_{multiplier}`
/// - `rsi_{rsi_period}`
/// - `atr_{atr_period}`
///
/// # Parameters
/// - `oversold` (default 30), `overbought` (default 70), with `0 < oversold < overbought < 100`
/// - `min_volatility_percentile` / `max_volatility_percentile`
#[derive(Debug, Clone)]
pub struct MeanReversion {
    name: String,
    pub period: usize,
    pub multiplier: f64,
    pub rsi_period: usize,
    pub atr_period: usize,
    upper_key: String,
    lower_key: String,
    rsi_key: String,
    atr_key: String,
}

impl MeanReversion {
    pub const DEFAULT_NAME: &'static str = "mean_reversion";

    pub fn new(period: usize, multiplier: f64, rsi_period: usize, atr_period: usize) -> Result<Self> {
        if period == 0 || rsi_period == 0 || atr_period == 0 {
            return Err(Error::InvalidParameter(
                "mean_reversion: periods must be >= 1".into(),
            ));
        }
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "mean_reversion: multiplier must be > 0, got {multiplier}"
            )));
        }
        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            period,
            multiplier,
            rsi_period,
            atr_period,
            upper_key: format!("bollinger_upper_{period}_{multiplier}"),
            lower_key: format!("bollinger_lower_{period}_{multiplier}"),
            rsi_key: format!("rsi_{rsi_period}"),
            atr_key: format!("atr_{atr_period}"),
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn rsi_bounds(&self, params: &StrategyParameters) -> Result<(f64, f64)> {
        let oversold = params.number_or("oversold", 30.0)?;
        let overbought = params.number_or("overbought", 70.0)?;
        if !(oversold > 0.0 && oversold < overbought && overbought < 100.0) {
            return Err(Error::InvalidParameter(format!(
                "{}: need 0 < oversold < overbought < 100, got oversold={oversold}, overbought={overbought}",
                self.name
            )));
        }
        Ok((oversold, overbought))
    }
}

impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_indicators(&self) -> BTreeSet<String> {
        [&self.upper_key, &self.lower_key, &self.rsi_key, &self.atr_key]
            .into_iter()
            .cloned()
            .collect()
    }

    fn evaluate(&self, snapshot: &MarketSnapshot, params: &StrategyParameters) -> Result<Signal> {
        let timestamp = preflight(self, snapshot, params)?;
        let (oversold, overbought) = self.rsi_bounds(params)?;

        let gate = check_volatility(snapshot, &self.atr_key, params)?;
        if !gate.passed {
            return Ok(volatility_veto(&self.name, snapshot.symbol(), timestamp, &gate));
        }

        let close = latest_close(snapshot)?;
        let upper = latest_finite(snapshot, &self.upper_key)?;
        let lower = latest_finite(snapshot, &self.lower_key)?;
        let rsi = latest_finite(snapshot, &self.rsi_key)?;

        let (direction, confidence) = if close < lower && rsi <= oversold {
            (Direction::Buy, 0.5 + (oversold - rsi) / oversold)
        } else if close > upper && rsi >= overbought {
            (Direction::Sell, 0.5 + (rsi - overbought) / (100.0 - overbought))
        } else {
            (Direction::Hold, 0.0)
        };

        Ok(Signal::new(
            &self.name,
            snapshot.symbol(),
            direction,
            confidence.min(1.0),
            timestamp,
        )
        .with_rationale("close", close)
        .with_rationale("upper_band", upper)
        .with_rationale("lower_band", lower)
        .with_rationale("rsi", rsi)
        .with_rationale("volatility", gate.tested_value))
    }
}
