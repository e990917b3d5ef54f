//! Breakout strategy — Donchian channel break.
//!
//! The channel includes the current bar's high/low, so the close is compared
//! against the previous bar's channel. BUY on a close above the prior upper
//! band, SELL on a close below the prior lower band. Confidence is
//! `0.5 + 0.5 * excess / ATR`, capped at 1.0.

use std::collections::BTreeSet;

use crate::domain::{Direction, MarketSnapshot, Signal, StrategyParameters};
use crate::error::{Error, Result};

use super::{
    check_volatility, latest_close, latest_finite, preflight, previous_finite, volatility_veto,
    Strategy,
};

/// Donchian channel breakout.
///
/// # Indicator dependencies
/// - `donchian_upper_{period}`, `donchian_lower_{period}`
/// - `atr_{atr_period}`
#[derive(Debug, Clone)]
pub struct Breakout {
    name: String,
    pub period: usize,
    pub atr_period: usize,
    upper_key: String,
    lower_key: String,
    atr_key: String,
}

impl Breakout {
    pub const DEFAULT_NAME: &'static str = "breakout";

    pub fn new(period: usize, atr_period: usize) -> Result<Self> {
        if period == 0 || atr_period == 0 {
            return Err(Error::InvalidParameter(
                "breakout: periods must be >= 1".into(),
            ));
        }
        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            period,
            atr_period,
            upper_key: format!("donchian_upper_{period}"),
            lower_key: format!("donchian_lower_{period}"),
            atr_key: format!("atr_{atr_period}"),
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Strategy for Breakout {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_indicators(&self) -> BTreeSet<String> {
        [&self.upper_key, &self.lower_key, &self.atr_key]
            .into_iter()
            .cloned()
            .collect()
    }

    fn evaluate(&self, snapshot: &MarketSnapshot, params: &StrategyParameters) -> Result<Signal> {
        let timestamp = preflight(self, snapshot, params)?;

        let gate = check_volatility(snapshot, &self.atr_key, params)?;
        if !gate.passed {
            return Ok(volatility_veto(&self.name, snapshot.symbol(), timestamp, &gate));
        }

        let close = latest_close(snapshot)?;
        let upper = previous_finite(snapshot, &self.upper_key)?;
        let lower = previous_finite(snapshot, &self.lower_key)?;
        let atr = latest_finite(snapshot, &self.atr_key)?;

        let (direction, excess) = if close > upper {
            (Direction::Buy, close - upper)
        } else if close < lower {
            (Direction::Sell, lower - close)
        } else {
            (Direction::Hold, 0.0)
        };

        // A zero ATR (flat history) still yields a base-confidence breakout.
        let confidence = match direction {
            Direction::Hold => 0.0,
            _ if atr > 0.0 => (0.5 + 0.5 * excess / atr).min(1.0),
            _ => 0.5,
        };

        Ok(
            Signal::new(&self.name, snapshot.symbol(), direction, confidence, timestamp)
                .with_rationale("close", close)
                .with_rationale("breakout_level", if close < lower { lower } else { upper })
                .with_rationale("excess", excess)
                .with_rationale("volatility", atr),
        )
    }
}
