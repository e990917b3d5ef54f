//! Trend-following strategy — moving average regime.
//!
//! BUY while the fast MA sits above the slow MA, SELL while it sits below.
//! Confidence grows with the MA spread (as % of the slow MA) and saturates at
//! `spread_saturation_pct`. Gated on ATR volatility.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::{Direction, MarketSnapshot, Signal, StrategyParameters};
use crate::error::{Error, Result};

use super::{
    check_volatility, latest_finite, positive_param, preflight, volatility_veto, Strategy,
};

/// Moving average type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaType {
    Sma,
    Ema,
}

impl MaType {
    pub fn prefix(&self) -> &'static str {
        match self {
            MaType::Sma => "sma",
            MaType::Ema => "ema",
        }
    }
}

/// Moving average regime strategy.
///
/// # Indicator dependencies
/// - Fast: `{ma_type}_{fast_period}` (e.g., `ema_12`)
/// - Slow: `{ma_type}_{slow_period}` (e.g., `ema_26`)
/// - Volatility: `atr_{atr_period}`
///
/// # Parameters
/// - `spread_saturation_pct` (default 2.0): spread at which confidence hits 1.0
/// - `min_volatility_percentile` / `max_volatility_percentile`
#[derive(Debug, Clone)]
pub struct TrendFollowing {
    name: String,
    pub fast_period: usize,
    pub slow_period: usize,
    pub ma_type: MaType,
    pub atr_period: usize,
    fast_key: String,
    slow_key: String,
    atr_key: String,
}

impl TrendFollowing {
    pub const DEFAULT_NAME: &'static str = "trend_following";

    pub fn new(
        fast_period: usize,
        slow_period: usize,
        ma_type: MaType,
        atr_period: usize,
    ) -> Result<Self> {
        if fast_period == 0 || atr_period == 0 {
            return Err(Error::InvalidParameter(
                "trend_following: periods must be >= 1".into(),
            ));
        }
        if slow_period <= fast_period {
            return Err(Error::InvalidParameter(format!(
                "trend_following: slow_period ({slow_period}) must be > fast_period ({fast_period})"
            )));
        }
        let prefix = ma_type.prefix();
        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            fast_period,
            slow_period,
            ma_type,
            atr_period,
            fast_key: format!("{prefix}_{fast_period}"),
            slow_key: format!("{prefix}_{slow_period}"),
            atr_key: format!("atr_{atr_period}"),
        })
    }

    /// Register under a different name (e.g. two instances with other periods).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Strategy for TrendFollowing {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_indicators(&self) -> BTreeSet<String> {
        [&self.fast_key, &self.slow_key, &self.atr_key]
            .into_iter()
            .cloned()
            .collect()
    }

    fn evaluate(&self, snapshot: &MarketSnapshot, params: &StrategyParameters) -> Result<Signal> {
        let timestamp = preflight(self, snapshot, params)?;
        let saturation = positive_param(params, "spread_saturation_pct", 2.0)?;

        let gate = check_volatility(snapshot, &self.atr_key, params)?;
        if !gate.passed {
            return Ok(volatility_veto(&self.name, snapshot.symbol(), timestamp, &gate));
        }

        let fast = latest_finite(snapshot, &self.fast_key)?;
        let slow = latest_finite(snapshot, &self.slow_key)?;
        if slow <= 0.0 {
            return Err(Error::InsufficientData(format!(
                "{}: slow MA must be positive, got {slow}",
                self.name
            )));
        }

        let spread_pct = (fast - slow) / slow * 100.0;
        let direction = if spread_pct > 0.0 {
            Direction::Buy
        } else if spread_pct < 0.0 {
            Direction::Sell
        } else {
            Direction::Hold
        };
        let confidence = if direction.is_actionable() {
            (spread_pct.abs() / saturation).min(1.0)
        } else {
            0.0
        };

        Ok(
            Signal::new(&self.name, snapshot.symbol(), direction, confidence, timestamp)
                .with_rationale("fast_ma", fast)
                .with_rationale("slow_ma", slow)
                .with_rationale("spread_pct", spread_pct)
                .with_rationale("volatility", gate.tested_value),
        )
    }
}
