//! MarketSnapshot — the read-only market view handed to strategies.
//!
//! A snapshot is built by the market-data provider and replaced wholesale on
//! every refresh. Fields are private so nothing downstream can mutate it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::components::indicator::{Indicator, IndicatorCache};

use super::{Bar, Timeframe};

/// Immutable bar history plus derived indicators for one symbol/timeframe.
///
/// Bars are ordered oldest first; every indicator series is aligned with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
    indicators: IndicatorCache,
}

impl MarketSnapshot {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
        indicators: IndicatorCache,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
            indicators,
        }
    }

    /// Build a snapshot and fill its cache from the given indicators.
    pub fn with_indicators(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
        indicators: &[&dyn Indicator],
    ) -> Self {
        let cache = IndicatorCache::compute(&bars, indicators);
        Self::new(symbol, timeframe, bars, cache)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn indicators(&self) -> &IndicatorCache {
        &self.indicators
    }

    pub fn latest_bar(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Timestamp of the latest bar, if any.
    pub fn as_of(&self) -> Option<DateTime<Utc>> {
        self.latest_bar().map(|b| b.timestamp)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
