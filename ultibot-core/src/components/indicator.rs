//! Indicator trait and the indicator cache carried by a market snapshot.
//!
//! Indicators are pure functions: bar history in, numeric series out. The
//! market-data provider computes them once per refresh; strategies only read
//! the cached series.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values should be `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Cache key (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Named indicator series aligned with a snapshot's bars.
///
/// Backed by a `BTreeMap` so iteration and serialization order are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorCache {
    series: BTreeMap<String, Vec<f64>>,
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every indicator over `bars` and cache the results under their names.
    pub fn compute(bars: &[Bar], indicators: &[&dyn Indicator]) -> Self {
        let mut cache = Self::new();
        for indicator in indicators {
            cache.insert(indicator.name(), indicator.compute(bars));
        }
        cache
    }

    /// Insert a named indicator series, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Value at a specific bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Most recent value of a series.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.series.get(name).and_then(|v| v.last().copied())
    }

    /// Full series for a named indicator.
    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    /// Keys from `required` that are absent, in the order given.
    pub fn missing<'a, I>(&self, required: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        required
            .into_iter()
            .filter(|key| !self.contains(key))
            .cloned()
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
