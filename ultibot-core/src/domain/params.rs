//! Strategy parameters — tunable values the registry owns per strategy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

pub const MIN_VOLATILITY_PERCENTILE: &str = "min_volatility_percentile";
pub const MAX_VOLATILITY_PERCENTILE: &str = "max_volatility_percentile";
/// Trailing number of volatility values the gate ranks against.
pub const VOLATILITY_LOOKBACK: &str = "volatility_lookback";

/// A single named parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Number(v as f64)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// Per-strategy configuration.
///
/// Uses `BTreeMap` for deterministic key ordering during serialization → hashing.
///
/// # Invariant
/// `0 <= min_volatility_percentile <= max_volatility_percentile <= 100`, with
/// absent values read as 0 and 100. `volatility_lookback`, when set, is a
/// whole number >= 2. Every number must be finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParameters {
    pub strategy_id: String,
    #[serde(default)]
    pub values: BTreeMap<String, ParamValue>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl StrategyParameters {
    /// Enabled parameter set with no values.
    pub fn new(strategy_id: impl Into<String>) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            values: BTreeMap::new(),
            enabled: true,
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Shorthand for setting both volatility percentiles.
    pub fn with_volatility_band(self, min_percentile: f64, max_percentile: f64) -> Self {
        self.with(MIN_VOLATILITY_PERCENTILE, min_percentile)
            .with(MAX_VOLATILITY_PERCENTILE, max_percentile)
    }

    /// Numeric parameter, `None` when absent.
    ///
    /// A text value under a numeric name is an `InvalidParameter` error.
    pub fn number(&self, name: &str) -> Result<Option<f64>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(ParamValue::Number(n)) => Ok(Some(*n)),
            Some(ParamValue::Text(t)) => Err(Error::InvalidParameter(format!(
                "{}: `{name}` must be numeric, got \"{t}\"",
                self.strategy_id
            ))),
        }
    }

    /// Numeric parameter with a fallback for absent values.
    pub fn number_or(&self, name: &str, default: f64) -> Result<f64> {
        Ok(self.number(name)?.unwrap_or(default))
    }

    /// Text parameter, `None` when absent or numeric.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ParamValue::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    /// The validated `(min, max)` volatility percentile band.
    pub fn volatility_band(&self) -> Result<(f64, f64)> {
        let min = self.number_or(MIN_VOLATILITY_PERCENTILE, 0.0)?;
        let max = self.number_or(MAX_VOLATILITY_PERCENTILE, 100.0)?;
        if !(0.0..=100.0).contains(&min) || !(0.0..=100.0).contains(&max) || min > max {
            return Err(Error::InvalidParameter(format!(
                "{}: volatility percentiles must satisfy 0 <= min <= max <= 100, got min={min}, max={max}",
                self.strategy_id
            )));
        }
        Ok((min, max))
    }

    /// Gate window length; `None` ranks against the whole series.
    pub fn volatility_lookback(&self) -> Result<Option<usize>> {
        match self.number(VOLATILITY_LOOKBACK)? {
            None => Ok(None),
            Some(n) if n.is_finite() && n >= 2.0 && n.fract() == 0.0 => Ok(Some(n as usize)),
            Some(n) => Err(Error::InvalidParameter(format!(
                "{}: `{VOLATILITY_LOOKBACK}` must be a whole number >= 2, got {n}",
                self.strategy_id
            ))),
        }
    }

    /// Check every invariant of the parameter set.
    pub fn validate(&self) -> Result<()> {
        if self.strategy_id.trim().is_empty() {
            return Err(Error::InvalidParameter(
                "strategy_id must not be empty".into(),
            ));
        }
        for (name, value) in &self.values {
            if let ParamValue::Number(n) = value {
                if !n.is_finite() {
                    return Err(Error::InvalidParameter(format!(
                        "{}: `{name}` must be finite, got {n}",
                        self.strategy_id
                    )));
                }
            }
        }
        self.volatility_lookback()?;
        self.volatility_band().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_full_band() {
        let p = StrategyParameters::new("trend_following");
        assert!(p.enabled);
        assert_eq!(p.volatility_band().unwrap(), (0.0, 100.0));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn inverted_band_is_invalid() {
        let p = StrategyParameters::new("breakout").with_volatility_band(80.0, 20.0);
        assert!(matches!(p.validate(), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn out_of_range_percentile_is_invalid() {
        let p = StrategyParameters::new("breakout").with_volatility_band(-1.0, 50.0);
        assert!(p.validate().is_err());
        let p = StrategyParameters::new("breakout").with_volatility_band(10.0, 100.5);
        assert!(p.validate().is_err());
    }

    #[test]
    fn non_finite_numbers_are_invalid() {
        let p = StrategyParameters::new("x").with("lookback", f64::INFINITY);
        assert!(p.validate().is_err());
    }

    #[test]
    fn volatility_lookback_must_be_whole_and_at_least_two() {
        assert_eq!(StrategyParameters::new("x").volatility_lookback().unwrap(), None);
        let p = StrategyParameters::new("x").with(VOLATILITY_LOOKBACK, 50.0);
        assert_eq!(p.volatility_lookback().unwrap(), Some(50));
        assert!(p.validate().is_ok());

        for bad in [1.0, 0.0, -5.0, 12.5] {
            let p = StrategyParameters::new("x").with(VOLATILITY_LOOKBACK, bad);
            assert!(matches!(p.validate(), Err(Error::InvalidParameter(_))), "{bad}");
        }
    }

    #[test]
    fn text_where_number_expected() {
        let p = StrategyParameters::new("x").with(MIN_VOLATILITY_PERCENTILE, "low");
        assert!(p.number(MIN_VOLATILITY_PERCENTILE).is_err());
        assert!(p.validate().is_err());
        assert_eq!(p.text(MIN_VOLATILITY_PERCENTILE), Some("low"));
    }

    #[test]
    fn empty_id_is_invalid() {
        assert!(StrategyParameters::new("  ").validate().is_err());
    }

    #[test]
    fn deserializes_integers_and_text() {
        let json = r#"{"strategy_id":"b","values":{"lookback":20,"label":"fast"}}"#;
        let p: StrategyParameters = serde_json::from_str(json).unwrap();
        assert_eq!(p.number("lookback").unwrap(), Some(20.0));
        assert_eq!(p.text("label"), Some("fast"));
        assert!(p.enabled);
    }
}
