//! Signal — one strategy's directional recommendation for one symbol.
//!
//! Signals are immutable once built: the builder methods consume `self`, and
//! there are no setters. The rationale carries whatever diagnostic values the
//! strategy wants the execution side to see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Error;

/// Directional intent of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
    Hold,
}

impl Direction {
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Direction::Hold)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Hold => "HOLD",
        })
    }
}

/// Rationale key set when the volatility gate vetoes a signal.
pub const VOLATILITY_FILTER_FAILED: &str = "volatility_filter_failed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SignalRecord")]
pub struct Signal {
    strategy_name: String,
    symbol: String,
    direction: Direction,
    /// Confidence in [0.0, 1.0].
    confidence: f64,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    rationale: BTreeMap<String, Value>,
}

impl Signal {
    /// Build a signal. Confidence is clamped to [0, 1]; NaN becomes 0.
    pub fn new(
        strategy_name: impl Into<String>,
        symbol: impl Into<String>,
        direction: Direction,
        confidence: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            strategy_name: strategy_name.into(),
            symbol: symbol.into(),
            direction,
            confidence,
            timestamp,
            rationale: BTreeMap::new(),
        }
    }

    /// A HOLD signal with zero confidence.
    pub fn hold(
        strategy_name: impl Into<String>,
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(strategy_name, symbol, Direction::Hold, 0.0, timestamp)
    }

    /// Attach one rationale entry.
    pub fn with_rationale(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.rationale.insert(key.into(), value.into());
        self
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn rationale(&self) -> &BTreeMap<String, Value> {
        &self.rationale
    }

    /// True when the volatility gate forced this signal to HOLD.
    pub fn vetoed_by_volatility(&self) -> bool {
        self.rationale
            .get("reason")
            .and_then(Value::as_str)
            .is_some_and(|r| r == VOLATILITY_FILTER_FAILED)
    }
}

/// Wire form of a signal; converted through `Signal::new`.
#[derive(Deserialize)]
struct SignalRecord {
    strategy_name: String,
    symbol: String,
    direction: Direction,
    confidence: f64,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    rationale: BTreeMap<String, Value>,
}

impl TryFrom<SignalRecord> for Signal {
    type Error = Error;

    /// Out-of-range confidence is refused rather than clamped.
    fn try_from(record: SignalRecord) -> Result<Self, Self::Error> {
        if !(0.0..=1.0).contains(&record.confidence) {
            return Err(Error::InvalidParameter(format!(
                "{}: signal confidence must be in [0, 1], got {}",
                record.strategy_name, record.confidence
            )));
        }
        let mut signal = Signal::new(
            record.strategy_name,
            record.symbol,
            record.direction,
            record.confidence,
            record.timestamp,
        );
        signal.rationale = record.rationale;
        Ok(signal)
    }
}
