//! Spread reversion — arbitrage-style trade on a spread z-score.
//!
//! The provider supplies the z-score of a spread (pair basis, perp/spot
//! premium, cross-venue gap) as an indicator series. Stretched spreads are
//! expected to close: BUY when z <= -entry_z, SELL when z >= entry_z.
//! Not volatility gated; the z-score is already volatility normalised.

use std::collections::BTreeSet;

use crate::domain::{Direction, MarketSnapshot, Signal, StrategyParameters};
use crate::error::{Error, Result};

use super::{latest_finite, positive_param, preflight, Strategy};

/// Z-score spread reversion.
///
/// # Parameters
/// - `entry_z` (default 2.0): minimum |z| to act
/// - `saturation_z` (default 4.0, >= `entry_z`): |z| at which confidence hits 1.0
#[derive(Debug, Clone)]
pub struct SpreadReversion {
    name: String,
    zscore_key: String,
}

impl SpreadReversion {
    pub const DEFAULT_NAME: &'static str = "spread_reversion";

    pub fn new(zscore_key: impl Into<String>) -> Result<Self> {
        let zscore_key = zscore_key.into();
        if zscore_key.trim().is_empty() {
            return Err(Error::InvalidParameter(
                "spread_reversion: zscore_key must not be empty".into(),
            ));
        }
        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            zscore_key,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Strategy for SpreadReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_indicators(&self) -> BTreeSet<String> {
        BTreeSet::from([self.zscore_key.clone()])
    }

    fn evaluate(&self, snapshot: &MarketSnapshot, params: &StrategyParameters) -> Result<Signal> {
        let timestamp = preflight(self, snapshot, params)?;
        let entry_z = positive_param(params, "entry_z", 2.0)?;
        let saturation_z = positive_param(params, "saturation_z", 4.0)?;
        if saturation_z < entry_z {
            return Err(Error::InvalidParameter(format!(
                "{}: saturation_z ({saturation_z}) must be >= entry_z ({entry_z})",
                self.name
            )));
        }

        let z = latest_finite(snapshot, &self.zscore_key)?;
        let direction = if z <= -entry_z {
            Direction::Buy
        } else if z >= entry_z {
            Direction::Sell
        } else {
            Direction::Hold
        };
        let confidence = if direction.is_actionable() {
            (z.abs() / saturation_z).min(1.0)
        } else {
            0.0
        };

        Ok(
            Signal::new(&self.name, snapshot.symbol(), direction, confidence, timestamp)
                .with_rationale("zscore", z)
                .with_rationale("entry_z", entry_z),
        )
    }
}
