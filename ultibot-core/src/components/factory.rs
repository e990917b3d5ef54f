//! Factory system — converts a serializable `StrategyKind` into runtime strategies.
//!
//! Adding a strategy means one `Strategy` impl, one `StrategyKind` variant and
//! one match arm here. `indicators_for` tells the market-data provider which
//! library indicators to compute so the strategy's required keys are present.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::indicators::{Atr, Bollinger, Donchian, Ema, Rsi, Sma};

use super::indicator::Indicator;
use super::strategy::{Breakout, MaType, MeanReversion, SpreadReversion, Strategy, TrendFollowing};

/// Structural configuration of one strategy instance.
///
/// Tunable values (thresholds, volatility band) live in `StrategyParameters`;
/// this only fixes what the strategy reads from the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyKind {
    TrendFollowing {
        fast_period: usize,
        slow_period: usize,
        #[serde(default = "default_ma_type")]
        ma_type: MaType,
        #[serde(default = "default_atr_period")]
        atr_period: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    MeanReversion {
        #[serde(default = "default_band_period")]
        period: usize,
        #[serde(default = "default_multiplier")]
        multiplier: f64,
        #[serde(default = "default_rsi_period")]
        rsi_period: usize,
        #[serde(default = "default_atr_period")]
        atr_period: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Breakout {
        #[serde(default = "default_band_period")]
        period: usize,
        #[serde(default = "default_atr_period")]
        atr_period: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    SpreadReversion {
        zscore_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

fn default_ma_type() -> MaType {
    MaType::Sma
}

fn default_atr_period() -> usize {
    14
}

fn default_band_period() -> usize {
    20
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_rsi_period() -> usize {
    14
}

impl StrategyKind {
    /// Registry name the created strategy will report.
    pub fn name(&self) -> &str {
        let (custom, default) = match self {
            StrategyKind::TrendFollowing { name, .. } => (name, TrendFollowing::DEFAULT_NAME),
            StrategyKind::MeanReversion { name, .. } => (name, MeanReversion::DEFAULT_NAME),
            StrategyKind::Breakout { name, .. } => (name, Breakout::DEFAULT_NAME),
            StrategyKind::SpreadReversion { name, .. } => (name, SpreadReversion::DEFAULT_NAME),
        };
        custom.as_deref().unwrap_or(default)
    }
}

/// Create a strategy from its kind.
pub fn create_strategy(kind: &StrategyKind) -> Result<Arc<dyn Strategy>> {
    let name = kind.name().to_string();
    let strategy: Arc<dyn Strategy> = match kind {
        StrategyKind::TrendFollowing {
            fast_period,
            slow_period,
            ma_type,
            atr_period,
            ..
        } => Arc::new(
            TrendFollowing::new(*fast_period, *slow_period, *ma_type, *atr_period)?.named(name),
        ),
        StrategyKind::MeanReversion {
            period,
            multiplier,
            rsi_period,
            atr_period,
            ..
        } => Arc::new(
            MeanReversion::new(*period, *multiplier, *rsi_period, *atr_period)?.named(name),
        ),
        StrategyKind::Breakout {
            period, atr_period, ..
        } => Arc::new(Breakout::new(*period, *atr_period)?.named(name)),
        StrategyKind::SpreadReversion { zscore_key, .. } => {
            Arc::new(SpreadReversion::new(zscore_key.as_str())?.named(name))
        }
    };
    Ok(strategy)
}

/// Library indicators a provider must compute for `kind`.
///
/// Spread z-scores are provider-specific and never come from the library.
/// A kind that `create_strategy` would reject contributes nothing.
pub fn indicators_for(kind: &StrategyKind) -> Vec<Box<dyn Indicator>> {
    if create_strategy(kind).is_err() {
        return Vec::new();
    }
    match kind {
        StrategyKind::TrendFollowing {
            fast_period,
            slow_period,
            ma_type,
            atr_period,
            ..
        } => {
            let (fast, slow): (Box<dyn Indicator>, Box<dyn Indicator>) = match ma_type {
                MaType::Sma => (Box::new(Sma::new(*fast_period)), Box::new(Sma::new(*slow_period))),
                MaType::Ema => (Box::new(Ema::new(*fast_period)), Box::new(Ema::new(*slow_period))),
            };
            vec![fast, slow, Box::new(Atr::new(*atr_period))]
        }
        StrategyKind::MeanReversion {
            period,
            multiplier,
            rsi_period,
            atr_period,
            ..
        } => vec![
            Box::new(Bollinger::upper(*period, *multiplier)),
            Box::new(Bollinger::lower(*period, *multiplier)),
            Box::new(Rsi::new(*rsi_period)),
            Box::new(Atr::new(*atr_period)),
        ],
        StrategyKind::Breakout {
            period, atr_period, ..
        } => vec![
            Box::new(Donchian::upper(*period)),
            Box::new(Donchian::lower(*period)),
            Box::new(Atr::new(*atr_period)),
        ],
        StrategyKind::SpreadReversion { .. } => Vec::new(),
    }
}

/// Deduplicated library indicators for a set of strategy kinds, by name.
pub fn indicator_set(kinds: &[StrategyKind]) -> Vec<Box<dyn Indicator>> {
    let mut seen = BTreeSet::new();
    kinds
        .iter()
        .flat_map(indicators_for)
        .filter(|ind| seen.insert(ind.name().to_string()))
        .collect()
}

/// Union of every indicator key the given strategies require.
pub fn required_indicator_set(kinds: &[StrategyKind]) -> Result<BTreeSet<String>> {
    let mut keys = BTreeSet::new();
    for kind in kinds {
        keys.extend(create_strategy(kind)?.required_indicators());
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn trend() -> StrategyKind {
        StrategyKind::TrendFollowing {
            fast_period: 10,
            slow_period: 50,
            ma_type: MaType::Ema,
            atr_period: 14,
            name: None,
        }
    }

    #[test]
    fn creates_each_kind() {
        let kinds = [
            trend(),
            StrategyKind::MeanReversion {
                period: 20,
                multiplier: 2.0,
                rsi_period: 14,
                atr_period: 14,
                name: None,
            },
            StrategyKind::Breakout {
                period: 20,
                atr_period: 14,
                name: Some("breakout_20".into()),
            },
            StrategyKind::SpreadReversion {
                zscore_key: "basis_z".into(),
                name: None,
            },
        ];
        let names: Vec<String> = kinds
            .iter()
            .map(|k| create_strategy(k).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            ["trend_following", "mean_reversion", "breakout_20", "spread_reversion"]
        );
    }

    #[test]
    fn invalid_kind_is_an_error() {
        let kind = StrategyKind::TrendFollowing {
            fast_period: 50,
            slow_period: 10,
            ma_type: MaType::Sma,
            atr_period: 14,
            name: None,
        };
        assert!(matches!(
            create_strategy(&kind),
            Err(Error::InvalidParameter(_))
        ));
        assert!(indicators_for(&kind).is_empty());

        let zero = StrategyKind::Breakout {
            period: 0,
            atr_period: 14,
            name: None,
        };
        assert!(indicators_for(&zero).is_empty());
    }

    #[test]
    fn library_covers_required_keys() {
        let kinds = [
            trend(),
            StrategyKind::Breakout {
                period: 20,
                atr_period: 14,
                name: None,
            },
        ];
        let computed: BTreeSet<String> = indicator_set(&kinds)
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        let required = required_indicator_set(&kinds).unwrap();
        assert_eq!(computed, required);
    }

    #[test]
    fn shared_atr_is_deduplicated() {
        let kinds = [
            trend(),
            StrategyKind::Breakout {
                period: 20,
                atr_period: 14,
                name: None,
            },
        ];
        let atr_count = indicator_set(&kinds)
            .iter()
            .filter(|i| i.name() == "atr_14")
            .count();
        assert_eq!(atr_count, 1);
    }

    #[test]
    fn deserializes_with_defaults() {
        let kind: StrategyKind =
            serde_json::from_str(r#"{"type":"trend_following","fast_period":5,"slow_period":20}"#)
                .unwrap();
        assert_eq!(
            kind,
            StrategyKind::TrendFollowing {
                fast_period: 5,
                slow_period: 20,
                ma_type: MaType::Sma,
                atr_period: 14,
                name: None,
            }
        );
    }
}
