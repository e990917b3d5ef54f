//! Confidence policy — minimum confidence per trading mode and per strategy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Paper (simulated) or real (live capital) execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Paper,
    Real,
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TradingMode::Paper => "paper",
            TradingMode::Real => "real",
        })
    }
}

/// Per-strategy threshold override; absent modes fall back to the global default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real: Option<f64>,
}

impl ThresholdOverride {
    pub fn for_mode(&self, mode: TradingMode) -> Option<f64> {
        match mode {
            TradingMode::Paper => self.paper,
            TradingMode::Real => self.real,
        }
    }
}

/// Operator bounds for `paper_trading_min`.
pub const PAPER_MIN_RANGE: (f64, f64) = (0.50, 0.95);
/// Operator floor for `real_trading_min`.
pub const REAL_MIN_FLOOR: f64 = 0.85;

/// Minimum confidence per mode, plus optional per-strategy overrides.
///
/// Loaded once per evaluation cycle and not changed while the cycle runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    #[serde(default = "default_paper_min")]
    pub paper_trading_min: f64,
    #[serde(default = "default_real_min")]
    pub real_trading_min: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, ThresholdOverride>,
}

fn default_paper_min() -> f64 {
    0.75
}

fn default_real_min() -> f64 {
    0.95
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            paper_trading_min: default_paper_min(),
            real_trading_min: default_real_min(),
            overrides: BTreeMap::new(),
        }
    }
}

impl ConfidenceThresholds {
    pub fn with_override(
        mut self,
        strategy: impl Into<String>,
        mode: TradingMode,
        value: f64,
    ) -> Self {
        let entry = self.overrides.entry(strategy.into()).or_default();
        match mode {
            TradingMode::Paper => entry.paper = Some(value),
            TradingMode::Real => entry.real = Some(value),
        }
        self
    }

    /// Every configured value must lie in [0, 1].
    pub fn validate(&self) -> Result<()> {
        check_unit("paper_trading_min", self.paper_trading_min)?;
        check_unit("real_trading_min", self.real_trading_min)?;
        for (name, ov) in &self.overrides {
            if let Some(v) = ov.paper {
                check_unit(&format!("overrides.{name}.paper"), v)?;
            }
            if let Some(v) = ov.real {
                check_unit(&format!("overrides.{name}.real"), v)?;
            }
        }
        Ok(())
    }

    /// Operator bounds: paper in [0.50, 0.95], real >= 0.85.
    ///
    /// Stricter than `validate`; applied when loading operator configuration.
    /// A real minimum below the paper minimum is still allowed.
    pub fn validate_operating_bounds(&self) -> Result<()> {
        self.validate()?;
        let (lo, hi) = PAPER_MIN_RANGE;
        if !(lo..=hi).contains(&self.paper_trading_min) {
            return Err(Error::InvalidThreshold(format!(
                "paper_trading_min must be in [{lo}, {hi}], got {}",
                self.paper_trading_min
            )));
        }
        if self.real_trading_min < REAL_MIN_FLOOR {
            return Err(Error::InvalidThreshold(format!(
                "real_trading_min must be >= {REAL_MIN_FLOOR}, got {}",
                self.real_trading_min
            )));
        }
        Ok(())
    }
}

fn check_unit(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidThreshold(format!(
            "{field} must be in [0, 1], got {value}"
        )))
    }
}

/// Validated thresholds answering "how confident must this signal be?".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfidencePolicy {
    thresholds: ConfidenceThresholds,
}

impl ConfidencePolicy {
    /// Fails with `InvalidThreshold` when any value is outside [0, 1] or the
    /// real-mode default sits below `REAL_MIN_FLOOR`.
    ///
    /// Per-strategy real overrides only need to lie in [0, 1].
    pub fn new(thresholds: ConfidenceThresholds) -> Result<Self> {
        thresholds.validate()?;
        if thresholds.real_trading_min < REAL_MIN_FLOOR {
            return Err(Error::InvalidThreshold(format!(
                "real_trading_min must be >= {REAL_MIN_FLOOR}, got {}",
                thresholds.real_trading_min
            )));
        }
        Ok(Self { thresholds })
    }

    /// Strategy override for `mode` if present, else the mode's default.
    pub fn minimum_for(&self, strategy_name: &str, mode: TradingMode) -> f64 {
        self.thresholds
            .overrides
            .get(strategy_name)
            .and_then(|ov| ov.for_mode(mode))
            .unwrap_or(match mode {
                TradingMode::Paper => self.thresholds.paper_trading_min,
                TradingMode::Real => self.thresholds.real_trading_min,
            })
    }

    pub fn thresholds(&self) -> &ConfidenceThresholds {
        &self.thresholds
    }
}
