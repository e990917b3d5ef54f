//! Desk configuration — trading mode, confidence thresholds and the strategy set.
//!
//! ```toml
//! mode = "paper"
//!
//! [thresholds]
//! paper_trading_min = 0.70
//! real_trading_min = 0.95
//!
//! [thresholds.overrides.breakout_h1]
//! paper = 0.60
//!
//! [[strategies]]
//! kind = { type = "breakout", period = 20, name = "breakout_h1" }
//! params = { min_volatility_percentile = 10.0, max_volatility_percentile = 90.0 }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use ultibot_core::components::{create_strategy, indicator_set, Indicator, StrategyKind};
use ultibot_core::domain::{ParamValue, StrategyParameters};
use ultibot_core::policy::{ConfidencePolicy, ConfidenceThresholds, TradingMode};
use ultibot_core::registry::StrategyRegistry;

use crate::pipeline::EvaluationPipeline;

/// One configured strategy instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyEntry {
    pub kind: StrategyKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, ParamValue>,
}

fn default_enabled() -> bool {
    true
}

impl StrategyEntry {
    /// Registry parameters for this entry, keyed by the strategy's name.
    pub fn parameters(&self) -> StrategyParameters {
        StrategyParameters {
            strategy_id: self.kind.name().to_string(),
            values: self.params.clone(),
            enabled: self.enabled,
        }
    }
}

/// Everything the desk needs to run evaluation cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default = "default_mode")]
    pub mode: TradingMode,
    #[serde(default)]
    pub thresholds: ConfidenceThresholds,
    #[serde(default)]
    pub strategies: Vec<StrategyEntry>,
}

fn default_mode() -> TradingMode {
    TradingMode::Paper
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            thresholds: ConfidenceThresholds::default(),
            strategies: Vec::new(),
        }
    }
}

impl DeskConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read desk config {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid desk config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse desk config TOML")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize desk config")
    }

    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind.clone()).collect()
    }

    /// Library indicators a market-data provider must compute for this desk.
    pub fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        indicator_set(&self.kinds())
    }

    /// Validate thresholds, register every strategy and return the pipeline.
    ///
    /// Core validation errors stay reachable through `downcast_ref::<ultibot_core::Error>()`.
    pub fn build(&self) -> Result<EvaluationPipeline> {
        self.thresholds
            .validate_operating_bounds()
            .context("Confidence thresholds outside operating bounds")?;
        let policy = ConfidencePolicy::new(self.thresholds.clone())?;

        let registry = StrategyRegistry::new();
        for entry in &self.strategies {
            let name = entry.kind.name();
            let strategy = create_strategy(&entry.kind)
                .with_context(|| format!("Failed to build strategy `{name}`"))?;
            registry
                .register(strategy, entry.parameters())
                .with_context(|| format!("Failed to register strategy `{name}`"))?;
        }

        for name in self.thresholds.overrides.keys() {
            if registry.get(name).is_err() {
                warn!(strategy = %name, "threshold override for unconfigured strategy");
            }
        }
        info!(
            mode = %self.mode,
            strategies = registry.len(),
            enabled = registry.list_enabled().len(),
            "desk configured"
        );

        Ok(EvaluationPipeline::new(Arc::new(registry), policy, self.mode))
    }
}
