//! Evaluation pipeline — one cycle of evaluate-then-aggregate across symbols.
//!
//! Each cycle takes a single registry snapshot, evaluates every enabled
//! strategy against every market snapshot (symbols in parallel, strategies in
//! registration order), and aggregates the surviving signals per symbol.
//! A strategy that fails is recorded and skipped; it never sinks the symbol.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use ultibot_core::aggregator::{AggregationResult, SignalAggregator};
use ultibot_core::domain::{MarketSnapshot, Signal, Timeframe};
use ultibot_core::policy::{ConfidencePolicy, TradingMode};
use ultibot_core::registry::{RegisteredStrategy, StrategyRegistry};

/// A strategy that could not produce a signal for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyFailure {
    pub strategy: String,
    pub error: String,
    /// Missing data or bad parameters, as opposed to a defect.
    pub recoverable: bool,
}

/// What the aggregator made of one symbol's signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Aggregated { result: AggregationResult },
    /// Every strategy failed, so there was nothing to aggregate.
    NoSignals,
}

/// Per-symbol section of a cycle report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub as_of: Option<DateTime<Utc>>,
    pub signals: Vec<Signal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<StrategyFailure>,
    pub outcome: SymbolOutcome,
}

impl SymbolReport {
    pub fn accepted(&self) -> Option<&Signal> {
        match &self.outcome {
            SymbolOutcome::Aggregated { result } => result.accepted(),
            SymbolOutcome::NoSignals => None,
        }
    }
}

/// Result of one evaluation cycle, ordered by symbol then timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub mode: TradingMode,
    /// Enabled strategies in the registry snapshot the cycle used.
    pub strategies: Vec<String>,
    pub symbols: Vec<SymbolReport>,
}

impl CycleReport {
    /// Accepted signals across all symbols.
    pub fn accepted(&self) -> impl Iterator<Item = &Signal> {
        self.symbols.iter().filter_map(SymbolReport::accepted)
    }

    /// Every `(symbol, failure)` pair in the cycle.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &StrategyFailure)> {
        self.symbols
            .iter()
            .flat_map(|s| s.failures.iter().map(move |f| (s.symbol.as_str(), f)))
    }

    pub fn symbol(&self, symbol: &str) -> Option<&SymbolReport> {
        self.symbols.iter().find(|s| s.symbol == symbol)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize cycle report")
    }
}

/// Evaluation pipeline over a shared registry.
///
/// The policy and mode are fixed per pipeline; build a new one (or call
/// `set_policy`) between cycles to reload thresholds.
#[derive(Debug, Clone)]
pub struct EvaluationPipeline {
    registry: Arc<StrategyRegistry>,
    policy: ConfidencePolicy,
    mode: TradingMode,
    parallel: bool,
}

impl EvaluationPipeline {
    pub fn new(registry: Arc<StrategyRegistry>, policy: ConfidencePolicy, mode: TradingMode) -> Self {
        Self {
            registry,
            policy,
            mode,
            parallel: true,
        }
    }

    /// Enable or disable per-symbol parallelism.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    pub fn policy(&self) -> &ConfidencePolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: ConfidencePolicy) {
        self.policy = policy;
    }

    pub fn mode(&self) -> TradingMode {
        self.mode
    }

    /// Indicator keys the enabled strategies need on every snapshot.
    pub fn required_indicators(&self) -> BTreeSet<String> {
        self.registry
            .snapshot()
            .enabled()
            .flat_map(|e| e.strategy.required_indicators())
            .collect()
    }

    /// Evaluate and aggregate every snapshot once.
    pub fn run_cycle(&self, snapshots: &[MarketSnapshot]) -> CycleReport {
        let registry = self.registry.snapshot();
        let aggregator = SignalAggregator::from_registry(&registry);
        let enabled: Vec<&RegisteredStrategy> = registry.enabled().collect();

        let mut symbols: Vec<SymbolReport> = if self.parallel {
            snapshots
                .par_iter()
                .map(|snap| self.evaluate_symbol(snap, &enabled, &aggregator))
                .collect()
        } else {
            snapshots
                .iter()
                .map(|snap| self.evaluate_symbol(snap, &enabled, &aggregator))
                .collect()
        };
        symbols.sort_by(|a, b| {
            a.symbol
                .cmp(&b.symbol)
                .then_with(|| a.timeframe.cmp(&b.timeframe))
        });

        let report = CycleReport {
            mode: self.mode,
            strategies: enabled.iter().map(|e| e.name().to_string()).collect(),
            symbols,
        };
        info!(
            mode = %self.mode,
            symbols = report.symbols.len(),
            strategies = report.strategies.len(),
            accepted = report.accepted().count(),
            failures = report.failures().count(),
            "evaluation cycle complete"
        );
        report
    }

    fn evaluate_symbol(
        &self,
        snapshot: &MarketSnapshot,
        strategies: &[&RegisteredStrategy],
        aggregator: &SignalAggregator,
    ) -> SymbolReport {
        let mut signals = Vec::with_capacity(strategies.len());
        let mut failures = Vec::new();

        for entry in strategies {
            match entry.strategy.evaluate(snapshot, &entry.params) {
                Ok(signal) => signals.push(signal),
                Err(e) => {
                    let recoverable = e.is_strategy_local();
                    if recoverable {
                        warn!(strategy = entry.name(), symbol = snapshot.symbol(), error = %e, "strategy skipped");
                    } else {
                        error!(strategy = entry.name(), symbol = snapshot.symbol(), error = %e, "strategy failed");
                    }
                    failures.push(StrategyFailure {
                        strategy: entry.name().to_string(),
                        error: e.to_string(),
                        recoverable,
                    });
                }
            }
        }

        // Aggregation only fails on an empty batch.
        let outcome = match aggregator.aggregate(&signals, self.mode, &self.policy) {
            Ok(result) => SymbolOutcome::Aggregated { result },
            Err(_) => SymbolOutcome::NoSignals,
        };
        debug!(
            symbol = snapshot.symbol(),
            signals = signals.len(),
            failures = failures.len(),
            "symbol evaluated"
        );

        SymbolReport {
            symbol: snapshot.symbol().to_string(),
            timeframe: snapshot.timeframe(),
            as_of: snapshot.as_of(),
            signals,
            failures,
            outcome,
        }
    }
}
