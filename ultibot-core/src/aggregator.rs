//! Signal aggregation — turns a batch of strategy signals into one verdict.
//!
//! HOLD signals are dropped, the rest are checked against the confidence
//! policy for the trading mode, and the most confident survivor wins. Ties go
//! to the strategy registered first, which keeps the verdict reproducible.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::domain::Signal;
use crate::error::{Error, Result};
use crate::policy::{ConfidencePolicy, TradingMode};
use crate::registry::RegistrySnapshot;

/// Why no signal was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    BelowConfidenceThreshold,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::BelowConfidenceThreshold => "below_confidence_threshold",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict handed to the execution side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum AggregationResult {
    Accepted {
        signal: Signal,
    },
    Rejected {
        reason: RejectionReason,
        /// Most confident non-HOLD signal that was discarded, if any.
        best_signal_considered: Option<Signal>,
    },
}

impl AggregationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AggregationResult::Accepted { .. })
    }

    /// The accepted signal, if any.
    pub fn accepted(&self) -> Option<&Signal> {
        match self {
            AggregationResult::Accepted { signal } => Some(signal),
            AggregationResult::Rejected { .. } => None,
        }
    }
}

/// Confidence-gated signal selector.
///
/// Carries an optional registration-rank table for tie-breaking. Strategies
/// missing from the table rank after every known one, in input order.
#[derive(Debug, Clone, Default)]
pub struct SignalAggregator {
    ranks: BTreeMap<String, usize>,
}

impl SignalAggregator {
    /// Aggregator that breaks ties by input position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator that breaks ties by registration order.
    pub fn from_registry(snapshot: &RegistrySnapshot) -> Self {
        Self::with_ranks(snapshot.ranks())
    }

    pub fn with_ranks(ranks: BTreeMap<String, usize>) -> Self {
        Self { ranks }
    }

    /// Select one signal from `signals` for `mode`.
    ///
    /// Fails with `EmptyInput` when `signals` is empty. A batch where nothing
    /// clears its threshold is a `Rejected` result, not an error.
    pub fn aggregate(
        &self,
        signals: &[Signal],
        mode: TradingMode,
        policy: &ConfidencePolicy,
    ) -> Result<AggregationResult> {
        if signals.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut best_accepted: Option<(usize, &Signal)> = None;
        let mut best_discarded: Option<(usize, &Signal)> = None;

        for (position, signal) in signals.iter().enumerate() {
            if !signal.direction().is_actionable() {
                continue;
            }
            let minimum = policy.minimum_for(signal.strategy_name(), mode);
            let slot = if signal.confidence() >= minimum {
                &mut best_accepted
            } else {
                debug!(
                    strategy = signal.strategy_name(),
                    symbol = signal.symbol(),
                    confidence = signal.confidence(),
                    minimum,
                    %mode,
                    "signal below confidence threshold"
                );
                &mut best_discarded
            };
            if slot.map_or(true, |current| self.beats((position, signal), current)) {
                *slot = Some((position, signal));
            }
        }

        let result = match best_accepted {
            Some((_, signal)) => AggregationResult::Accepted {
                signal: signal.clone(),
            },
            None => AggregationResult::Rejected {
                reason: RejectionReason::BelowConfidenceThreshold,
                best_signal_considered: best_discarded.map(|(_, s)| s.clone()),
            },
        };

        match &result {
            AggregationResult::Accepted { signal } => debug!(
                strategy = signal.strategy_name(),
                symbol = signal.symbol(),
                direction = %signal.direction(),
                confidence = signal.confidence(),
                %mode,
                "signal accepted"
            ),
            AggregationResult::Rejected { reason, .. } => {
                debug!(%reason, %mode, candidates = signals.len(), "no signal accepted")
            }
        }
        Ok(result)
    }

    /// Aggregate each symbol's signals separately.
    ///
    /// Fails with `EmptyInput` only when `signals` is empty as a whole.
    pub fn aggregate_by_symbol(
        &self,
        signals: &[Signal],
        mode: TradingMode,
        policy: &ConfidencePolicy,
    ) -> Result<BTreeMap<String, AggregationResult>> {
        if signals.is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut grouped: BTreeMap<&str, Vec<Signal>> = BTreeMap::new();
        for signal in signals {
            grouped
                .entry(signal.symbol())
                .or_default()
                .push(signal.clone());
        }
        grouped
            .into_iter()
            .map(|(symbol, batch)| Ok((symbol.to_string(), self.aggregate(&batch, mode, policy)?)))
            .collect()
    }

    /// Higher confidence wins; equal confidence goes to the lower rank.
    fn beats(&self, challenger: (usize, &Signal), incumbent: (usize, &Signal)) -> bool {
        match challenger.1.confidence().total_cmp(&incumbent.1.confidence()) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => self.rank(challenger) < self.rank(incumbent),
        }
    }

    fn rank(&self, (position, signal): (usize, &Signal)) -> (usize, usize) {
        let registered = self
            .ranks
            .get(signal.strategy_name())
            .copied()
            .unwrap_or(usize::MAX);
        (registered, position)
    }
}
