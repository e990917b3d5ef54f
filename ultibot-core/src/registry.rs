//! Strategy registry — the set of strategies, their parameters and enable state.
//!
//! The registry is the only shared mutable structure in the core. It follows a
//! single-writer / multi-reader copy-on-write discipline: readers clone an
//! `Arc` to the current state, writers build a modified copy under the write
//! lock and swap it in only after every check passed. A reader therefore sees
//! either the old state or the new one, never a half-applied update.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::components::strategy::Strategy;
use crate::domain::StrategyParameters;
use crate::error::{Error, Result};

/// One registered strategy with its current parameters.
#[derive(Clone)]
pub struct RegisteredStrategy {
    pub strategy: Arc<dyn Strategy>,
    pub params: Arc<StrategyParameters>,
    /// Registration sequence number; lower registered earlier.
    pub rank: usize,
}

impl RegisteredStrategy {
    pub fn name(&self) -> &str {
        self.strategy.name()
    }
}

impl fmt::Debug for RegisteredStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredStrategy")
            .field("name", &self.strategy.name())
            .field("params", &self.params)
            .field("rank", &self.rank)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
struct RegistryState {
    /// Registration order.
    entries: Vec<RegisteredStrategy>,
    next_rank: usize,
}

impl RegistryState {
    fn position(&self, name: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.name() == name)
            .ok_or_else(|| Error::StrategyNotFound(name.to_string()))
    }
}

/// Consistent, immutable view of the registry at one instant.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    state: Arc<RegistryState>,
}

impl RegistrySnapshot {
    /// All entries in registration order.
    pub fn entries(&self) -> &[RegisteredStrategy] {
        &self.state.entries
    }

    /// Enabled entries in registration order.
    pub fn enabled(&self) -> impl Iterator<Item = &RegisteredStrategy> {
        self.state.entries.iter().filter(|e| e.params.enabled)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredStrategy> {
        self.state.entries.iter().find(|e| e.name() == name)
    }

    /// Registration rank of every strategy, keyed by name.
    pub fn ranks(&self) -> BTreeMap<String, usize> {
        self.state
            .entries
            .iter()
            .map(|e| (e.name().to_string(), e.rank))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }
}

/// Thread-safe strategy registry. Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    state: RwLock<Arc<RegistryState>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a consistent snapshot of the current state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        RegistrySnapshot {
            state: Arc::clone(&guard),
        }
    }

    /// Apply `change` to a copy of the state and publish it only on success.
    fn write<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut RegistryState) -> Result<()>,
    {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = RegistryState::clone(&guard);
        change(&mut next)?;
        *guard = Arc::new(next);
        Ok(())
    }

    /// Add a strategy under its `name()`.
    ///
    /// Fails with `DuplicateStrategy` if the name is taken and with
    /// `InvalidParameter` if `params` are invalid or name another strategy.
    pub fn register(&self, strategy: Arc<dyn Strategy>, params: StrategyParameters) -> Result<()> {
        let name = strategy.name().to_string();
        check_params(&name, &params)?;
        let fingerprint = params.fingerprint();
        self.write(|state| {
            if state.entries.iter().any(|e| e.name() == name) {
                return Err(Error::DuplicateStrategy(name.clone()));
            }
            let rank = state.next_rank;
            state.next_rank += 1;
            state.entries.push(RegisteredStrategy {
                strategy,
                params: Arc::new(params),
                rank,
            });
            Ok(())
        })?;
        info!(strategy = %name, params = fingerprint.short(), "registered strategy");
        Ok(())
    }

    /// Look up a strategy by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Strategy>> {
        self.snapshot()
            .get(name)
            .map(|e| Arc::clone(&e.strategy))
            .ok_or_else(|| Error::StrategyNotFound(name.to_string()))
    }

    /// Current parameters of a strategy.
    pub fn parameters(&self, name: &str) -> Result<StrategyParameters> {
        self.snapshot()
            .get(name)
            .map(|e| StrategyParameters::clone(&e.params))
            .ok_or_else(|| Error::StrategyNotFound(name.to_string()))
    }

    /// Enabled strategies in registration order.
    pub fn list_enabled(&self) -> Vec<Arc<dyn Strategy>> {
        self.snapshot()
            .enabled()
            .map(|e| Arc::clone(&e.strategy))
            .collect()
    }

    /// Replace a strategy's parameters atomically.
    ///
    /// On any error the registry is left exactly as it was.
    pub fn update_parameters(&self, name: &str, params: StrategyParameters) -> Result<()> {
        check_params(name, &params)?;
        let fingerprint = params.fingerprint();
        self.write(|state| {
            let idx = state.position(name)?;
            state.entries[idx].params = Arc::new(params);
            Ok(())
        })?;
        info!(strategy = name, params = fingerprint.short(), "updated strategy parameters");
        Ok(())
    }

    /// Flip the enabled flag, keeping every other parameter.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        self.write(|state| {
            let idx = state.position(name)?;
            let params = StrategyParameters::clone(&state.entries[idx].params).with_enabled(enabled);
            state.entries[idx].params = Arc::new(params);
            Ok(())
        })?;
        debug!(strategy = name, enabled, "toggled strategy");
        Ok(())
    }

    /// Remove a strategy and drop its parameters.
    pub fn deregister(&self, name: &str) -> Result<()> {
        self.write(|state| {
            let idx = state.position(name)?;
            state.entries.remove(idx);
            Ok(())
        })?;
        info!(strategy = name, "deregistered strategy");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

fn check_params(name: &str, params: &StrategyParameters) -> Result<()> {
    if params.strategy_id != name {
        return Err(Error::InvalidParameter(format!(
            "parameters for `{}` cannot be attached to `{name}`",
            params.strategy_id
        )));
    }
    params.validate()
}
