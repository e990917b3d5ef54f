//! UltiBot Core — strategy evaluation, volatility gating and signal aggregation.
//!
//! This crate is the decision core of the trading desk:
//! - Domain types (bars, market snapshots, parameters, signals)
//! - Indicator library and per-snapshot indicator cache
//! - Percentile volatility gate
//! - Strategy trait with trend-following, mean-reversion, breakout and spread variants
//! - Strategy registry with copy-on-write snapshots
//! - Confidence policy and the signal aggregator
//!
//! Market data, order execution and persistence live outside this crate.

pub mod aggregator;
pub mod components;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod indicators;
pub mod policy;
pub mod registry;

pub use error::{Error, Result};
