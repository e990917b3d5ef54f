//! Evaluation components.
//!
//! - Indicator trait and cache: precomputed numeric series on the snapshot
//! - Volatility gate: percentile-band precondition for gated strategies
//! - Strategy trait and its four variants
//! - Factory: serializable strategy kinds → runtime trait objects

pub mod factory;
pub mod indicator;
pub mod strategy;
pub mod volatility;

pub use factory::{create_strategy, indicator_set, indicators_for, required_indicator_set, StrategyKind};
pub use indicator::{Indicator, IndicatorCache};
pub use strategy::{Breakout, MaType, MeanReversion, SpreadReversion, Strategy, TrendFollowing};
pub use volatility::{VolatilityGate, VolatilityGateResult};
