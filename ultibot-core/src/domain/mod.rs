//! Domain types for the evaluation core.

pub mod bar;
pub mod params;
pub mod signal;
pub mod snapshot;
pub mod timeframe;

pub use bar::Bar;
pub use params::{
    ParamValue, StrategyParameters, MAX_VOLATILITY_PERCENTILE, MIN_VOLATILITY_PERCENTILE,
    VOLATILITY_LOOKBACK,
};
pub use signal::{Direction, Signal, VOLATILITY_FILTER_FAILED};
pub use snapshot::MarketSnapshot;
pub use timeframe::Timeframe;
