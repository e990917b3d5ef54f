//! Error taxonomy for the evaluation core.
//!
//! Every variant is a deterministic local validation failure: the same input
//! produces the same error, so none of them are retried.

/// Errors raised by the gate, strategies, registry, policy and aggregator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("missing indicator(s): {}", .0.join(", "))]
    MissingIndicator(Vec<String>),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("strategy already registered: {0}")]
    DuplicateStrategy(String),
    #[error("strategy not found: {0}")]
    StrategyNotFound(String),
    #[error("invalid confidence threshold: {0}")]
    InvalidThreshold(String),
    #[error("no signals to aggregate")]
    EmptyInput,
}

impl Error {
    /// Whether the error belongs to a single strategy evaluation.
    ///
    /// The pipeline skips these with a warning. Anything else coming out of a
    /// strategy points at a defect and is logged as an error.
    pub fn is_strategy_local(&self) -> bool {
        matches!(
            self,
            Self::MissingIndicator(_) | Self::InvalidParameter(_) | Self::InsufficientData(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
