//! UltiBot Runner — desk configuration and the parallel evaluation pipeline.
//!
//! This crate builds on `ultibot-core` to provide:
//! - TOML desk configuration (mode, thresholds, strategy set)
//! - Evaluation cycles over many symbols with per-strategy failure isolation
//! - Serializable cycle reports for the execution side

pub mod config;
pub mod pipeline;

pub use config::{DeskConfig, StrategyEntry};
pub use pipeline::{CycleReport, EvaluationPipeline, StrategyFailure, SymbolOutcome, SymbolReport};
