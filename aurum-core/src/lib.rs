//! Aurum Core: indicators, multi-timeframe analyzers and the signal scoring engine.
//!
//! This crate contains the compute side of the gold signal pipeline:
//! - Domain types (bars, series, timeframes, resampling)
//! - Indicator trait with RSI, SMA deviation, ATR, EWMA trend and rolling extremes
//! - First-stage analyzers (indicator snapshot, proxy correlation, CISD levels,
//!   volume-profile vacuum zones, fast-timeframe sync)
//! - Composite scoring, classification and the `Report` record
//! - Data boundary (provider trait, Yahoo chart provider, CSV directory provider)
//!
//! Everything here is synchronous and free of shared mutable state; the
//! runner crate decides how stages are scheduled.

pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod report;

pub use analysis::{analyze, assemble, AnalysisInputs, ReportMeta, StageOutputs};
pub use config::{AnalysisConfig, ConfigError, SeriesRole};
pub use error::AnalysisError;
pub use report::{Report, SCHEMA_VERSION};
