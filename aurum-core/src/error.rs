//! Errors raised by the analysis stages.

use thiserror::Error;

use crate::config::{ConfigError, SeriesRole};

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A required primary series is absent or has no bars.
    #[error("required {role} series for '{symbol}' is missing or empty")]
    DataUnavailable { role: SeriesRole, symbol: String },

    /// An indicator the scoring engine depends on is NaN at the latest bar,
    /// usually because the series is shorter than the indicator window.
    #[error("{indicator} is undefined on the {role} series ({bars} bars, needs at least {needed})")]
    UndefinedIndicator {
        indicator: &'static str,
        role: SeriesRole,
        bars: usize,
        needed: usize,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
