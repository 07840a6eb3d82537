//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (Yahoo chart API, CSV
//! files) so the runner can swap implementations and tests can mock them.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{Series, SeriesError, Timeframe};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no {timeframe} data for '{symbol}'")]
    Empty { symbol: String, timeframe: Timeframe },

    #[error("csv error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid row {row} in {}: {reason}", path.display())]
    InvalidRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Errors that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_) | DataError::RateLimited { .. }
        )
    }
}

/// Trait for bar sources (Yahoo Finance, CSV directory, ...).
///
/// `fetch` returns bars at exactly `timeframe`, covering roughly the trailing
/// `lookback_days`. Implementations resample when the source has no native
/// interval for the requested timeframe.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        lookback_days: u32,
    ) -> Result<Series, DataError>;
}

impl<P: DataProvider + ?Sized> DataProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        lookback_days: u32,
    ) -> Result<Series, DataError> {
        (**self).fetch(symbol, timeframe, lookback_days)
    }
}
