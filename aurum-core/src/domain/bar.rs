//! Bar and Series: the fundamental market data units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::timeframe::Timeframe;

/// OHLCV bar for a single symbol at a single timestamp.
///
/// Bars are immutable once obtained from a provider. Volume is kept as `f64`
/// because it only ever feeds averages and histogram weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= 0.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("{symbol} {timeframe}: timestamps not strictly increasing at index {index}")]
    NotIncreasing {
        symbol: String,
        timeframe: Timeframe,
        index: usize,
    },
}

/// Ordered bars for one (symbol, timeframe) pair.
///
/// Timestamps are strictly increasing. Gaps are allowed: every rolling window
/// in this crate works on index position, not wall-clock spacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct Series {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

/// Unchecked wire form; deserialization goes through `Series::new`.
#[derive(Deserialize)]
struct RawSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl TryFrom<RawSeries> for Series {
    type Error = SeriesError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        Series::new(raw.symbol, raw.timeframe, raw.bars)
    }
}

impl Series {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if let Some(index) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SeriesError::NotIncreasing {
                symbol,
                timeframe,
                index: index + 1,
            });
        }
        Ok(Self {
            symbol,
            timeframe,
            bars,
        })
    }

    /// An empty series; the pipeline rejects these for required roles.
    pub fn empty(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// The trailing `n` bars (all bars if the series is shorter).
    pub fn tail(&self, n: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }
}
