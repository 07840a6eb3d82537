//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR is the plain trailing mean of the per-bar range over `period` bars.
//! Lookback: period (true range needs a previous close). The high-low mode
//! has no such dependency and a lookback of period - 1.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::indicators::stats::rolling_mean;
use crate::indicators::Indicator;

/// Which per-bar range feeds the average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtrMode {
    /// Full true range, incorporating the previous close.
    #[default]
    TrueRange,
    /// Simplified high - low range.
    HighLow,
}

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    mode: AtrMode,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self::with_mode(period, AtrMode::TrueRange)
    }

    pub fn with_mode(period: usize, mode: AtrMode) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        let name = match mode {
            AtrMode::TrueRange => format!("atr_{period}"),
            AtrMode::HighLow => format!("atr_hl_{period}"),
        };
        Self { period, mode, name }
    }

    /// ATR at the latest bar strictly above ATR one bar earlier.
    /// False whenever either value is undefined.
    pub fn is_expanding(&self, bars: &[Bar]) -> bool {
        let atr = self.compute(bars);
        match atr.as_slice() {
            [.., prev, last] => last > prev,
            _ => false,
        }
    }
}

/// Compute the True Range series from bars.
/// TR[0] = NaN (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];

    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            continue;
        }
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }

    tr
}

/// high - low per bar.
pub fn high_low_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.high - b.low).collect()
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.mode {
            AtrMode::TrueRange => self.period,
            AtrMode::HighLow => self.period - 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let ranges = match self.mode {
            AtrMode::TrueRange => true_range(bars),
            AtrMode::HighLow => high_low_range(bars),
        };
        rolling_mean(&ranges, self.period)
    }
}
