//! Simple Moving Average (SMA) and close-to-average deviation.
//!
//! Rolling mean of close prices over a trailing window.
//! Lookback: period - 1 (first valid value at index period-1).

use crate::domain::Bar;
use crate::indicators::stats::rolling_mean;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    /// Percent deviation of each close from its SMA: (close - sma) / sma * 100.
    pub fn deviation(&self, bars: &[Bar]) -> Vec<f64> {
        self.compute(bars)
            .iter()
            .zip(bars)
            .map(|(sma, bar)| (bar.close - sma) / sma * 100.0)
            .collect()
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rolling_mean(&closes, self.period)
    }
}
