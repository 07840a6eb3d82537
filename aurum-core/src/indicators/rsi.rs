//! Relative Strength Index (RSI).
//!
//! Average gain and average loss are plain arithmetic means over the trailing
//! `period` changes (no Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 and avg_gain > 0 → RSI = 100 exactly;
//! both zero → NaN (undefined).

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period + 1 {
            return result;
        }

        let mut gains = vec![f64::NAN; n];
        let mut losses = vec![f64::NAN; n];
        for i in 1..n {
            let change = bars[i].close - bars[i - 1].close;
            if change.is_nan() {
                continue;
            }
            gains[i] = change.max(0.0);
            losses[i] = (-change).max(0.0);
        }

        for i in self.period..n {
            let window = (i + 1 - self.period)..=i;
            let avg_gain = gains[window.clone()].iter().sum::<f64>() / self.period as f64;
            let avg_loss = losses[window].iter().sum::<f64>() / self.period as f64;
            result[i] = rsi_from_averages(avg_gain, avg_loss);
        }

        result
    }
}

/// RSI from average gain and loss. NaN when both are zero or either is NaN.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        f64::NAN
    } else if avg_loss == 0.0 && avg_gain > 0.0 {
        100.0
    } else if avg_loss == 0.0 {
        f64::NAN
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
