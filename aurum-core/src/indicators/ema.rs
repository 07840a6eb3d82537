//! Exponentially weighted moving average (EWMA) by span, and the trend flag.
//!
//! alpha = 2 / (span + 1). Uses the bias-adjusted form: every value is the
//! weighted mean of all closes so far with weights (1 - alpha)^k, so the
//! series has no warmup.
//! Lookback: 0.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Ewma {
    span: usize,
    name: String,
}

impl Ewma {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EWMA span must be >= 1");
        Self {
            span,
            name: format!("ewma_{span}"),
        }
    }

    /// +1 when the latest close is above the latest EWMA, -1 otherwise
    /// (including an empty series).
    pub fn trend_flag(&self, bars: &[Bar]) -> i8 {
        match bars.last() {
            Some(bar) if bar.close > self.latest(bars) => 1,
            _ => -1,
        }
    }
}

impl Indicator for Ewma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ewma_of_series(&closes, self.span)
    }
}

/// Adjusted EWMA of an arbitrary series. NaN taints every later value.
pub fn ewma_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if span == 0 {
        return result;
    }

    let decay = 1.0 - 2.0 / (span as f64 + 1.0);
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            return result;
        }
        numerator = v + decay * numerator;
        denominator = 1.0 + decay * denominator;
        result[i] = numerator / denominator;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ewma_span_1_equals_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Ewma::new(1).compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ewma_span_3_known_values() {
        // alpha = 0.5, decay = 0.5
        // y0 = 10
        // y1 = (11 + 0.5*10) / 1.5 = 10.6667
        // y2 = (12 + 0.5*11 + 0.25*10) / 1.75 = 20/1.75 = 11.4286
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let result = Ewma::new(3).compute(&bars);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 16.0 / 1.5, DEFAULT_EPSILON);
        assert_approx(result[2], 20.0 / 1.75, DEFAULT_EPSILON);
    }

    #[test]
    fn ewma_nan_propagates() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        bars[2].close = f64::NAN;
        let result = Ewma::new(3).compute(&bars);
        assert!(!result[1].is_nan());
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
    }

    #[test]
    fn trend_flag_up_and_down() {
        let rising = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        assert_eq!(Ewma::new(20).trend_flag(&rising), 1);

        let falling = make_bars(&[14.0, 13.0, 12.0, 11.0, 10.0]);
        assert_eq!(Ewma::new(20).trend_flag(&falling), -1);
    }

    #[test]
    fn trend_flag_empty_is_down() {
        assert_eq!(Ewma::new(20).trend_flag(&[]), -1);
        let single = make_bars(&[10.0]);
        assert_eq!(Ewma::new(20).trend_flag(&single), -1);
    }
}
