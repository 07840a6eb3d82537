//! Indicator implementations over a single bar series.
//!
//! Every indicator is a pure function: bar history in, numeric series of the
//! same length out. Warmup positions hold `f64::NAN`; NaN is how "not enough
//! bars" is expressed all the way up to the scoring engine, which refuses it.

pub mod atr;
pub mod ema;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod stats;

pub use atr::{true_range, Atr};
pub use ema::Ewma;
pub use rolling::{rolling_max, rolling_min, volume_spike};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Bar;

/// Trait for indicators.
///
/// The first `lookback()` values of `compute` are `f64::NAN`. No value at bar
/// t may depend on data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;

    /// Value at the latest bar, NaN when the series is too short.
    fn latest(&self, bars: &[Bar]) -> f64 {
        self.compute(bars).last().copied().unwrap_or(f64::NAN)
    }
}

/// Create synthetic hourly bars from close prices for testing.
///
/// open = prev_close (or close for first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
