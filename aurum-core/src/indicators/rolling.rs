//! Trailing-window extremes and the volume spike flag.

use crate::domain::Bar;
use crate::indicators::stats::mean;

/// Highest high over the trailing `window` bars ending at the latest bar.
///
/// A series shorter than the window uses every available bar. NaN for an
/// empty series.
pub fn rolling_max(bars: &[Bar], window: usize) -> f64 {
    let start = bars.len().saturating_sub(window);
    bars[start..]
        .iter()
        .map(|b| b.high)
        .fold(f64::NAN, f64::max)
}

/// Lowest low over the trailing `window` bars ending at the latest bar.
pub fn rolling_min(bars: &[Bar], window: usize) -> f64 {
    let start = bars.len().saturating_sub(window);
    bars[start..]
        .iter()
        .map(|b| b.low)
        .fold(f64::NAN, f64::min)
}

/// Latest volume strictly above `multiplier` times the mean volume of the
/// trailing `window` bars (latest bar included). False when fewer than
/// `window` bars exist.
pub fn volume_spike(bars: &[Bar], window: usize, multiplier: f64) -> bool {
    if window == 0 || bars.len() < window {
        return false;
    }
    let volumes: Vec<f64> = bars[bars.len() - window..].iter().map(|b| b.volume).collect();
    match bars.last() {
        Some(last) => last.volume > multiplier * mean(&volumes),
        None => false,
    }
}
