//! Indicator snapshot at the latest bar of one series.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::IndicatorConfig;
use crate::domain::Series;
use crate::indicators::{rolling_max, rolling_min, volume_spike, Atr, Ewma, Indicator, Rsi, Sma};

/// Direction of close relative to its EWMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// +1 → Up; anything else → Down.
    pub fn from_flag(flag: i8) -> Self {
        if flag > 0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }

    pub fn flag(&self) -> i8 {
        match self {
            Trend::Up => 1,
            Trend::Down => -1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scalar indicator values at the latest bar of a series.
///
/// Indicators whose window exceeds the series length are NaN; the snapshot
/// itself never fails on a short series. Recomputed every run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub bars: usize,
    pub price: f64,
    pub rsi: f64,
    pub sma: f64,
    /// (close - SMA) / SMA * 100.
    pub deviation: f64,
    pub atr: f64,
    pub atr_expanding: bool,
    pub vol_spike: bool,
    pub trend: Trend,
    /// Rolling high over `range_window` bars.
    pub resistance: f64,
    /// Rolling low over `range_window` bars.
    pub support: f64,
}

impl IndicatorSnapshot {
    /// Compute every indicator on `series`. `None` only for an empty series.
    pub fn compute(series: &Series, config: &IndicatorConfig) -> Option<Self> {
        let bars = series.bars();
        let last = bars.last()?;

        let sma = Sma::new(config.sma_period);
        let sma_value = sma.latest(bars);
        let atr = Atr::with_mode(config.atr_period, config.atr_mode);
        let ewma = Ewma::new(config.trend_span);

        let snapshot = Self {
            bars: bars.len(),
            price: last.close,
            rsi: Rsi::new(config.rsi_period).latest(bars),
            sma: sma_value,
            deviation: (last.close - sma_value) / sma_value * 100.0,
            atr: atr.latest(bars),
            atr_expanding: atr.is_expanding(bars),
            vol_spike: volume_spike(bars, config.volume_window, config.volume_spike_multiplier),
            trend: Trend::from_flag(ewma.trend_flag(bars)),
            resistance: rolling_max(bars, config.range_window),
            support: rolling_min(bars, config.range_window),
        };

        debug!(
            symbol = series.symbol(),
            timeframe = %series.timeframe(),
            bars = snapshot.bars,
            rsi = snapshot.rsi,
            deviation = snapshot.deviation,
            atr = snapshot.atr,
            trend = %snapshot.trend,
            "indicator snapshot"
        );

        Some(snapshot)
    }
}
